//! Failure classification and the terminal error pipeline.
//!
//! Handlers and the gate return [`ApiError`]. Its response carries a
//! [`Failure`] extension which [`render_failures`], the outermost layer, turns
//! into the client-facing error view and the server-side log line, according
//! to the [`Deployment`].

use crate::config::Deployment;
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use kilroy_core::prelude::*;
use serde_json::json;
use tracing::{error, warn};

pub struct ApiError {
    status: Option<StatusCode>,
    source: anyhow::Error,
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: None,
            source: err.into(),
        }
    }
}

impl ApiError {
    /// A failure with an explicit status, which wins over classification.
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            source: anyhow::Error::msg(message.into()),
        }
    }

    pub fn not_found() -> Self {
        Self::with_status(StatusCode::NOT_FOUND, "Not Found")
    }

    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or_else(|| classify(&self.source))
    }
}

fn classify(err: &anyhow::Error) -> StatusCode {
    if let Some(storage_err) = err.downcast_ref::<StorageError>() {
        return match storage_err {
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            StorageError::InvalidIdentifier(_) | StorageError::Traversal(_) => {
                StatusCode::BAD_REQUEST
            }
            StorageError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
    }
    if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
        if io_err.kind() == std::io::ErrorKind::NotFound {
            return StatusCode::NOT_FOUND;
        }
    }
    StatusCode::INTERNAL_SERVER_ERROR
}

/// What went wrong with a request, as seen by the error pipeline.
#[derive(Clone, Debug)]
pub struct Failure {
    pub status: StatusCode,
    pub message: String,
    pub detail: String,
}

impl Failure {
    /// For error responses produced outside our handlers, such as axum's
    /// extractor rejections.
    fn from_status(status: StatusCode) -> Self {
        let message = status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
        Self {
            status,
            detail: message.clone(),
            message,
        }
    }

    /// Routine outcomes that need no server-side detail.
    fn is_benign(&self) -> bool {
        matches!(
            self.status,
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND
        )
    }

    fn view(&self, deployment: Deployment) -> serde_json::Value {
        match deployment {
            Deployment::Development => json!({
                "message": self.message,
                "error": { "status": self.status.as_u16(), "detail": self.detail },
            }),
            Deployment::Production => {
                let message = if self.status.is_server_error() {
                    self.status
                        .canonical_reason()
                        .unwrap_or("Internal Server Error")
                } else {
                    self.message.as_str()
                };
                json!({ "message": message, "error": {} })
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let failure = Failure {
            status: self.status(),
            message: self.source.to_string(),
            detail: format!("{:?}", self.source),
        };
        // Safe to show even without the pipeline in front.
        let mut response = (failure.status, Json(failure.view(Deployment::Production))).into_response();
        response.extensions_mut().insert(failure);
        response
    }
}

/// "No route matched".
pub async fn not_found() -> ApiError {
    ApiError::not_found()
}

/// Terminal middleware: logs every failed request and renders its error view.
pub async fn render_failures(
    State(deployment): State<Deployment>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let mut response = next.run(request).await;
    let status = response.status();
    let failure = match response.extensions_mut().remove::<Failure>() {
        Some(failure) => failure,
        None if status.is_client_error() || status.is_server_error() => {
            Failure::from_status(status)
        }
        None => return response,
    };

    log_failure(deployment, &failure, &method, &path);

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    let body = Json(failure.view(deployment)).into_response().into_body();
    Response::from_parts(parts, body)
}

fn log_failure(deployment: Deployment, failure: &Failure, method: &Method, path: &str) {
    match deployment {
        Deployment::Development if !failure.is_benign() => {
            error!(
                status = failure.status.as_u16(),
                %method,
                path,
                "{}",
                failure.detail
            );
        }
        Deployment::Development => {}
        Deployment::Production => {
            warn!(
                "{} {} {} {}",
                failure.status.as_u16(),
                method,
                path,
                failure.message
            );
        }
    }
}
