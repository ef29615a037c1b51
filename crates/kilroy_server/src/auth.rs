//! The authorization gate in front of every protected route.
//!
//! A request is either resumed from its session cookie, or challenged for
//! per-request credentials. The gate produces exactly one
//! [`AuthorizationOutcome`] per request, and for an authenticated identity it
//! always audits first, then binds a new session (fresh logins only), then
//! lets the request proceed.

use crate::error::ApiError;
use crate::session::SESSION_COOKIE;
use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    extract::cookie::{Cookie, CookieJar, SameSite},
    headers::{Authorization, authorization::Basic},
    typed_header::TypedHeaderRejection,
};
use kilroy_core::prelude::*;
use std::sync::Arc;
use tracing::{Span, debug, info};

/// Result of authorizing one request.
#[derive(Debug)]
pub enum AuthorizationOutcome {
    Authenticated {
        identity: Identity,
        /// True when the identity came from an existing session.
        resumed: bool,
        /// Token of the session created for a fresh login.
        issued_session: Option<String>,
    },
    Rejected {
        reason: String,
    },
    Failed(AuthError),
}

impl AuthorizationOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthorizationOutcome::Authenticated { .. } => StatusCode::OK,
            AuthorizationOutcome::Rejected { .. } => StatusCode::UNAUTHORIZED,
            AuthorizationOutcome::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Clone)]
pub struct AuthorizationGate<A, T> {
    strategy: A,
    sessions: T,
    audit: Arc<dyn AuditHook>,
}

impl<A: CredentialStrategy, T: SessionStore> AuthorizationGate<A, T> {
    pub fn new(strategy: A, sessions: T, audit: Arc<dyn AuditHook>) -> Self {
        Self {
            strategy,
            sessions,
            audit,
        }
    }

    /// Decides who is making a request from its session token and the
    /// credentials it carries.
    pub async fn authorize(
        &self,
        session_token: Option<&str>,
        credentials: Option<Credentials>,
    ) -> AuthorizationOutcome {
        if let Some(token) = session_token {
            match self.sessions.load(token).await {
                Ok(Some(identity)) => return self.admit(identity, true).await,
                Ok(None) => debug!("session token not recognised, challenging"),
                Err(e) => return AuthorizationOutcome::Failed(e),
            }
        }

        match self.strategy.verify(credentials).await {
            Err(e) => AuthorizationOutcome::Failed(e),
            Ok(Verification {
                identity: Some(identity),
                ..
            }) => self.admit(identity, false).await,
            Ok(Verification {
                identity: None,
                info,
            }) => {
                debug!(strategy = self.strategy.name(), "credentials rejected");
                AuthorizationOutcome::Rejected {
                    reason: info.rejection_message(),
                }
            }
        }
    }

    async fn admit(&self, identity: Identity, resumed: bool) -> AuthorizationOutcome {
        // Audit before binding, so a failed bind is still on record.
        self.audit.record(AuditEvent::Acting(&identity));
        if resumed {
            return AuthorizationOutcome::Authenticated {
                identity,
                resumed: true,
                issued_session: None,
            };
        }

        self.audit.record(AuditEvent::Login(&identity));
        match self.sessions.bind(&identity).await {
            Ok(token) => AuthorizationOutcome::Authenticated {
                identity,
                resumed: false,
                issued_session: Some(token),
            },
            Err(e) => AuthorizationOutcome::Failed(e),
        }
    }
}

/// Axum middleware running the [`AuthorizationGate`].
///
/// On success the identity is available to handlers as [`CurrentUser`], and a
/// fresh login gets its session cookie on the response. An `Authorization`
/// header that is not decodable basic credentials counts as no credentials.
pub async fn authorize<S, A, T>(
    State(state): State<AppState<S, A, T>>,
    jar: CookieJar,
    basic: Result<TypedHeader<Authorization<Basic>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    S: StorageBackend,
    A: CredentialStrategy,
    T: SessionStore,
{
    let session_token = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned());
    let credentials = basic.ok().map(|TypedHeader(header)| Credentials {
        username: header.username().to_owned(),
        password: header.password().to_owned(),
    });

    let outcome = state
        .gate
        .authorize(session_token.as_deref(), credentials)
        .await;
    let status = outcome.status();

    match outcome {
        AuthorizationOutcome::Authenticated {
            identity,
            issued_session,
            ..
        } => {
            request.extensions_mut().insert(CurrentUser(identity));
            let response = next.run(request).await;
            Ok(match issued_session {
                Some(token) => (jar.add(session_cookie(token)), response).into_response(),
                None => response,
            })
        }
        AuthorizationOutcome::Rejected { reason } => Err(ApiError::with_status(status, reason)),
        AuthorizationOutcome::Failed(e) => Err(ApiError::from(e)),
    }
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// The identity a protected request is served for.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::with_status(StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

/// Audits into the request's trace span and the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAudit;

impl AuditHook for TracingAudit {
    fn record(&self, event: AuditEvent<'_>) {
        match event {
            AuditEvent::Acting(identity) => {
                Span::current().record("user", identity.idtag());
                debug!(user = identity.idtag(), "acting");
            }
            AuditEvent::Login(identity) => {
                info!(
                    user = identity.idtag(),
                    username = identity.username(),
                    "login"
                );
            }
        }
    }
}
