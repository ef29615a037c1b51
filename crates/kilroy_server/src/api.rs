//! The resource router: URL paths that behave like files.
//!
//! `GET /thing/123.json` streams `<dbdir>/immutable/thing/123.json`, `PUT`
//! replaces it and `DELETE` removes it. The extension is an explicit part of
//! the URL so that `Content-Type` needs no special machinery and the storage
//! could be swapped for any plain blob store.

use crate::auth::CurrentUser;
use crate::error::ApiError;
use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use kilroy_core::prelude::*;
use tracing::{debug, info};

/// GET /{collection}/{id}.{ext}
pub async fn read_resource<S: StorageBackend>(
    storage: &S,
    collection: Collection,
    file: &str,
) -> Result<Response, ApiError> {
    let resource = Resource::parse(collection, file)?;
    let body = storage.open(&resource).await?;
    let mime = mime_guess::from_ext(resource.extension()).first_or_octet_stream();

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_LENGTH, body.len.to_string()),
            (header::CACHE_CONTROL, resource.mutability().cache_control()),
        ],
        Body::from_stream(body.stream),
    )
        .into_response())
}

/// PUT /{collection}/{id}.{ext}, and the JSON POST routes.
///
/// Answers `201 Created` for a new resource and `200 OK` otherwise.
pub async fn write_resource<S: StorageBackend>(
    storage: &S,
    CurrentUser(user): CurrentUser,
    collection: Collection,
    file: &str,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let resource = upload_target(collection, file)?;

    if resource.extension() == "json" {
        if let Err(e) = serde_json::from_slice::<serde_json::Value>(&body) {
            return Err(ApiError::with_status(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {e}"),
            ));
        }
    }

    let size = body.len();
    let created = storage.write(&resource, body).await?;
    info!(user = user.idtag(), %resource, size, created, "stored");

    Ok(if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    })
}

/// DELETE /{collection}/{id}.{ext}
///
/// Deleting a resource that does not exist still succeeds.
pub async fn delete_resource<S: StorageBackend>(
    storage: &S,
    CurrentUser(user): CurrentUser,
    collection: Collection,
    file: &str,
) -> Result<StatusCode, ApiError> {
    let resource = Resource::parse(collection, file)?;
    let removed = storage.delete(&resource).await?;
    if removed {
        info!(user = user.idtag(), %resource, "deleted");
    } else {
        debug!(user = user.idtag(), %resource, "delete of missing resource");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE on a collection given by name.
pub async fn delete_named<S: StorageBackend>(
    storage: &S,
    user: CurrentUser,
    collection: &str,
    file: &str,
) -> Result<StatusCode, ApiError> {
    let collection: Collection = collection.parse()?;
    delete_resource(storage, user, collection, file).await
}

/// Uploads must use the extension their route names; anything else is not a
/// route at all.
fn upload_target(collection: Collection, file: &str) -> Result<Resource, ApiError> {
    let resource = Resource::parse(collection, file)?;
    match collection.upload_extension() {
        Some(ext) if ext != resource.extension() => Err(ApiError::not_found()),
        _ => Ok(resource),
    }
}
