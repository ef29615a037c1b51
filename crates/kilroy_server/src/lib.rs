//! # Kilroy Server
//!
//! Serves scenes, objects, thumbnails and media as plain URL paths backed by
//! a [`StorageBackend`], with every write guarded by the
//! [`AuthorizationGate`](auth::AuthorizationGate).
//!
//! ```text
//! GET    /thing/{id}.{ext}, /thumb/{id}.{ext}   public, cached for a year
//! GET    /place/{id}.{ext}                      public, revalidated
//! GET    /media/{id}.{ext}                      authorized, cached for a year
//! PUT    /place/{id}.json, /thing/{id}.json,
//!        /thumb/{id}.png, /media/{id}.{ext}     authorized
//! POST   /fbusr/{id}.json, /pRefs/{id}.json     authorized
//! DELETE /{collection}/{id}.{ext}               authorized
//! ```

use axum::{
    Router,
    extract::{DefaultBodyLimit, Path, State},
    http::Request as HttpRequest,
    middleware,
    routing::{MethodRouter, delete, get, post, put},
};
use bytes::Bytes;
use kilroy_core::prelude::*;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info_span;

mod api;

pub mod auth;
pub mod config;
pub mod error;
pub mod secrets;
pub mod session;
pub mod state;

use crate::auth::{AuthorizationGate, CurrentUser, TracingAudit};
use crate::config::ServerConfig;
use crate::session::CookieSessionStore;
use state::AppState;

/// The builder for the Kilroy Server.
pub struct KilroyServer {
    config: ServerConfig,
    audit: Arc<dyn AuditHook>,
}

impl KilroyServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            audit: Arc::new(TracingAudit),
        }
    }

    /// Replaces the default audit hook, which logs through `tracing`.
    pub fn with_audit(mut self, audit: impl AuditHook) -> Self {
        self.audit = Arc::new(audit);
        self
    }

    /// Builds the router with cookie sessions signed by the configured secret.
    pub fn build<S: StorageBackend, A: CredentialStrategy>(self, storage: S, strategy: A) -> Router {
        let sessions = CookieSessionStore::new(
            self.config.secrets.cookie_signer(),
            self.config.session_ttl,
        );
        self.build_with_sessions(storage, strategy, sessions)
    }

    pub fn build_with_sessions<S, A, T>(self, storage: S, strategy: A, sessions: T) -> Router
    where
        S: StorageBackend,
        A: CredentialStrategy,
        T: SessionStore,
    {
        let KilroyServer { config, audit } = self;
        let state = AppState {
            storage,
            gate: AuthorizationGate::new(strategy, sessions, audit),
        };

        let public = Router::new()
            .route("/thing/{file}", read(Collection::Thing))
            .route("/thumb/{file}", read(Collection::Thumb))
            .route("/place/{file}", read(Collection::Place));

        let protected = Router::new()
            .route(
                "/media/{file}",
                read(Collection::Media)
                    .merge(write(Collection::Media))
                    .merge(remove(Collection::Media)),
            )
            .route(
                "/place/{file}",
                write(Collection::Place).merge(remove(Collection::Place)),
            )
            .route(
                "/thing/{file}",
                write(Collection::Thing).merge(remove(Collection::Thing)),
            )
            .route(
                "/thumb/{file}",
                write(Collection::Thumb).merge(remove(Collection::Thumb)),
            )
            .route(
                "/fbusr/{file}",
                upload(Collection::Person).merge(remove(Collection::Person)),
            )
            .route(
                "/pRefs/{file}",
                upload(Collection::Refs).merge(remove(Collection::Refs)),
            )
            .route("/{collection}/{file}", delete(remove_named))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::authorize::<S, A, T>,
            ));

        Router::new()
            .route("/health", get(|| async { "OK" }))
            .merge(public)
            .merge(protected)
            .fallback(error::not_found)
            .method_not_allowed_fallback(error::not_found)
            .layer(DefaultBodyLimit::disable())
            .layer(middleware::from_fn_with_state(
                config.deployment,
                error::render_failures,
            ))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &HttpRequest<_>| {
                    info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        user = tracing::field::Empty,
                    )
                }),
            )
            .with_state(state)
    }
}

fn read<S, A, T>(collection: Collection) -> MethodRouter<AppState<S, A, T>>
where
    S: StorageBackend,
    A: CredentialStrategy,
    T: SessionStore,
{
    get(
        move |State(state): State<AppState<S, A, T>>, Path(file): Path<String>| async move {
            api::read_resource(&state.storage, collection, &file).await
        },
    )
}

fn write<S, A, T>(collection: Collection) -> MethodRouter<AppState<S, A, T>>
where
    S: StorageBackend,
    A: CredentialStrategy,
    T: SessionStore,
{
    put(
        move |State(state): State<AppState<S, A, T>>,
              user: CurrentUser,
              Path(file): Path<String>,
              body: Bytes| async move {
            api::write_resource(&state.storage, user, collection, &file, body).await
        },
    )
}

/// No corresponding GET, hence POST rather than PUT.
fn upload<S, A, T>(collection: Collection) -> MethodRouter<AppState<S, A, T>>
where
    S: StorageBackend,
    A: CredentialStrategy,
    T: SessionStore,
{
    post(
        move |State(state): State<AppState<S, A, T>>,
              user: CurrentUser,
              Path(file): Path<String>,
              body: Bytes| async move {
            api::write_resource(&state.storage, user, collection, &file, body).await
        },
    )
}

fn remove<S, A, T>(collection: Collection) -> MethodRouter<AppState<S, A, T>>
where
    S: StorageBackend,
    A: CredentialStrategy,
    T: SessionStore,
{
    delete(
        move |State(state): State<AppState<S, A, T>>,
              user: CurrentUser,
              Path(file): Path<String>| async move {
            api::delete_resource(&state.storage, user, collection, &file).await
        },
    )
}

async fn remove_named<S, A, T>(
    State(state): State<AppState<S, A, T>>,
    user: CurrentUser,
    Path((collection, file)): Path<(String, String)>,
) -> Result<axum::http::StatusCode, error::ApiError>
where
    S: StorageBackend,
    A: CredentialStrategy,
    T: SessionStore,
{
    api::delete_named(&state.storage, user, &collection, &file).await
}

pub mod prelude {
    pub use crate::KilroyServer;
    pub use crate::auth::*;
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::secrets::*;
    pub use crate::session::*;
    pub use crate::state::*;
}
