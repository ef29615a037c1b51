//! Shared helpers for the integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use base64::Engine;
use bytes::Bytes;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use kilroy::prelude::*;

pub const COOKIE_SECRET: &str = "test-cookie-signer";
pub const TEST_PASSWORD: &str = "test-user-auth";

/// A router serving a fresh temporary resource tree.
pub struct TestServer {
    pub router: Router,
    pub dir: TempDir,
    pub storage: CountingStorage,
}

impl TestServer {
    pub fn new() -> Self {
        Self::with_deployment(Deployment::Development)
    }

    pub fn with_deployment(deployment: Deployment) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = CountingStorage::new(FileSystemStorage::new(dir.path()));
        let config = ServerConfig::new(SecretStore::new(COOKIE_SECRET, TEST_PASSWORD))
            .with_deployment(deployment);
        let router = KilroyServer::new(config)
            .build(storage.clone(), TestUserStrategy::new(TEST_PASSWORD));

        Self {
            router,
            dir,
            storage,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Wraps a backend and counts every call that reaches it.
#[derive(Clone)]
pub struct CountingStorage {
    inner: FileSystemStorage,
    calls: Arc<AtomicUsize>,
}

impl CountingStorage {
    pub fn new(inner: FileSystemStorage) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl StorageBackend for CountingStorage {
    async fn open(&self, resource: &Resource) -> Result<ResourceBody, StorageError> {
        self.touch();
        self.inner.open(resource).await
    }

    async fn write(&self, resource: &Resource, data: Bytes) -> Result<bool, StorageError> {
        self.touch();
        self.inner.write(resource, data).await
    }

    async fn delete(&self, resource: &Resource) -> Result<bool, StorageError> {
        self.touch();
        self.inner.delete(resource).await
    }
}

/// `Authorization` header value for HTTP basic credentials.
pub fn basic(username: &str, password: &str) -> String {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}

pub fn kilroy_auth() -> String {
    basic("JS Kilroy", TEST_PASSWORD)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn put(uri: &str, auth: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    with_auth(Request::builder().method("PUT").uri(uri), auth)
        .body(body.into())
        .unwrap()
}

pub fn post(uri: &str, auth: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    with_auth(Request::builder().method("POST").uri(uri), auth)
        .body(body.into())
        .unwrap()
}

pub fn delete(uri: &str, auth: Option<&str>) -> Request<Body> {
    with_auth(Request::builder().method("DELETE").uri(uri), auth)
        .body(Body::empty())
        .unwrap()
}

fn with_auth(builder: axum::http::request::Builder, auth: Option<&str>) -> axum::http::request::Builder {
    match auth {
        Some(value) => builder.header(header::AUTHORIZATION, value),
        None => builder,
    }
}

/// The `name=value` pair of the session cookie set by a response, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&format!("{SESSION_COOKIE}=")))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub fn cache_control(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::CACHE_CONTROL)
        .map(|value| value.to_str().unwrap().to_string())
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
