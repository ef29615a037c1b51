use axum::http::{StatusCode, header};

use super::test_utils::*;

#[tokio::test]
async fn write_without_credentials_is_rejected() {
    let server = TestServer::new();

    let response = server
        .send(put("/thing/42.json", None, r#"{"a":1}"#))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());

    let json = body_json(response).await;
    assert_eq!(json["message"], "Unauthorized: Basic realm=\"Users\"");
    assert_eq!(server.storage.calls(), 0);
    assert!(!server.dir.path().join("immutable/thing/42.json").exists());
}

#[tokio::test]
async fn authorized_write_is_publicly_readable() {
    let server = TestServer::new();

    let response = server
        .send(put("/thing/42.json", Some(&kilroy_auth()), r#"{"a":1}"#))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let stored = std::fs::read(server.dir.path().join("immutable/thing/42.json")).unwrap();
    assert_eq!(stored, br#"{"a":1}"#);

    let response = server.send(get("/thing/42.json")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        cache_control(&response).as_deref(),
        Some("public, max-age=31536000")
    );
    assert_eq!(body_bytes(response).await.as_ref(), br#"{"a":1}"#);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let server = TestServer::new();

    let response = server
        .send(put(
            "/place/7.json",
            Some(&basic("JS Kilroy", "guess")),
            r#"{"a":1}"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());

    let json = body_json(response).await;
    assert_eq!(json["message"], "Unauthorized: Basic realm=\"Users\"");
    assert_eq!(server.storage.calls(), 0);
}

#[tokio::test]
async fn unknown_user_is_rejected() {
    let server = TestServer::new();

    let response = server
        .send(put(
            "/place/7.json",
            Some(&basic("Someone Else", TEST_PASSWORD)),
            r#"{"a":1}"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_binds_a_session_that_later_requests_resume() {
    let server = TestServer::new();

    let response = server
        .send(put("/place/7.json", Some(&kilroy_auth()), r#"{"v":1}"#))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Path=/"));
    let cookie = session_cookie(&response).unwrap();

    // The cookie alone is enough, and no new session is issued.
    let mut request = put("/place/7.json", None, r#"{"v":2}"#);
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = server.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).is_none());

    let stored = std::fs::read(server.dir.path().join("mutable/place/7.json")).unwrap();
    assert_eq!(stored, br#"{"v":2}"#);
}

#[tokio::test]
async fn forged_session_is_challenged() {
    let server = TestServer::new();

    let mut request = put("/place/7.json", None, r#"{"v":1}"#);
    request.headers_mut().insert(
        header::COOKIE,
        "kilroy.sid=eyJhbGciOiJIUzI1NiJ9.e30.forged".parse().unwrap(),
    );
    let response = server.send(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(server.storage.calls(), 0);
}

#[tokio::test]
async fn forged_session_with_good_credentials_logs_in_again() {
    let server = TestServer::new();

    let mut request = put("/place/7.json", Some(&kilroy_auth()), r#"{"v":1}"#);
    request
        .headers_mut()
        .insert(header::COOKIE, "kilroy.sid=garbage".parse().unwrap());
    let response = server.send(request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(session_cookie(&response).is_some());
}

#[tokio::test]
async fn session_from_another_server_is_not_accepted() {
    let first = TestServer::new();
    let response = first
        .send(put("/place/7.json", Some(&kilroy_auth()), r#"{"v":1}"#))
        .await;
    let cookie = session_cookie(&response).unwrap();

    let other = {
        use kilroy::prelude::*;
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::new(SecretStore::new("another-signer", TEST_PASSWORD));
        let router = KilroyServer::new(config).build(
            FileSystemStorage::new(dir.path()),
            TestUserStrategy::new(TEST_PASSWORD),
        );
        (router, dir)
    };

    let mut request = put("/place/7.json", None, r#"{"v":2}"#);
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = {
        use tower::ServiceExt;
        other.0.oneshot(request).await.unwrap()
    };
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn media_reads_require_authorization() {
    let server = TestServer::new();

    let response = server
        .send(put("/media/clip.mp4", Some(&kilroy_auth()), "not really a video"))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = server.send(get("/media/clip.mp4")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut request = get("/media/clip.mp4");
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, kilroy_auth().parse().unwrap());
    let response = server.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        cache_control(&response).as_deref(),
        Some("public, max-age=31536000")
    );
    assert_eq!(body_bytes(response).await.as_ref(), b"not really a video");
}

#[tokio::test]
async fn deletes_require_authorization() {
    let server = TestServer::new();

    let response = server.send(delete("/thing/42.json", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server.send(delete("/anything/42.json", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(server.storage.calls(), 0);
}

#[tokio::test]
async fn undecodable_authorization_is_challenged() {
    let server = TestServer::new();

    for value in ["Bearer abc", "Basic !!!notbase64", "Basic"] {
        let mut request = put("/place/7.json", None, r#"{"v":1}"#);
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, value.parse().unwrap());
        let response = server.send(request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value}");

        let json = body_json(response).await;
        assert_eq!(json["message"], "Unauthorized: Basic realm=\"Users\"");
    }
    assert_eq!(server.storage.calls(), 0);
}

#[tokio::test]
async fn session_resumes_despite_a_foreign_authorization_header() {
    let server = TestServer::new();

    let response = server
        .send(put("/place/7.json", Some(&kilroy_auth()), r#"{"v":1}"#))
        .await;
    let cookie = session_cookie(&response).unwrap();

    let mut request = put("/place/7.json", Some("Bearer abc"), r#"{"v":2}"#);
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = server.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).is_none());

    let stored = std::fs::read(server.dir.path().join("mutable/place/7.json")).unwrap();
    assert_eq!(stored, br#"{"v":2}"#);
}
