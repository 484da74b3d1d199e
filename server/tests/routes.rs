//! Router-level checks that never reach the database: authentication
//! rejections, request validation, static media and the API docs.

use std::net::SocketAddr;
use std::path::Path;

use foodgram_server::{build_router, db, AppState, Settings};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

async fn spawn_server(media_root: &Path) -> SocketAddr {
    let settings = Settings {
        media_root: media_root.to_path_buf(),
        ..Settings::default()
    };
    let pool = db::lazy_pool("postgres://foodgram@127.0.0.1:1/unreachable");
    let app = build_router(AppState::new(pool, settings));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\nContent-Length: {}\r\n",
        body.len()
    );
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    req.push_str("\r\n");
    req.push_str(body);
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("read response");
    let response = String::from_utf8_lossy(&response).into_owned();
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head.to_ascii_lowercase(), body.to_string())
}

#[tokio::test]
async fn protected_endpoints_require_credentials() {
    let media = tempfile::tempdir().expect("tempdir");
    let addr = spawn_server(media.path()).await;

    for (method, path) in [
        ("GET", "/api/users/me/"),
        ("GET", "/api/users/subscriptions/"),
        ("POST", "/api/users/set_password/"),
        ("PUT", "/api/users/me/avatar/"),
        ("POST", "/api/users/1/subscribe/"),
        ("POST", "/api/recipes/"),
        ("PATCH", "/api/recipes/1/"),
        ("DELETE", "/api/recipes/1/"),
        ("POST", "/api/recipes/1/favorite/"),
        ("DELETE", "/api/recipes/1/shopping_cart/"),
        ("GET", "/api/recipes/download_shopping_cart/"),
        ("POST", "/api/auth/token/logout/"),
    ] {
        let (status, _, body) = send_raw(addr, method, path, &[], "").await;
        assert_eq!(status, 401, "{method} {path}");
        assert!(
            body.contains("Authentication credentials were not provided."),
            "{method} {path}: {body}"
        );
    }
}

#[tokio::test]
async fn unsupported_auth_scheme_is_rejected() {
    let media = tempfile::tempdir().expect("tempdir");
    let addr = spawn_server(media.path()).await;

    let (status, _, body) = send_raw(
        addr,
        "GET",
        "/api/users/me/",
        &[("Authorization", "Basic Zm9vOmJhcg==")],
        "",
    )
    .await;
    assert_eq!(status, 401);
    assert!(body.contains("\"detail\""));

    // Also on endpoints that allow anonymous access
    let (status, _, _) = send_raw(
        addr,
        "GET",
        "/api/recipes/",
        &[("Authorization", "Basic Zm9vOmJhcg==")],
        "",
    )
    .await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn non_numeric_ids_are_not_found() {
    let media = tempfile::tempdir().expect("tempdir");
    let addr = spawn_server(media.path()).await;

    for path in ["/api/recipes/abc/", "/api/users/abc/", "/api/ingredients/abc/"] {
        let (status, _, body) = send_raw(addr, "GET", path, &[], "").await;
        assert_eq!(status, 404, "{path}");
        assert!(body.contains("Not found."), "{path}: {body}");
    }
}

#[tokio::test]
async fn registration_reports_every_missing_field() {
    let media = tempfile::tempdir().expect("tempdir");
    let addr = spawn_server(media.path()).await;

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/api/users/",
        &[("Content-Type", "application/json")],
        "{}",
    )
    .await;
    assert_eq!(status, 400);
    let errors: serde_json::Value = serde_json::from_str(&body).expect("json body");
    for field in ["email", "username", "first_name", "last_name", "password"] {
        assert_eq!(
            errors[field][0], "This field is required.",
            "{field}: {body}"
        );
    }
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let media = tempfile::tempdir().expect("tempdir");
    let addr = spawn_server(media.path()).await;

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/api/users/",
        &[("Content-Type", "application/json")],
        "{not json",
    )
    .await;
    assert_eq!(status, 400);
    assert!(body.contains("non_field_errors"), "{body}");
}

#[tokio::test]
async fn wrong_types_are_reported_on_their_field() {
    let media = tempfile::tempdir().expect("tempdir");
    let addr = spawn_server(media.path()).await;

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/api/users/",
        &[("Content-Type", "application/json")],
        r#"{"email": ["cook@example.com"], "username": "cook"}"#,
    )
    .await;
    assert_eq!(status, 400);
    let errors: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(errors["email"][0], "Not a valid string.", "{body}");
    assert!(errors.get("non_field_errors").is_none(), "{body}");
    assert!(!body.contains("invalid type"), "{body}");
}

#[tokio::test]
async fn login_reports_missing_fields() {
    let media = tempfile::tempdir().expect("tempdir");
    let addr = spawn_server(media.path()).await;

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/api/auth/token/login/",
        &[("Content-Type", "application/json")],
        r#"{"email": "cook@example.com"}"#,
    )
    .await;
    assert_eq!(status, 400);
    let errors: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(errors["password"][0], "This field is required.", "{body}");
    assert!(errors.get("email").is_none(), "{body}");
}

#[tokio::test]
async fn media_files_are_served() {
    let media = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(media.path().join("recipes")).expect("mkdir");
    std::fs::write(media.path().join("recipes/cake.txt"), b"sponge").expect("write");
    let addr = spawn_server(media.path()).await;

    let (status, _, body) = send_raw(addr, "GET", "/media/recipes/cake.txt", &[], "").await;
    assert_eq!(status, 200);
    assert_eq!(body, "sponge");

    let (status, _, _) = send_raw(addr, "GET", "/media/recipes/missing.txt", &[], "").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn openapi_document_lists_the_api() {
    let media = tempfile::tempdir().expect("tempdir");
    let addr = spawn_server(media.path()).await;

    let (status, head, body) = send_raw(addr, "GET", "/api-docs/openapi.json", &[], "").await;
    assert_eq!(status, 200);
    assert!(head.contains("application/json"));

    let doc: serde_json::Value = serde_json::from_str(&body).expect("json body");
    let paths = doc["paths"].as_object().expect("paths");
    for path in [
        "/api/auth/token/login/",
        "/api/users/",
        "/api/users/{id}/subscribe/",
        "/api/ingredients/",
        "/api/recipes/",
        "/api/recipes/{id}/get-link/",
        "/api/recipes/download_shopping_cart/",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }
    assert!(doc["components"]["securitySchemes"]["token_auth"].is_object());
}
