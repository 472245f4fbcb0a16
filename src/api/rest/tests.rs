use crate::api::rest::{AppState, RestApi};
use crate::config::StorageConfig;
use crate::db::migrations;
use crate::security::auth::AuthService;
use crate::security::testing::{lazy_pool, token_for, FakeIdentity, RecordingMailer};
use crate::services::{ImageKind, ImageStore, QrLabelComposer};
use crate::utils::dates::WallClock;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "XINVENTORYBOUNDARY";

fn state_with(pool: Arc<PgPool>, root: &Path, max_upload_bytes: usize, identity: FakeIdentity) -> AppState {
    let identity = Arc::new(identity);
    let storage = ImageStore::new(&StorageConfig {
        root: root.to_path_buf(),
        max_upload_bytes,
        generate_qr_labels: true,
    });
    let auth_service = AuthService::new(
        Arc::clone(&pool),
        identity.clone(),
        Arc::new(RecordingMailer::default()),
        "Scan Barang",
    );

    AppState {
        db_pool: pool,
        identity,
        auth_service: Arc::new(auth_service),
        storage: Arc::new(storage),
        composer: QrLabelComposer::new(),
        clock: WallClock::new(7),
    }
}

fn offline_app(root: &Path, max_upload_bytes: usize) -> Router {
    let identity = FakeIdentity::default()
        .with_account("uid-ok", "ok@example.com", "secret", true)
        .with_account("uid-late", "late@example.com", "secret", false);
    RestApi::router(state_with(lazy_pool(), root, max_upload_bytes, identity))
}

struct Part<'a> {
    name: &'a str,
    value: &'a [u8],
    file: Option<(&'a str, &'a str)>,
}

fn text<'a>(name: &'a str, value: &'a str) -> Part<'a> {
    Part {
        name,
        value: value.as_bytes(),
        file: None,
    }
}

fn file<'a>(name: &'a str, filename: &'a str, mime: &'a str, value: &'a [u8]) -> Part<'a> {
    Part {
        name,
        value,
        file: Some((filename, mime)),
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.file {
            Some((filename, mime)) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    part.name, filename, mime
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name).as_bytes(),
            ),
        }
        body.extend_from_slice(part.value);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn form_request(method: &str, uri: &str, uid: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {}", token_for(uid)))
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn json_request(method: &str, uri: &str, uid: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(uid) = uid {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token_for(uid)));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, uid: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {}", token_for(uid)))
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

fn item_parts<'a>(quantity: &'a str) -> Vec<Part<'a>> {
    vec![
        text("name", "Kabel HDMI"),
        text("quantity", quantity),
        text("code", "HDMI-01"),
        text("brand", "Ugreen"),
    ]
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let app = offline_app(dir.path(), 1024);

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Inventory scan API is running"));
}

#[tokio::test]
async fn test_missing_and_invalid_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let app = offline_app(dir.path(), 1024);

    let request = Request::builder().uri("/api/barang").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .uri("/api/event/tampil")
        .header(AUTHORIZATION, "Bearer forged")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = json_request("POST", "/api/event/scan", None, json!({ "qr_code": "A1" }));
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_item_requires_image() {
    let dir = tempfile::tempdir().unwrap();
    let app = offline_app(dir.path(), 1024);

    let (status, body) = send(&app, form_request("POST", "/api/barang", "uid-ok", &item_parts("3"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Item image must be uploaded");

    let mut parts = item_parts("3");
    parts.retain(|p| p.name != "brand");
    parts.push(file("image", "a.png", "image/png", b"png-bytes"));
    let (status, body) = send(&app, form_request("POST", "/api/barang", "uid-ok", &parts)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "All fields are required");

    let request = json_request("POST", "/api/barang", Some("uid-ok"), json!({ "name": "Kabel" }));
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Expected multipart form data"));
}

#[tokio::test]
async fn test_upload_validation() {
    let dir = tempfile::tempdir().unwrap();
    let app = offline_app(dir.path(), 16);

    let mut parts = item_parts("3");
    parts.push(file("image", "notes.txt", "text/plain", b"hello"));
    let (status, _) = send(&app, form_request("POST", "/api/barang", "uid-ok", &parts)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut parts = item_parts("3");
    parts.push(file("image", "big.png", "image/png", &[7u8; 64]));
    let (status, body) = send(&app, form_request("POST", "/api/barang", "uid-ok", &parts)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("too large"));

    let mut parts = item_parts("3");
    parts.push(file("attachment", "a.png", "image/png", b"png"));
    let (status, _) = send(&app, form_request("POST", "/api/barang", "uid-ok", &parts)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let staging = dir.path().join("staging");
    let leftovers = std::fs::read_dir(&staging).map(|d| d.count()).unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_event_validation() {
    let dir = tempfile::tempdir().unwrap();
    let app = offline_app(dir.path(), 1024);

    let body = json!({ "nama_event": "Pameran", "tanggal": "2024/03/05", "kota": "Bandung", "kabupaten": "Bandung" });
    let (status, body) = send(&app, json_request("POST", "/api/event/simpan", Some("uid-ok"), body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid date format. Use DD-MM-YYYY");

    let (status, _) = send(&app, json_request("POST", "/api/event/scan", Some("uid-ok"), json!({ "qr_code": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        json_request("PUT", "/api/event/scan-complete", Some("uid-ok"), json!({ "qr_code": "A1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, json_request("PUT", "/api/event/event-selesai", Some("uid-ok"), json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("POST")
        .uri("/api/event/simpan")
        .header(AUTHORIZATION, format!("Bearer {}", token_for("uid-ok")))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_auth_routes() {
    let dir = tempfile::tempdir().unwrap();
    let app = offline_app(dir.path(), 1024);

    let login = |email: &str, password: &str| {
        json_request("POST", "/api/auth/login", None, json!({ "email": email, "password": password }))
    };

    let (status, _) = send(&app, login("nobody@example.com", "secret")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, login("late@example.com", "secret")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, login("ok@example.com", "wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, login("ok@example.com", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let register = json!({ "email": "ok@example.com", "password": "secret", "username": "ok" });
    let (status, body) = send(&app, json_request("POST", "/api/auth/register", None, register)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email is already registered");

    let (status, _) = send(&app, json_request("POST", "/api/auth/logout", None, json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let reset = json!({ "oobCode": "stale-code", "newPassword": "n3w" });
    let (status, body) = send(&app, json_request("POST", "/api/auth/reset-password", None, reset)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to change password");
    assert!(body["details"].is_string());
}

/// Pool for tests that need PostgreSQL; `None` skips them
async fn database() -> Option<Arc<PgPool>> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            println!("Skipping database test. Set TEST_DATABASE_URL to run it.");
            return None;
        }
    };
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .unwrap();
    migrations::run_migrations(&pool).await.unwrap();
    Some(Arc::new(pool))
}

fn owner() -> String {
    format!("owner-{}", uuid::Uuid::new_v4().simple())
}

#[tokio::test]
async fn test_item_lifecycle_with_database() {
    let Some(pool) = database().await else { return };
    let dir = tempfile::tempdir().unwrap();
    let app = RestApi::router(state_with(pool, dir.path(), 1024, FakeIdentity::default()));
    let alice = owner();
    let mallory = owner();

    let mut parts = item_parts("3");
    parts.push(file("image", "a.png", "image/png", b"first-image"));
    let (status, body) = send(&app, form_request("POST", "/api/barang", &alice, &parts)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["itemId"].as_i64().unwrap();
    assert_eq!(body["imageUrl"], format!("/images/{}/{}-image.png", alice, id));
    assert_eq!(body["qrCodeUrl"], format!("/qr_codes/{}/{}-qr.png", alice, id));

    let image_path = dir.path().join("images").join(&alice).join(format!("{}-image.png", id));
    let qr_path = dir.path().join("qr_codes").join(&alice).join(format!("{}-qr.png", id));
    assert!(image_path.exists());
    assert!(qr_path.exists());

    let (status, body) = send(&app, get_request("/api/barang", &alice)).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["code"], "HDMI-01");
    assert_eq!(items[0]["brand"], "Ugreen");
    assert_eq!(items[0]["quantity"], 3);

    let (status, body) = send(&app, get_request("/api/scanner/HDMI-01", &alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);

    // Another owner sees nothing and can touch nothing
    let (_, body) = send(&app, get_request("/api/barang", &mallory)).await;
    assert_eq!(body, json!([]));
    let (status, _) = send(&app, get_request("/api/scanner/HDMI-01", &mallory)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let uri = format!("/api/barang/{}", id);
    let (status, _) = send(&app, form_request("PUT", &uri, &mallory, &item_parts("99"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let request = Request::builder()
        .method("DELETE")
        .uri(&uri)
        .header(AUTHORIZATION, format!("Bearer {}", token_for(&mallory)))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut parts = item_parts("7");
    parts.push(file("image", "b.jpg", "image/jpeg", b"second-image"));
    let (status, _) = send(&app, form_request("PUT", &uri, &alice, &parts)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get_request("/api/barang", &alice)).await;
    assert_eq!(body[0]["quantity"], 7);
    assert_eq!(body[0]["image_url"], format!("{}/{}-image.jpg", alice, id));
    assert!(!image_path.exists());
    let new_image = dir.path().join("images").join(&alice).join(format!("{}-image.jpg", id));
    assert_eq!(std::fs::read(&new_image).unwrap(), b"second-image");

    // A file already gone does not fail the delete
    std::fs::remove_file(&qr_path).unwrap();
    let request = Request::builder()
        .method("DELETE")
        .uri(&uri)
        .header(AUTHORIZATION, format!("Bearer {}", token_for(&alice)))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!new_image.exists());
    assert!(!dir.path().join(ImageKind::Image.dir_name()).join(&alice).exists());

    let (_, body) = send(&app, get_request("/api/barang", &alice)).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_failed_create_leaves_no_files_with_database() {
    let Some(pool) = database().await else { return };
    let dir = tempfile::tempdir().unwrap();
    let app = RestApi::router(state_with(Arc::clone(&pool), dir.path(), 1024, FakeIdentity::default()));
    let alice = owner();

    // A plain file where the owner's label folder belongs makes the label move fail
    std::fs::create_dir_all(dir.path().join("qr_codes")).unwrap();
    std::fs::write(dir.path().join("qr_codes").join(&alice), b"in the way").unwrap();

    let mut parts = item_parts("3");
    parts.push(file("image", "a.png", "image/png", b"first-image"));
    let (status, body) = send(&app, form_request("POST", "/api/barang", &alice, &parts)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to add item");

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE firebase_uid = $1")
        .bind(&alice)
        .fetch_one(&*pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);

    let count = |path: std::path::PathBuf| std::fs::read_dir(path).map(|d| d.count()).unwrap_or(0);
    assert_eq!(count(dir.path().join("images").join(&alice)), 0);
    assert_eq!(count(dir.path().join("staging")), 0);
}

#[tokio::test]
async fn test_event_scan_workflow_with_database() {
    let Some(pool) = database().await else { return };
    let dir = tempfile::tempdir().unwrap();
    let app = RestApi::router(state_with(Arc::clone(&pool), dir.path(), 1024, FakeIdentity::default()));
    let alice = owner();
    let mallory = owner();

    let (status, _) = send(&app, get_request("/api/event/check-qrcode", &alice)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let event = json!({ "nama_event": "Pameran", "tanggal": "05-03-2024", "kota": "Bandung", "kabupaten": "Bandung Barat" });
    let (status, body) = send(&app, json_request("POST", "/api/event/simpan", Some(&alice), event)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id_event = body["eventId"].as_i64().unwrap();

    let edit_uri = format!("/api/event/ambil-edit/{}", id_event);
    let (_, body) = send(&app, get_request(&edit_uri, &alice)).await;
    assert_eq!(body["tanggal"], "2024-03-05");
    let (status, _) = send(&app, get_request(&edit_uri, &mallory)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let update_uri = format!("/api/event/update/{}", id_event);
    let edited = json!({ "nama_event": "Pameran Akbar", "tanggal": "10-04-2024", "kota": "Bandung", "kabupaten": "Bandung Barat" });
    let (status, _) = send(&app, json_request("PUT", &update_uri, Some(&alice), edited)).await;
    assert_eq!(status, StatusCode::OK);
    let hijack = json!({ "nama_event": "Diambil", "tanggal": "01-01-2025", "kota": "X", "kabupaten": "Y" });
    let (status, _) = send(&app, json_request("PUT", &update_uri, Some(&mallory), hijack)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        json_request("PUT", &update_uri, Some(&alice), json!({ "nama_event": "Pameran", "tanggal": "10/04/2024", "kota": "B", "kabupaten": "B" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, get_request(&edit_uri, &alice)).await;
    assert_eq!(body["nama_event"], "Pameran Akbar");
    assert_eq!(body["tanggal"], "2024-04-10");

    for code in ["A1", "A2", "A3"] {
        let (status, body) = send(&app, json_request("POST", "/api/event/scan", Some(&alice), json!({ "qr_code": code }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id_event"], id_event);
    }

    let (status, _) = send(&app, json_request("POST", "/api/event/scan", Some(&alice), json!({ "qr_code": "A2" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM qr_codes WHERE id_event = $1")
        .bind(id_event as i32)
        .fetch_one(&*pool)
        .await
        .unwrap();
    assert_eq!(count, 3);

    let (_, body) = send(&app, get_request("/api/event/check-qrcode", &alice)).await;
    assert_eq!(body["exists"], true);

    let status_uri = format!("/api/event/event-statuscheck/{}/check-status", id_event);
    let (_, body) = send(&app, get_request(&status_uri, &alice)).await;
    assert_eq!(body["selesai"], false);

    // Explicit event ids are checked against the caller
    let (status, _) = send(
        &app,
        json_request("POST", "/api/event/scan", Some(&mallory), json!({ "qr_code": "Z9", "id_event": id_event })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get_request(&status_uri, &mallory)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get_request(&format!("/api/event/detail/{}", id_event), &mallory)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let foreign = json!({ "qr_code": "A1", "id_event": id_event });
    let (status, _) = send(&app, json_request("PUT", "/api/event/scan-complete", Some(&mallory), foreign.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, json_request("DELETE", "/api/event/hapus-scan", Some(&mallory), foreign)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        json_request("PUT", "/api/event/event-selesai", Some(&mallory), json!({ "id_event": id_event })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // None of the foreign calls changed anything
    let (_, body) = send(&app, get_request(&format!("/api/event/tampil_scan?id_event={}", id_event), &alice)).await;
    let scans = body["data"].as_array().unwrap();
    assert_eq!(scans.len(), 3);
    assert!(scans.iter().all(|scan| scan["status"] == "Dipakai"));
    let (_, body) = send(&app, get_request(&format!("/api/event/detail/{}", id_event), &alice)).await;
    assert_eq!(body["status"], "Dipakai");
    assert_eq!(body["nama_event"], "Pameran Akbar");

    for code in ["A1", "A2", "A3"] {
        let body = json!({ "qr_code": code, "id_event": id_event.to_string() });
        let (status, body) = send(&app, json_request("PUT", "/api/event/scan-complete", Some(&alice), body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }
    let (_, body) = send(&app, get_request(&status_uri, &alice)).await;
    assert_eq!(body["selesai"], true);

    let (_, body) = send(&app, get_request(&format!("/api/event/tampil_scan?id_event={}", id_event), &alice)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"][0]["status"], "Selesai");

    let (status, _) = send(
        &app,
        json_request("DELETE", "/api/event/hapus-scan", Some(&alice), json!({ "qr_code": "A3" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        json_request("DELETE", "/api/event/hapus-scan", Some(&alice), json!({ "qr_code": "A3" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for _ in 0..2 {
        let (status, _) = send(
            &app,
            json_request("PUT", "/api/event/event-selesai", Some(&alice), json!({ "id_event": id_event })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, body) = send(&app, get_request(&format!("/api/event/detail/{}", id_event), &alice)).await;
    assert_eq!(body["status"], "Selesai");
    assert!(body["tanggal_selesai"].is_string());

    let (_, body) = send(&app, get_request("/api/event/tampil", &alice)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/event/hapus/{}", id_event))
        .header(AUTHORIZATION, format!("Bearer {}", token_for(&mallory)))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/event/hapus/{}", id_event))
        .header(AUTHORIZATION, format!("Bearer {}", token_for(&alice)))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, get_request("/api/event/tampil", &alice)).await;
    assert_eq!(body, json!([]));
}
