use std::collections::HashMap;
use std::fs;
use std::time::{Duration, SystemTime};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header, request};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use rax_file_manager::ServerConfig;
use rax_file_manager::protocol::{AppState, build_router};

const BOUNDARY: &str = "raxtestboundary";

// Helper to build a router over a fresh storage root
fn setup(max_upload_mb: u64) -> (TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        storage_root: dir.path().to_string_lossy().into_owned(),
        max_upload_mb,
        secret_key: "integration-test-secret-key".into(),
        ..ServerConfig::default()
    };
    let state = AppState::new(config).unwrap();
    (dir, build_router(state))
}

// Minimal cookie store that follows Set-Cookie headers like a browser
#[derive(Default)]
struct Browser {
    cookies: HashMap<String, String>,
}

impl Browser {
    fn absorb<B>(&mut self, response: &Response<B>) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            let raw = value.to_str().unwrap();
            let pair = raw.split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            if value.is_empty() || raw.contains("Max-Age=0") {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }
    }

    fn header(&self) -> String {
        self.cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    async fn send(
        &mut self,
        app: &Router,
        builder: request::Builder,
        body: Body,
    ) -> Response<Body> {
        let builder = if self.cookies.is_empty() {
            builder
        } else {
            builder.header(header::COOKIE, self.header())
        };
        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        self.absorb(&response);
        response
    }

    async fn get(&mut self, app: &Router, uri: &str) -> Response<Body> {
        self.send(app, Request::get(uri), Body::empty()).await
    }

    async fn post_form(&mut self, app: &Router, uri: &str, form: &str) -> Response<Body> {
        let builder =
            Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(app, builder, Body::from(form.to_string())).await
    }

    async fn upload(
        &mut self,
        app: &Router,
        current_path: &str,
        file_name: &str,
        data: &[u8],
    ) -> Response<Body> {
        let builder = Request::post("/upload").header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        let body = multipart_body(current_path, file_name, data);
        self.send(app, builder, Body::from(body)).await
    }

    async fn login(&mut self, app: &Router) {
        let response = self
            .post_form(app, "/login", "username=admin&password=password123")
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }
}

fn multipart_body(current_path: &str, file_name: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    let current_path_part = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"current_path\"\r\n\r\n\
         {current_path}\r\n"
    );
    let file_header = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    );
    body.extend_from_slice(current_path_part.as_bytes());
    body.extend_from_slice(file_header.as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn location<B>(response: &Response<B>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn api_lists_nothing_for_empty_root() {
    let (_dir, app) = setup(1);
    let mut browser = Browser::default();

    let response = browser.get(&app, "/api/files").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "[]");
}

#[tokio::test]
async fn api_lists_root_files_newest_first() {
    let (dir, app) = setup(1);
    let now = SystemTime::now();
    for (name, age) in [("old.txt", 300), ("new.png", 0), ("mid.md", 100)] {
        let path = dir.path().join(name);
        fs::write(&path, name).unwrap();
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(now - Duration::from_secs(age))
            .unwrap();
    }
    fs::create_dir(dir.path().join("sub")).unwrap();

    let mut browser = Browser::default();
    let response = browser.get(&app, "/api/files").await;
    let files: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    let files = files.as_array().unwrap();

    let names: Vec<&str> = files.iter().map(|f| f["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["new.png", "mid.md", "old.txt"]);
    assert_eq!(files[0]["is_image"], true);
    assert_eq!(files[0]["extension"], "png");
    assert_eq!(files[2]["size"], 7);
}

#[tokio::test]
async fn unauthenticated_mutations_redirect_to_login() {
    let (dir, app) = setup(1);
    fs::write(dir.path().join("keep.txt"), "keep").unwrap();
    let mut browser = Browser::default();

    let response = browser
        .post_form(&app, "/create_folder", "current_path=&folder_name=docs")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(!dir.path().join("docs").exists());

    let response = browser.post_form(&app, "/delete/keep.txt", "").await;
    assert_eq!(location(&response), "/login");
    assert!(dir.path().join("keep.txt").exists());

    let response = browser.upload(&app, "", "a.txt", b"hello").await;
    assert_eq!(location(&response), "/login");
    assert!(!dir.path().join("a.txt").exists());

    let response = browser.get(&app, "/login").await;
    assert!(body_text(response).await.contains("Please log in to access this page."));
}

#[tokio::test]
async fn bad_login_is_rejected() {
    let (_dir, app) = setup(1);
    let mut browser = Browser::default();

    let response = browser
        .post_form(&app, "/login", "username=admin&password=wrong")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(!browser.cookies.contains_key("rax_session"));

    let response = browser.get(&app, "/login").await;
    assert!(body_text(response).await.contains("Invalid username or password"));
}

#[tokio::test]
async fn login_then_logout() {
    let (_dir, app) = setup(1);
    let mut browser = Browser::default();
    browser.login(&app).await;

    let page = body_text(browser.get(&app, "/").await).await;
    assert!(page.contains("Successfully logged in!"));
    assert!(page.contains("/logout"));

    let response = browser.get(&app, "/logout").await;
    assert_eq!(location(&response), "/");

    let response = browser
        .post_form(&app, "/create_folder", "current_path=&folder_name=docs")
        .await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn upload_twice_keeps_both_files() {
    let (dir, app) = setup(1);
    let mut browser = Browser::default();
    browser.login(&app).await;

    let response = browser.upload(&app, "", "a.txt", b"first").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let response = browser.upload(&app, "", "a.txt", b"second").await;
    assert_eq!(location(&response), "/");

    assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"first");
    assert_eq!(fs::read(dir.path().join("a_1.txt")).unwrap(), b"second");

    let page = body_text(browser.get(&app, "/").await).await;
    assert!(page.contains("a_1.txt"));
}

#[tokio::test]
async fn upload_into_subfolder_sanitizes_name() {
    let (dir, app) = setup(1);
    fs::create_dir(dir.path().join("docs")).unwrap();
    let mut browser = Browser::default();
    browser.login(&app).await;

    let response = browser.upload(&app, "docs", "my report.pdf", b"%PDF").await;
    assert_eq!(location(&response), "/docs");
    assert!(dir.path().join("docs").join("my_report.pdf").exists());
}

#[tokio::test]
async fn oversized_upload_leaves_no_file() {
    let (dir, app) = setup(1);
    let mut browser = Browser::default();
    browser.login(&app).await;

    let data = vec![b'x'; 1024 * 1024 + 512 * 1024];
    let response = browser.upload(&app, "", "big.bin", &data).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn create_rename_and_delete_folder() {
    let (dir, app) = setup(1);
    let mut browser = Browser::default();
    browser.login(&app).await;

    let response = browser
        .post_form(&app, "/create_folder", "current_path=&folder_name=docs")
        .await;
    assert_eq!(location(&response), "/");
    assert!(dir.path().join("docs").is_dir());

    let response = browser.post_form(&app, "/rename/docs", "new_name=papers").await;
    assert_eq!(location(&response), "/");
    assert!(!dir.path().join("docs").exists());
    assert!(dir.path().join("papers").is_dir());

    fs::write(dir.path().join("papers").join("x.txt"), "x").unwrap();
    let response = browser.post_form(&app, "/delete/papers", "").await;
    assert_eq!(location(&response), "/");
    assert!(dir.path().join("papers").join("x.txt").exists());

    fs::remove_file(dir.path().join("papers").join("x.txt")).unwrap();
    browser.post_form(&app, "/delete/papers", "").await;
    assert!(!dir.path().join("papers").exists());
}

#[tokio::test]
async fn download_and_view_headers() {
    let (dir, app) = setup(1);
    fs::create_dir(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("docs").join("notes.txt"), "hello world").unwrap();
    let mut browser = Browser::default();

    let response = browser.get(&app, "/download/docs/notes.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    assert!(
        response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("attachment; filename=\"notes.txt\"")
    );
    assert_eq!(body_text(response).await, "hello world");

    let response = browser.get(&app, "/view/docs/notes.txt").await;
    assert!(
        response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("inline")
    );
}

#[tokio::test]
async fn missing_file_and_folder_redirect() {
    let (_dir, app) = setup(1);
    let mut browser = Browser::default();

    let response = browser.get(&app, "/download/docs/missing.txt").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/docs");

    let response = browser.get(&app, "/no/such/folder").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let page = body_text(browser.get(&app, "/").await).await;
    assert!(page.contains("Folder not found"));
}

#[tokio::test]
async fn traversal_is_refused() {
    let (dir, app) = setup(1);
    let outside = dir.path().parent().unwrap().join("rax-outside-secret.txt");
    let mut browser = Browser::default();

    let response = browser.get(&app, "/download/..%2F..%2Fetc%2Fpasswd").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    browser.login(&app).await;
    let response = browser
        .post_form(&app, "/create_folder", "current_path=..&folder_name=escape")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(!dir.path().parent().unwrap().join("escape").exists());
    assert!(!outside.exists());
}

#[tokio::test]
async fn oversized_upload_into_new_folders_leaves_nothing() {
    let (dir, app) = setup(1);
    let mut browser = Browser::default();
    browser.login(&app).await;

    let data = vec![b'x'; 1024 * 1024 + 512 * 1024];
    let response = browser.upload(&app, "new/deep", "big.bin", &data).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(!dir.path().join("new").exists());

    let page = body_text(browser.get(&app, "/").await).await;
    assert!(page.contains("File too large"));
}

#[tokio::test]
async fn upload_without_file_name_writes_nothing() {
    let (dir, app) = setup(1);
    let mut browser = Browser::default();
    browser.login(&app).await;
    let _ = browser.get(&app, "/").await;

    let response = browser.upload(&app, "", "", b"").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());

    let page = body_text(browser.get(&app, "/").await).await;
    assert!(page.contains("No file selected"));
}

#[tokio::test]
async fn unauthenticated_rename_changes_nothing() {
    let (dir, app) = setup(1);
    fs::write(dir.path().join("keep.txt"), "keep").unwrap();
    let mut browser = Browser::default();

    let response = browser.post_form(&app, "/rename/keep.txt", "new_name=moved").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(dir.path().join("keep.txt").exists());
    assert!(!dir.path().join("moved").exists());
}

#[tokio::test]
async fn tampered_session_cookie_is_ignored() {
    let (dir, app) = setup(1);
    let mut browser = Browser::default();
    browser.login(&app).await;

    let session = browser.cookies.get_mut("rax_session").unwrap();
    let last = session.pop().unwrap();
    session.push(if last == '0' { '1' } else { '0' });

    let page = body_text(browser.get(&app, "/").await).await;
    assert!(!page.contains("/logout"));

    let response = browser
        .post_form(&app, "/create_folder", "current_path=&folder_name=docs")
        .await;
    assert_eq!(location(&response), "/login");
    assert!(!dir.path().join("docs").exists());

    let mut forged = Browser::default();
    forged
        .cookies
        .insert("rax_session".into(), "00000000000000000000000000000000".into());
    let response = forged.post_form(&app, "/delete/anything", "").await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn route_names_cannot_become_root_folders() {
    let (dir, app) = setup(1);
    let mut browser = Browser::default();
    browser.login(&app).await;

    for name in ["login", "upload", "view"] {
        let response = browser
            .post_form(&app, "/create_folder", &format!("current_path=&folder_name={name}"))
            .await;
        assert_eq!(location(&response), "/");
        assert!(!dir.path().join(name).exists());
    }

    let page = body_text(browser.get(&app, "/").await).await;
    assert!(page.contains("Invalid name"));

    let response = browser.upload(&app, "view/sub", "a.txt", b"x").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(!dir.path().join("view").exists());

    let response = browser
        .post_form(&app, "/create_folder", "current_path=docs&folder_name=login")
        .await;
    assert_eq!(location(&response), "/docs");
    assert!(dir.path().join("docs").join("login").is_dir());
}
