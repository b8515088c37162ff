//! In-process fake of the GitHub contents API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ideabook_core::config::SyncConfig;
use ideabook_core::remote::{GitHubClient, GitHubClientOptions};
use serde_json::{json, Value};

pub const TOKEN: &str = "ghp_test_token";
pub const OWNER: &str = "octocat";
pub const REPO: &str = "ideas";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub content: String,
    pub sha: String,
    /// Served like a file over 1 MB: `encoding: none` and no content.
    pub oversized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRecord {
    pub path: String,
    pub message: String,
    pub sha: Option<String>,
}

struct FakeState {
    files: Mutex<HashMap<String, StoredFile>>,
    puts: Mutex<Vec<PutRecord>>,
    repository_status: Mutex<StatusCode>,
    next_sha: AtomicUsize,
}

#[derive(Clone)]
pub struct FakeGitHub {
    state: Arc<FakeState>,
}

impl Default for FakeGitHub {
    fn default() -> Self {
        Self {
            state: Arc::new(FakeState {
                files: Mutex::new(HashMap::new()),
                puts: Mutex::new(Vec::new()),
                repository_status: Mutex::new(StatusCode::OK),
                next_sha: AtomicUsize::new(1),
            }),
        }
    }
}

impl FakeGitHub {
    /// Serve on an ephemeral local port and return the base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/user", get(get_user))
            .route("/repos/{owner}/{repo}", get(get_repository))
            .route(
                "/repos/{owner}/{repo}/contents/{*path}",
                get(get_contents).put(put_contents),
            )
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{address}")
    }

    pub fn client(&self, base_url: &str) -> GitHubClient {
        client_for(base_url, TOKEN)
    }

    /// Store a file directly, as another client would. Returns its sha.
    pub fn seed(&self, path: &str, content: &str) -> String {
        self.insert(path, content, false)
    }

    /// Store a file the API only describes, without its content.
    pub fn seed_oversized(&self, path: &str, content: &str) -> String {
        self.insert(path, content, true)
    }

    fn insert(&self, path: &str, content: &str, oversized: bool) -> String {
        let sha = self.next_sha();
        self.state.files.lock().unwrap().insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                sha: sha.clone(),
                oversized,
            },
        );
        sha
    }

    pub fn file(&self, path: &str) -> Option<StoredFile> {
        self.state.files.lock().unwrap().get(path).cloned()
    }

    pub fn puts(&self) -> Vec<PutRecord> {
        self.state.puts.lock().unwrap().clone()
    }

    pub fn set_repository_status(&self, status: StatusCode) {
        *self.state.repository_status.lock().unwrap() = status;
    }

    fn next_sha(&self) -> String {
        format!(
            "{:040x}",
            self.state.next_sha.fetch_add(1, Ordering::SeqCst)
        )
    }
}

pub fn client_for(base_url: &str, token: &str) -> GitHubClient {
    let config = SyncConfig::new(OWNER, REPO, token).unwrap();
    GitHubClient::new(
        &config,
        &GitHubClientOptions {
            base_url: base_url.to_string(),
            ..GitHubClientOptions::default()
        },
    )
    .unwrap()
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {TOKEN}"))
}

fn has_api_headers(headers: &HeaderMap) -> bool {
    let accept = headers
        .get("accept")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    accept == "application/vnd.github+json" && headers.contains_key("x-github-api-version")
}

async fn get_user(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return message(StatusCode::UNAUTHORIZED, "Bad credentials");
    }
    Json(json!({
        "login": OWNER,
        "name": "The Octocat",
        "avatar_url": "https://avatars.example.com/octocat.png"
    }))
    .into_response()
}

async fn get_repository(
    State(fake): State<FakeGitHub>,
    Path((owner, repo)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return message(StatusCode::UNAUTHORIZED, "Bad credentials");
    }
    let status = *fake.state.repository_status.lock().unwrap();
    if status != StatusCode::OK {
        return message(status, "Repository not accessible");
    }
    Json(json!({ "full_name": format!("{owner}/{repo}"), "private": true })).into_response()
}

async fn get_contents(
    State(fake): State<FakeGitHub>,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return message(StatusCode::UNAUTHORIZED, "Bad credentials");
    }
    if !has_api_headers(&headers) {
        return message(StatusCode::BAD_REQUEST, "Missing API headers");
    }

    let path = path.trim_start_matches('/').to_string();
    let files = fake.state.files.lock().unwrap();
    if let Some(file) = files.get(&path) {
        if file.oversized {
            return Json(json!({
                "type": "file",
                "path": path,
                "sha": file.sha,
                "encoding": "none",
                "content": "",
            }))
            .into_response();
        }
        return Json(json!({
            "type": "file",
            "path": path,
            "sha": file.sha,
            "encoding": "base64",
            "content": wrapped_base64(&file.content),
        }))
        .into_response();
    }

    let prefix = format!("{path}/");
    let listing = files
        .keys()
        .filter(|key| key.starts_with(&prefix))
        .map(|key| json!({ "type": "file", "path": key }))
        .collect::<Vec<_>>();
    if listing.is_empty() {
        message(StatusCode::NOT_FOUND, "Not Found")
    } else {
        Json(Value::Array(listing)).into_response()
    }
}

async fn put_contents(
    State(fake): State<FakeGitHub>,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return message(StatusCode::UNAUTHORIZED, "Bad credentials");
    }

    let path = path.trim_start_matches('/').to_string();
    let sha = body["sha"].as_str().map(str::to_string);
    let Some(encoded) = body["content"].as_str() else {
        return message(StatusCode::UNPROCESSABLE_ENTITY, "content is missing");
    };
    let Ok(bytes) = STANDARD.decode(encoded) else {
        return message(StatusCode::UNPROCESSABLE_ENTITY, "content is not valid Base64");
    };
    let content = String::from_utf8(bytes).unwrap();

    let mut files = fake.state.files.lock().unwrap();
    match (files.get(&path), sha.as_deref()) {
        (Some(_), None) => {
            return message(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid request.\n\n\"sha\" wasn't supplied.",
            );
        }
        (Some(current), Some(sha)) if current.sha != sha => {
            return message(
                StatusCode::CONFLICT,
                &format!("{path} does not match {sha}"),
            );
        }
        (None, Some(_)) => {
            return message(StatusCode::NOT_FOUND, "Not Found");
        }
        _ => {}
    }

    let created = !files.contains_key(&path);
    let next_sha = fake.next_sha();
    files.insert(
        path.clone(),
        StoredFile {
            content,
            sha: next_sha.clone(),
            oversized: false,
        },
    );
    fake.state.puts.lock().unwrap().push(PutRecord {
        path: path.clone(),
        message: body["message"].as_str().unwrap_or_default().to_string(),
        sha,
    });

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (
        status,
        Json(json!({
            "content": { "path": path, "sha": next_sha },
            "commit": { "sha": fake.next_sha() }
        })),
    )
        .into_response()
}

/// Base64 wrapped at 60 columns, the way the contents API serves it.
fn wrapped_base64(content: &str) -> String {
    let encoded = STANDARD.encode(content.as_bytes());
    encoded
        .as_bytes()
        .chunks(60)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}
