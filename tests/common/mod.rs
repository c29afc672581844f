//! Shared helpers for the integration tests: a stub GitLab commit API served
//! on an ephemeral port and a few request helpers for the hook router.
//!
//! Each test file compiles as its own crate, so not every helper is used
//! everywhere.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use gitlab_commit_hook::gitlab::{Commit, CommitFetcher};
use gitlab_commit_hook::{AppState, SharedState, router};

pub const TEST_TOKEN: &str = "glpat-test-token";
pub const TEST_PROJECT: &str = "42";

pub const PAGE_TEMPLATE: &str = "id={{ id }} additions={{ stats.additions }} \
deletions={{ stats.deletions }} total={{ stats.total }} status={{ status }} url={{ web_url }}";

#[derive(Debug, Clone, PartialEq)]
pub struct StubRequest {
    pub project: String,
    pub commit_id: String,
    pub token: Option<String>,
}

/// In-process stand-in for `GET /api/v4/projects/:id/repository/commits/:sha`.
#[derive(Clone, Default)]
pub struct StubGitLab {
    commits: Arc<HashMap<String, Value>>,
    requests: Arc<Mutex<Vec<StubRequest>>>,
}

impl StubGitLab {
    pub fn requests(&self) -> Vec<StubRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested_ids(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.commit_id).collect()
    }
}

async fn stub_commit(
    State(stub): State<StubGitLab>,
    UrlPath((project, commit_id)): UrlPath<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let token = headers
        .get("PRIVATE-TOKEN")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    stub.requests.lock().unwrap().push(StubRequest {
        project,
        commit_id: commit_id.clone(),
        token,
    });

    match stub.commits.get(&commit_id) {
        Some(body) => Json(body.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "404 Commit Not Found"})),
        )
            .into_response(),
    }
}

/// Starts the stub API and returns its base URL.
pub async fn spawn_stub_gitlab(commits: Vec<(&str, Value)>) -> (String, StubGitLab) {
    let stub = StubGitLab {
        commits: Arc::new(
            commits
                .into_iter()
                .map(|(id, body)| (id.to_string(), body))
                .collect(),
        ),
        requests: Arc::default(),
    };

    let app = Router::new()
        .route(
            "/api/v4/projects/{project}/repository/commits/{commit_id}",
            get(stub_commit),
        )
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), stub)
}

/// A base URL nothing listens on.
pub async fn dead_gitlab_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn write_template(dir: &Path) -> PathBuf {
    let path = dir.join("hook.html");
    std::fs::write(&path, PAGE_TEMPLATE).unwrap();
    path
}

pub fn hook_state(base_url: &str, template_path: PathBuf, initial: Commit) -> SharedState {
    let fetcher = CommitFetcher::new(base_url, TEST_PROJECT, TEST_TOKEN).unwrap();
    Arc::new(AppState::new(fetcher, template_path, initial))
}

pub fn startup_commit() -> Commit {
    serde_json::from_value(json!({
        "id": "startup0",
        "short_id": "startup",
        "title": "Initial import",
        "stats": {"additions": 100, "deletions": 0, "total": 100},
        "status": "success",
        "web_url": "https://gitlab.example.com/acme/app/-/commit/startup0"
    }))
    .unwrap()
}

pub async fn send(app: &Router, method: Method, uri: &str, body: impl Into<Body>) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .header("X-Gitlab-Event", "Push Hook")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub async fn post_webhook(app: &Router, payload: Value) -> (StatusCode, String) {
    send(app, Method::POST, "/", payload.to_string()).await
}

pub async fn get_page(app: &Router) -> String {
    let (status, body) = send(app, Method::GET, "/page", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    body
}

pub fn build_router(state: &SharedState) -> Router {
    router(state.clone())
}
