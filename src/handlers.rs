use axum::{
    extract::Request,
    extract::State as AxumState,
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Response},
};
use tracing::{debug, error, info, warn};

use crate::SharedState;
use crate::page;
use crate::webhook::PushPayload;

/// Handles the GitLab push webhook.
///
/// Only a body that cannot be read produces an error status; every other
/// outcome, including a failed commit lookup, answers 200 with no body.
pub async fn handle_webhook(AxumState(state): AxumState<SharedState>, request: Request) -> Response {
    if request.method() != Method::POST {
        debug!("Ignoring {} {}", request.method(), request.uri());
        return StatusCode::OK.into_response();
    }

    let body = match axum::body::to_bytes(request.into_body(), state.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            error!("Error reading body: {}", e);
            return (StatusCode::BAD_REQUEST, "can't read body").into_response();
        }
    };

    let payload: PushPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Could not parse webhook payload: {}", e);
            return StatusCode::OK.into_response();
        }
    };

    let Some(head) = payload.head_commit() else {
        info!(
            "No commits in {} event for branch '{}', skipping",
            payload.object_kind,
            payload.branch()
        );
        return StatusCode::OK.into_response();
    };

    info!(
        "{} - added: {:?}, removed: {:?}",
        head.title, head.added, head.removed
    );

    match state.fetcher.fetch(&head.id).await {
        Ok(commit) => {
            info!(
                "added: {}, removed: {}",
                commit.stats.additions, commit.stats.deletions
            );
            state.replace_commit(commit).await;
        }
        Err(e) => {
            error!("Error getting commit {}: {}", head.id, e);
        }
    }

    StatusCode::OK.into_response()
}

/// Renders the latest commit through the page template.
pub async fn render_page(AxumState(state): AxumState<SharedState>) -> Response {
    let commit = state.current_commit().await;

    match page::render_page(&state.template_path, &commit).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(
                "Error rendering template {:?}: {}",
                state.template_path, e
            );
            StatusCode::OK.into_response()
        }
    }
}
