pub mod config;
pub mod error;
pub mod gitlab;
pub mod handlers;
pub mod logging;
pub mod page;
pub mod webhook;

use axum::{Router, routing};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::{DEFAULT_MAX_BODY_BYTES, HookConfig};
use crate::error::{HookError, Result};
use crate::gitlab::{Commit, CommitFetcher};

pub struct AppState {
    pub fetcher: CommitFetcher,
    /// Most recently fetched commit; replaced whole, never merged.
    pub latest_commit: RwLock<Commit>,
    pub template_path: PathBuf,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(fetcher: CommitFetcher, template_path: PathBuf, initial: Commit) -> Self {
        Self {
            fetcher,
            latest_commit: RwLock::new(initial),
            template_path,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn from_config(config: &HookConfig, fetcher: CommitFetcher, initial: Commit) -> Self {
        Self {
            max_body_bytes: config.max_body_bytes,
            ..Self::new(fetcher, config.template.clone(), initial)
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub async fn current_commit(&self) -> Commit {
        self.latest_commit.read().await.clone()
    }

    pub async fn replace_commit(&self, commit: Commit) {
        *self.latest_commit.write().await = commit;
    }
}

pub type SharedState = Arc<AppState>;

/// `/page` renders the current commit; every other path, `/` included, is
/// the webhook receiver.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/page", routing::any(handlers::render_page))
        .route("/", routing::any(handlers::handle_webhook))
        .fallback(handlers::handle_webhook)
        .with_state(state)
}

/// Fetches the head of `git_ref` to seed the page before any webhook arrives.
///
/// A failure is fatal only when `required`; otherwise the page starts out
/// with an empty commit.
pub async fn load_initial_commit(
    fetcher: &CommitFetcher,
    git_ref: &str,
    required: bool,
) -> Result<Commit> {
    match fetcher.fetch(git_ref).await {
        Ok(commit) => {
            info!(
                "Loaded head of '{}': {} ({})",
                git_ref, commit.short_id, commit.title
            );
            Ok(commit)
        }
        Err(e) if required => Err(HookError::FetchFailed(e)),
        Err(e) => {
            warn!(
                "Could not fetch head of '{}', starting with an empty commit: {}",
                git_ref, e
            );
            Ok(Commit::default())
        }
    }
}
