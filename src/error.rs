use std::io;

/// Custom error type for gitlab_commit_hook operations
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Commit fetch failed: {0}")]
    FetchFailed(#[from] FetchError),

    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Failures of a single commit lookup against the GitLab API.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Invalid commit request: {0}")]
    InvalidRequest(String),

    #[error("Request to GitLab failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("GitLab responded with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to read GitLab response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("Failed to parse commit JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Helper type for Results that use HookError
pub type Result<T> = std::result::Result<T, HookError>;
