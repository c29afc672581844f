//! GitLab commit API client and the commit record it returns

use chrono::{DateTime, FixedOffset};
use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::config::HookConfig;
use crate::error::FetchError;

pub const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

const USER_AGENT: &str = concat!("gitlab_commit_hook/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_MESSAGE_LEN: usize = 200;

/// Treats an explicit JSON `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Decodes a list of strings, skipping `null` and non-string entries.
pub(crate) fn string_entries<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(entries
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| match entry {
            serde_json::Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

/// Commit details as returned by `GET /projects/:id/repository/commits/:sha`.
///
/// Every field is optional on the wire; anything missing or `null` decodes to
/// its zero value so a sparse response still yields a usable record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Commit {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub short_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author_email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub committer_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub committer_email: String,
    pub created_at: Option<DateTime<FixedOffset>>,
    pub authored_date: Option<DateTime<FixedOffset>>,
    pub committed_date: Option<DateTime<FixedOffset>>,
    #[serde(deserialize_with = "string_entries")]
    pub parent_ids: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub last_pipeline: PipelineSummary,
    #[serde(deserialize_with = "null_as_default")]
    pub stats: CommitStats,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub web_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSummary {
    #[serde(deserialize_with = "null_as_default")]
    pub id: u64,
    #[serde(rename = "ref", deserialize_with = "null_as_default")]
    pub git_ref: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sha: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
}

/// Line-change counts for a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitStats {
    #[serde(deserialize_with = "null_as_default")]
    pub additions: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub deletions: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total: u64,
}

/// Looks up single commits of one project.
#[derive(Debug, Clone)]
pub struct CommitFetcher {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    token: String,
}

impl CommitFetcher {
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            project_id: project_id.into(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &HookConfig) -> Result<Self, FetchError> {
        Self::new(&config.gitlab_url, &config.project_id, &config.token)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Builds the API URL for `commit_id`, which may be a full or short sha or
    /// a ref name. Each path segment is percent-encoded on its own, so
    /// `group/app` and `feature/login` stay single segments.
    pub fn commit_url(&self, commit_id: &str) -> Result<Url, FetchError> {
        if commit_id.is_empty() {
            return Err(FetchError::InvalidRequest("commit id is empty".into()));
        }
        if self.project_id.is_empty() {
            return Err(FetchError::InvalidRequest("project id is empty".into()));
        }

        let mut url = Url::parse(&self.base_url).map_err(|e| {
            FetchError::InvalidRequest(format!("invalid base URL '{}': {}", self.base_url, e))
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                FetchError::InvalidRequest(format!(
                    "base URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?;
            segments.pop_if_empty().extend([
                "api",
                "v4",
                "projects",
                self.project_id.as_str(),
                "repository",
                "commits",
                commit_id,
            ]);
        }
        Ok(url)
    }

    /// Fetches one commit. Nothing is retried or cached.
    pub async fn fetch(&self, commit_id: &str) -> Result<Commit, FetchError> {
        let url = self.commit_url(commit_id)?;
        debug!("GET {}", url);

        let mut request = self.client.get(url);
        if !self.token.is_empty() {
            request = request.header(PRIVATE_TOKEN_HEADER, &self.token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_builder() {
                FetchError::InvalidRequest(e.to_string())
            } else {
                FetchError::Transport(e)
            }
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(FetchError::Body)?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

/// Pulls GitLab's `{"message": ...}` out of an error body, falling back to
/// the (truncated) raw text.
fn api_error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct ApiError {
        message: serde_json::Value,
    }

    if let Ok(err) = serde_json::from_slice::<ApiError>(body) {
        return match err.message {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "(empty body)".to_string();
    }
    text.chars().take(MAX_ERROR_MESSAGE_LEN).collect()
}
