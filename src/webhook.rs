//! Webhook related structures

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::gitlab::{null_as_default, string_entries};

/// A GitLab push event as delivered to the webhook endpoint.
///
/// Only `commits` drives behaviour; the rest is decoded so it can be logged.
/// Missing or `null` fields decode to zero values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PushPayload {
    #[serde(deserialize_with = "null_as_default")]
    pub object_kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub before: String,
    #[serde(deserialize_with = "null_as_default")]
    pub after: String,
    #[serde(rename = "ref", deserialize_with = "null_as_default")]
    pub git_ref: String,
    pub checkout_sha: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub user_id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub user_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_username: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_avatar: String,
    #[serde(deserialize_with = "null_as_default")]
    pub project_id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub project: PushProject,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: PushRepository,
    #[serde(deserialize_with = "null_as_default")]
    pub commits: Vec<PushCommit>,
    #[serde(deserialize_with = "null_as_default")]
    pub total_commits_count: u64,
}

impl PushPayload {
    /// The commit a push points at. GitLab lists the newest commit first; the
    /// order is taken as delivered.
    pub fn head_commit(&self) -> Option<&PushCommit> {
        self.commits.first()
    }

    /// Branch name without the `refs/heads/` prefix.
    pub fn branch(&self) -> &str {
        self.git_ref
            .strip_prefix("refs/heads/")
            .unwrap_or(&self.git_ref)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PushProject {
    #[serde(deserialize_with = "null_as_default")]
    pub id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub web_url: String,
    pub avatar_url: Option<AvatarUrl>,
    #[serde(deserialize_with = "null_as_default")]
    pub git_ssh_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub git_http_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub namespace: String,
    #[serde(deserialize_with = "null_as_default")]
    pub visibility_level: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub path_with_namespace: String,
    #[serde(deserialize_with = "null_as_default")]
    pub default_branch: String,
    #[serde(deserialize_with = "null_as_default")]
    pub homepage: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ssh_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub http_url: String,
}

/// GitLab sends `null`, a URL string, or occasionally something else here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AvatarUrl {
    Url(String),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PushRepository {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub homepage: String,
    #[serde(deserialize_with = "null_as_default")]
    pub git_http_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub git_ssh_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub visibility_level: u32,
}

/// Commit summary embedded in a push event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PushCommit {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    pub timestamp: Option<DateTime<FixedOffset>>,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author: PushAuthor,
    #[serde(deserialize_with = "string_entries")]
    pub added: Vec<String>,
    #[serde(deserialize_with = "string_entries")]
    pub modified: Vec<String>,
    #[serde(deserialize_with = "string_entries")]
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PushAuthor {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
}
