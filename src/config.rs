use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use reqwest::Url;

use crate::error::{HookError, Result};

pub const DEFAULT_GITLAB_URL: &str = "https://gitlab.com";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8001";
pub const DEFAULT_TEMPLATE_PATH: &str = "hook.html";
pub const DEFAULT_INITIAL_REF: &str = "master";
/// GitLab refuses to deliver webhook payloads larger than 25 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Relays GitLab push webhooks into a page showing the latest commit
#[derive(Debug, Clone, Parser)]
#[command(name = "gitlab_commit_hook", version, about)]
pub struct HookConfig {
    /// GitLab instance URL
    #[arg(long = "gitlab", value_name = "URL", default_value = DEFAULT_GITLAB_URL)]
    pub gitlab_url: String,

    /// GitLab project ID or `namespace/path`
    #[arg(short = 'p', long = "project", value_name = "PROJECT")]
    pub project_id: String,

    /// Access token sent as PRIVATE-TOKEN; left out when empty
    #[arg(long, value_name = "TOKEN", default_value = "", hide_default_value = true)]
    pub token: String,

    /// Address the HTTP server listens on
    #[arg(long, value_name = "ADDR", default_value = DEFAULT_BIND_ADDRESS)]
    pub bind: String,

    /// Page template, re-read on every request
    #[arg(long, value_name = "PATH", default_value = DEFAULT_TEMPLATE_PATH)]
    pub template: PathBuf,

    /// Ref whose head commit is fetched at startup
    #[arg(long, value_name = "REF", default_value = DEFAULT_INITIAL_REF)]
    pub initial_ref: String,

    /// Exit if the startup fetch fails instead of serving an empty commit
    #[arg(long)]
    pub require_initial_fetch: bool,

    /// Largest webhook body accepted, in bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, value_name = "FILTER", default_value = "info")]
    pub log_level: String,

    /// Also write daily-rotated log files into this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

impl HookConfig {
    /// Parses process arguments, accepting Go-style `-gitlab` flags too.
    pub fn from_args() -> Self {
        Self::parse_from(normalize_go_flags(std::env::args()))
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.gitlab_url).map_err(|e| {
            HookError::ConfigError(format!("Invalid GitLab URL '{}': {}", self.gitlab_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(HookError::ConfigError(format!(
                "GitLab URL '{}' must use http or https",
                self.gitlab_url
            )));
        }
        if self.project_id.trim().is_empty() {
            return Err(HookError::ConfigError("Project ID must not be empty".into()));
        }
        if self.initial_ref.is_empty() {
            return Err(HookError::ConfigError("Initial ref must not be empty".into()));
        }
        if self.max_body_bytes == 0 {
            return Err(HookError::ConfigError(
                "Maximum body size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Rewrites single-dash long flags (`-gitlab URL`, `-token=abc`) to their
/// `--` form so clap accepts them. Short flags and values pass through.
pub fn normalize_go_flags<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let command = HookConfig::command();
    let long_names: Vec<&str> = command
        .get_arguments()
        .filter_map(|arg| arg.get_long())
        .chain(["help", "version"])
        .collect();

    args.into_iter()
        .map(|arg| {
            let Some(flag) = arg.strip_prefix('-') else {
                return arg;
            };
            if flag.starts_with('-') {
                return arg;
            }
            let name = flag.split_once('=').map_or(flag, |(name, _)| name);
            if name.len() > 1 && long_names.contains(&name) {
                format!("-{}", arg)
            } else {
                arg
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn parse(list: &[&str]) -> HookConfig {
        HookConfig::try_parse_from(normalize_go_flags(args(list))).unwrap()
    }

    #[test]
    fn go_style_flags_are_rewritten() {
        let normalized = normalize_go_flags(args(&[
            "hook",
            "-gitlab",
            "https://git.example.com",
            "-p",
            "42",
            "-token=abc",
            "--bind",
            "127.0.0.1:9000",
        ]));
        assert_eq!(
            normalized,
            args(&[
                "hook",
                "--gitlab",
                "https://git.example.com",
                "-p",
                "42",
                "--token=abc",
                "--bind",
                "127.0.0.1:9000",
            ])
        );
    }

    #[test]
    fn values_that_look_like_flags_are_untouched() {
        let normalized = normalize_go_flags(args(&["hook", "-p", "-12", "-unknown"]));
        assert_eq!(normalized, args(&["hook", "-p", "-12", "-unknown"]));
    }

    #[test]
    fn defaults_apply_when_only_project_given() {
        let config = parse(&["hook", "-p", "42"]);
        assert_eq!(config.gitlab_url, DEFAULT_GITLAB_URL);
        assert_eq!(config.project_id, "42");
        assert!(config.token.is_empty());
        assert_eq!(config.bind, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.template, PathBuf::from("hook.html"));
        assert_eq!(config.initial_ref, "master");
        assert!(!config.require_initial_fetch);
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn project_is_required() {
        assert!(HookConfig::try_parse_from(args(&["hook"])).is_err());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = parse(&["hook", "-p", "42", "-gitlab", "gitlab.com"]);
        assert!(matches!(config.validate(), Err(HookError::ConfigError(_))));

        config.gitlab_url = "ftp://gitlab.com".into();
        assert!(matches!(config.validate(), Err(HookError::ConfigError(_))));

        config.gitlab_url = DEFAULT_GITLAB_URL.into();
        config.project_id = "  ".into();
        assert!(matches!(config.validate(), Err(HookError::ConfigError(_))));

        config.project_id = "42".into();
        config.max_body_bytes = 0;
        assert!(matches!(config.validate(), Err(HookError::ConfigError(_))));
    }
}
