//! Status page rendering

use std::path::Path;

use minijinja::{AutoEscape, Environment};

use crate::error::Result;
use crate::gitlab::Commit;

/// Loads the template at `path` and renders `commit` through it. The file is
/// read on every call so template edits show up without a restart.
pub async fn render_page(path: &Path, commit: &Commit) -> Result<String> {
    let source = tokio::fs::read_to_string(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    render_template(&name, &source, commit)
}

/// Renders a template with the commit's fields as top-level variables, e.g.
/// `{{ stats.additions }}` or `{{ last_pipeline.status }}`.
pub fn render_template(name: &str, source: &str, commit: &Commit) -> Result<String> {
    let mut env = Environment::new();
    // Values go out verbatim; templates apply `|escape` where they need it.
    env.set_auto_escape_callback(|_| AutoEscape::None);
    let template = env.template_from_named_str(name, source)?;
    Ok(template.render(commit)?)
}
