use gitlab_commit_hook::config::HookConfig;
use gitlab_commit_hook::error::Result;
use gitlab_commit_hook::gitlab::CommitFetcher;
use gitlab_commit_hook::logging::{FileLogger, setup_logging};
use gitlab_commit_hook::{AppState, load_initial_commit, router};
use std::sync::Arc;
use tracing::{error, info};

async fn run(config: HookConfig) -> Result<()> {
    let fetcher = CommitFetcher::from_config(&config)?;
    let initial = load_initial_commit(
        &fetcher,
        &config.initial_ref,
        config.require_initial_fetch,
    )
    .await?;

    info!(
        "Watching project '{}' on {}, page template at {:?}",
        fetcher.project_id(),
        config.gitlab_url,
        config.template
    );

    let state = Arc::new(AppState::from_config(&config, fetcher, initial));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("Listening on {}", config.bind);
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let config = HookConfig::from_args();

    let file_logger = config.log_dir.clone().map(FileLogger::new);
    // Held until exit so the file writer flushes.
    let _log_guard = match setup_logging(&config.log_level, file_logger.as_ref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
