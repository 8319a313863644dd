mod config;
mod pr;
mod report;

use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

/// PR Digest: collects the closed Pull Requests of one GitHub repository,
/// together with their comments, into a per-author markdown digest.
///
/// Credentials and the target repository come from the TOKEN, OWNER and
/// REPOSITORY environment variables.
#[derive(Parser, Debug)]
#[command(name = "pr-digest", version, about)]
struct Cli {
    /// TOML file with tunables (page bound, delay, thresholds, output paths).
    /// Defaults to `.pr-digest.toml` when present.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = config::Config::load(cli.config.as_deref())?;
    debug!(settings = ?config.settings, "resolved settings");

    let _main_span = info_span!(
        "pr_digest",
        owner = %config.repository.owner,
        repo = %config.repository.name
    )
    .entered();

    let mut client = pr::GitHubClient::new(&config)?;

    info!(max_pages = config.settings.max_pages, "fetching closed pull requests");
    let mut pull_requests =
        pr::fetch_all_pull_requests(&mut client, config.settings.max_pages).await;

    info!(pull_requests = pull_requests.len(), "fetching comments");
    pr::attach_comments(&mut client, &mut pull_requests).await;

    let digest = report::Digest::group(&pull_requests);
    info!(
        authors = digest.groups.len(),
        pull_requests = digest.pull_request_count(),
        "writing digest"
    );
    let ctx = report::RenderContext::from_config(&config);
    let summaries = report::append_digest(&config.settings.report_path, &digest, &ctx)?;

    report::print_summary(&config.settings.report_path, pull_requests.len(), &summaries);
    info!("done");

    Ok(())
}
