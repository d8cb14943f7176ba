//! relmount - FUSE filesystem for GitHub release assets
//!
//! Mounts one repository's releases as a read-only tree: a directory per
//! release tag, a file per asset. Listings are cached with a staleness
//! threshold; file content is downloaded on demand.

mod catalog;
mod fs;
mod github;
mod mount;

use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use catalog::{ReleaseCatalog, RemoteContext};
use fs::ReleaseFilesystem;
use github::{GhClient, RepoId};

/// Listing staleness threshold when --refresh-secs is not given
const DEFAULT_REFRESH_SECS: u64 = 60;

/// Parsed command line
#[derive(Debug)]
struct Options {
    repo: RepoId,
    mountpoint: PathBuf,
    token: Option<String>,
    refresh_threshold: Duration,
}

fn print_help() {
    eprintln!(
        r#"relmount - Mount a GitHub repository's release assets as a read-only filesystem

USAGE:
    relmount <owner>/<repo> <mountpoint> [OPTIONS]

OPTIONS:
    --token <token>      GitHub bearer token (for private repositories and
                         higher rate limits)
    --refresh-secs <n>   Seconds a cached listing stays fresh (default 60;
                         0 refetches on every access)
    -h, --help           Show this help message

ENVIRONMENT:
    GITHUB_TOKEN     Token used when --token is absent
    RUST_LOG         Log level (trace, debug, info, warn, error)

EXAMPLES:
    # Mount the releases of a public repository
    relmount rust-lang/mdBook /mnt/mdbook-releases

    # Private repository, 5 minute listing cache
    relmount me/private-repo /mnt/releases --token ghp_xxx --refresh-secs 300
"#
    );
}

fn parse_args() -> Result<Option<Options>> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut positional = Vec::new();
    let mut token = None;
    let mut refresh_secs = DEFAULT_REFRESH_SECS;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" | "help" => return Ok(None),
            "--token" => {
                token = Some(
                    iter.next()
                        .ok_or_else(|| anyhow!("--token requires a value"))?,
                );
            }
            "--refresh-secs" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--refresh-secs requires a value"))?;
                refresh_secs = value.parse().map_err(|_| {
                    anyhow!("--refresh-secs expects a number of seconds, got '{}'", value)
                })?;
            }
            other if other.starts_with('-') => {
                return Err(anyhow!("Unknown option: {}", other));
            }
            _ => positional.push(arg),
        }
    }

    if positional.len() != 2 {
        return Err(anyhow!("Usage: relmount <owner>/<repo> <mountpoint>"));
    }

    let repo: RepoId = positional[0].parse().map_err(|e: String| anyhow!(e))?;

    Ok(Some(Options {
        repo,
        mountpoint: PathBuf::from(&positional[1]),
        token,
        refresh_threshold: Duration::from_secs(refresh_secs),
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let log_level = env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command line
    let options = match parse_args() {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_help();
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    let token = options.token.clone().or_else(|| env::var("GITHUB_TOKEN").ok());

    info!(repo = %options.repo, "Connecting to GitHub...");
    let client = GhClient::connect(options.repo.clone(), token)
        .await
        .context("Failed to resolve repository")?;

    let ctx = Arc::new(RemoteContext::new(
        Arc::new(client),
        options.refresh_threshold,
    ));
    let releases = Arc::new(ReleaseCatalog::new(ctx));
    let filesystem = ReleaseFilesystem::new(releases);

    let handle = mount::mount(
        filesystem,
        options.mountpoint.clone(),
        &options.repo.to_string(),
    )
    .await?;

    info!(
        repo = %options.repo,
        mountpoint = %options.mountpoint.display(),
        "Releases mounted. Press Ctrl+C to unmount."
    );

    // Wait for Ctrl+C
    tokio::signal::ctrl_c().await?;

    info!("Received shutdown signal, unmounting...");
    handle.unmount().await?;

    info!("Shutdown complete.");
    Ok(())
}
