//! mdl-dl - Music Download service
//!
//! Accepts submissions over HTTP, resolves and downloads audio through
//! the external media resolver, expands vibe descriptions into playlists
//! through a local generation backend, and tracks every request as a
//! pollable job.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use mdl_dl::config::Config;
use mdl_dl::services::downloader::Downloader;
use mdl_dl::services::resolver::MediaResolver;
use mdl_dl::services::vibe::VibeClient;
use mdl_dl::store::JobStore;
use mdl_dl::{build_router, AppState};

#[derive(Debug, Parser)]
#[command(name = "mdl-dl", about = "Music download service")]
struct Cli {
    /// Root folder holding config, downloads, logs and the job file
    #[arg(long)]
    root_folder: Option<String>,

    /// HTTP port override
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting MDL Download service (mdl-dl) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let cli = Cli::parse();

    let root_folder =
        mdl_common::config::resolve_root_folder(cli.root_folder.as_deref(), "MDL_ROOT_FOLDER");
    mdl_common::config::ensure_root_folder(&root_folder)?;
    info!("Root folder: {}", root_folder.display());

    let config = Config::load(&root_folder, cli.port)?;
    config.ensure_directories()?;

    let store = JobStore::load(&config.jobs_file, &config.logs_dir);

    let resolver = Arc::new(MediaResolver::new(config.ytdlp_binary.clone()));
    if resolver.probe().await {
        info!("✓ Media resolver available ({})", config.ytdlp_binary);
    } else {
        warn!(
            "Media resolver '{}' is not runnable; downloads will fail until it is installed",
            config.ytdlp_binary
        );
    }

    let downloader = Downloader::new(resolver, config.output_dir.clone());
    let vibe = VibeClient::new(config.ollama_url.clone(), config.ollama_model.clone())?;
    info!("Generation backend: {}", config.ollama_url);

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config, store, downloader, vibe);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("mdl-dl listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
