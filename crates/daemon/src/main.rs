use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transcoder_core::{
    load_config, validate_config, Archiver, BatchProcessor, Converter, DirScanner, EngineInfo,
    FfmpegConverter, FsArchiver, WatchLoop,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("transcoderd {}", VERSION);

    // Determine config path
    let config_path = std::env::var("TRANSCODER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Source directory: {:?}", config.discovery.source_dir);
    info!("Output directory: {:?}", config.processor.output_dir);
    info!("Archive directory: {:?}", config.archive.archive_dir);

    // Verify the transcoding engine
    let converter = FfmpegConverter::new(config.converter.clone());
    converter
        .validate()
        .await
        .context("Transcoding engine is not available")?;

    let engine = EngineInfo::detect(&config.converter)
        .await
        .context("Failed to query the transcoding engine")?;
    info!(
        "Using ffmpeg {} ({} encoders)",
        engine.version.as_deref().unwrap_or("(unknown version)"),
        engine.encoders.len()
    );
    engine
        .ensure_video_format(config.processor.encoding.video_codec)
        .context("Configured video codec is not supported by the engine")?;

    // Prepare output and archive directories
    tokio::fs::create_dir_all(&config.processor.output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create output directory {:?}",
                config.processor.output_dir
            )
        })?;
    let archiver = FsArchiver::new(config.archive.clone());
    archiver
        .validate()
        .await
        .context("Archive directory is not usable")?;

    // Wire the pipeline
    let processor = BatchProcessor::new(config.processor.clone(), converter, archiver);
    let scanner = DirScanner::new(config.discovery.clone());
    let watch = Arc::new(WatchLoop::new(
        config.orchestrator.clone(),
        scanner,
        processor,
    ));

    let runner = {
        let watch = Arc::clone(&watch);
        tokio::spawn(async move { watch.run().await })
    };

    shutdown_signal().await;
    info!("Shutdown signal received");

    watch.stop().await;
    runner.await.context("Watch loop task failed")?;

    let status = watch.status().await;
    info!(
        "Converted {} file(s), {} failed, over {} cycle(s)",
        status.files_converted, status.files_failed, status.cycles
    );

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
