//! booth-kiosk - photo-booth session service
//!
//! Startup order: configuration, storage directories, watchers, initial scan,
//! then the HTTP server. The registry is rebuilt from disk on every start.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use booth_common::config::{load_toml_config, LoadedConfig};
use booth_common::StorageLayout;
use booth_kiosk::config::{CliOverrides, KioskConfig};
use booth_kiosk::qr::{PngQrEncoder, QrService};
use booth_kiosk::reconciler::Reconciler;
use booth_kiosk::registry::SessionRegistry;
use booth_kiosk::{build_router, AppState};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for booth-kiosk
#[derive(Parser, Debug)]
#[command(name = "booth-kiosk")]
#[command(about = "Photo-booth kiosk session service")]
#[command(version)]
struct Args {
    /// Root folder holding photos/, output/ and qr_codes/
    #[arg(short, long, env = "BOOTH_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "BOOTH_PORT")]
    port: Option<u16>,

    /// Public URL prefix encoded into QR codes
    #[arg(long, env = "BOOTH_BASE_URL")]
    base_url: Option<String>,

    /// TOML config file
    #[arg(short, long, env = "BOOTH_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Read before tracing is up so the file's log level can apply
    let LoadedConfig {
        config: toml_config,
        source: config_source,
    } = load_toml_config(args.config.as_deref())?;

    let default_filter = format!(
        "booth_kiosk={level},booth_common={level},tower_http={level}",
        level = toml_config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting booth-kiosk v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config_source.log();

    let cli = CliOverrides {
        root_folder: args.root_folder,
        port: args.port,
        base_url: args.base_url,
    };
    let config = KioskConfig::resolve(&cli, &toml_config);
    info!("Root folder: {}", config.root_folder.display());
    info!("Public base URL: {}", config.base_url);
    if config.admin_password().is_none() {
        warn!("No admin password configured; admin endpoints are disabled");
    }

    let layout = Arc::new(StorageLayout::new(&config.root_folder));
    layout
        .ensure_directories()
        .context("Failed to create storage directories")?;

    let registry = SessionRegistry::new(config.base_url.clone()).shared();
    let qr = QrService::new(Arc::new(PngQrEncoder), Arc::clone(&layout));
    let reconciler = Reconciler::new(registry.clone(), Arc::clone(&layout), qr.clone());

    let (_watchers, _scan) = reconciler
        .start()
        .await
        .context("Failed to start filesystem watchers")?;

    let state = AppState::new(registry, layout, qr, config.admin_password());
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
