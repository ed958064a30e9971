//! Session Controller (arbv-sc) - Main entry point
//!
//! Runs the marker-tracking session controller against the emulated
//! tracking source and media elements, with the HTTP/SSE surface bound on
//! the configured port. Found/lost events are injected via the
//! /tracking/found/:id and /tracking/lost/:id routes.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arbv_common::config::{resolve_config_path, AppConfig};
use arbv_sc::api::{self, AppContext};
use arbv_sc::emulator::{EmulatedMediaElement, EmulatedTrackingSource, PlayPolicy};
use arbv_sc::media::{BindingSet, MediaBinding, MediaElement};
use arbv_sc::registry::TargetRegistry;
use arbv_sc::{Session, SharedState};

/// Command-line arguments for arbv-sc
#[derive(Parser, Debug)]
#[command(name = "arbv-sc")]
#[command(about = "Marker-tracking session controller for the AR book viewer")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5750", env = "ARBV_SC_PORT")]
    port: u16,

    /// Path to the target configuration file
    #[arg(short, long, env = "ARBV_CONFIG")]
    config: Option<String>,

    /// Session locale (defaults to the configured default locale)
    #[arg(short, long, env = "ARBV_LOCALE")]
    locale: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arbv_sc=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), "ARBV_CONFIG");
    info!("Loading target configuration from {}", config_path.display());

    let config = AppConfig::load(&config_path).context("Failed to load target configuration")?;
    let locale = args
        .locale
        .unwrap_or_else(|| config.default_locale.clone());
    info!("Session locale: {}", locale);

    let registry = Arc::new(TargetRegistry::from_config(&config, &locale));
    info!("Loaded {} targets", registry.len());

    // Emulated media elements behind the binding seam; AutoplayGuard gives
    // them platform-shaped play rejection until the unlock handshake runs
    let bindings = registry
        .list()
        .iter()
        .map(|target| {
            let video = target.video_url.as_ref().map(|_| {
                EmulatedMediaElement::new(
                    &format!("video-{}", target.id),
                    PlayPolicy::AutoplayGuard,
                ) as Arc<dyn MediaElement>
            });
            let audio = target.audio_url.as_ref().map(|_| {
                EmulatedMediaElement::new(
                    &format!("audio-{}", target.id),
                    PlayPolicy::AutoplayGuard,
                ) as Arc<dyn MediaElement>
            });
            Arc::new(MediaBinding::new(target.id, video, audio))
        })
        .collect::<Vec<_>>();

    let (tracking, injector) = EmulatedTrackingSource::new();
    let state = Arc::new(SharedState::new());

    let session = Session::start(
        Arc::clone(&registry),
        BindingSet::new(bindings),
        Box::new(tracking),
        state,
    )
    .await
    .context("Failed to start session")?;
    info!("Session controller initialized");

    // Build the application router
    let ctx = AppContext {
        session: session.clone(),
        registry,
        injector: Some(injector),
    };
    let app = api::create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Release the tracking source and media bindings before exit
    session.teardown().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
