//! Cadence Player (cadence-player) - Main entry point
//!
//! Loads a class definition, runs it through the playback engine and serves
//! the HTTP/SSE control API until interrupted.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use cadence_common::events::EventBus;
use cadence_common::ClassDefinition;
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cadence_player::api::{self, AppContext};
use cadence_player::playback::{EngineRuntime, PlaybackEngine};
use cadence_player::telemetry::{
    ChannelSink, DeviceContext, SessionContext, TelemetryClient, TelemetryDispatcher,
};
use cadence_player::PlayerConfig;

/// How long to wait for queued telemetry after shutdown
const TELEMETRY_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Command-line arguments for cadence-player
#[derive(Parser, Debug)]
#[command(name = "cadence-player")]
#[command(about = "Segment playback engine for guided exercise classes")]
#[command(version)]
struct Args {
    /// Class definition (JSON)
    #[arg(short, long, env = "CADENCE_CLASS")]
    class: PathBuf,

    /// Bootstrap configuration file (TOML)
    #[arg(long, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides [server] port)
    #[arg(short, long, env = "CADENCE_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides [server] bind_address)
    #[arg(long, env = "CADENCE_BIND")]
    bind: Option<String>,

    /// Telemetry collector base URL; enables telemetry
    #[arg(long, env = "CADENCE_TELEMETRY_URL")]
    telemetry_url: Option<String>,

    /// User identifier attached to the play session
    #[arg(long, env = "CADENCE_USER_ID")]
    user_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = PlayerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = args.bind.clone() {
        config.server.bind_address = bind;
    }
    if let Some(url) = args.telemetry_url.clone() {
        config.telemetry.endpoint = Some(url);
        config.telemetry.enabled = true;
    }
    config.validate().context("Invalid configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.default_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Cadence Player v{}", env!("CARGO_PKG_VERSION"));

    let class = ClassDefinition::from_path(&args.class)
        .with_context(|| format!("Failed to load class {}", args.class.display()))?;
    info!(
        "Class {}: {} segments",
        class.title.as_deref().unwrap_or("(untitled)"),
        class.segments.len()
    );

    let events = EventBus::new(config.runtime.event_capacity);
    let session = SessionContext {
        user_id: args.user_id.clone(),
        device: DeviceContext {
            client: Some("cadence-player".to_string()),
            ..DeviceContext::default()
        },
    };

    let mut builder = PlaybackEngine::builder(class, config.clone())
        .event_bus(events.clone())
        .session_context(session)
        .on_complete(|| info!("Class complete"))
        .on_exit(|| info!("Class exited by user"));

    let dispatcher = match config.telemetry.active_endpoint() {
        Some(endpoint) => {
            let client = TelemetryClient::new(endpoint, config.telemetry.request_timeout())
                .context("Failed to create telemetry client")?;
            let (sink, rx) = ChannelSink::new(config.telemetry.queue_capacity);
            builder = builder.telemetry_sink(sink);
            info!("Telemetry enabled: {}", endpoint);
            Some(TelemetryDispatcher::new(client, rx).spawn())
        }
        None => {
            info!("Telemetry disabled");
            None
        }
    };

    let engine = builder.build().context("Failed to build playback engine")?;
    let (handle, engine_task) =
        EngineRuntime::spawn(engine, Duration::from_millis(config.runtime.tick_ms))
            .context("Failed to start playback engine")?;

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    let ctx = AppContext {
        engine: handle.clone(),
        events,
    };
    api::run(&config.server, ctx, shutdown)
        .await
        .context("Server error")?;

    info!("Server stopped; tearing down engine");
    handle.shutdown();
    match engine_task.await {
        Ok(snapshot) => info!(
            "Final state: {} at segment {} ({}s played)",
            snapshot.status, snapshot.segment.index, snapshot.play_duration_seconds
        ),
        Err(e) => warn!("Engine task failed: {}", e),
    }

    // The engine (and its sink) is gone; the dispatcher drains what is queued
    if let Some(dispatcher) = dispatcher {
        match tokio::time::timeout(TELEMETRY_DRAIN_TIMEOUT, dispatcher).await {
            Ok(Ok(stats)) => info!(
                "Telemetry drained ({} delivered, {} failed)",
                stats.delivered, stats.failed
            ),
            Ok(Err(e)) => warn!("Telemetry dispatcher failed: {}", e),
            Err(_) => warn!("Telemetry drain timed out"),
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
