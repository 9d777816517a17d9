pub mod aggregation;
pub mod collaborators;
pub mod error;
pub mod fusion;
pub mod metrics;
pub mod orchestrator;
pub mod sensing;
pub mod server;
pub mod settings;
pub mod simulation;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};

use collaborators::http::{build_client, HttpClientConfig};
use collaborators::{HttpAudio, HttpIdentity, HttpVision, LocalAudio, LocalIdentity, LocalVision};
use fusion::FusionEngine;
use orchestrator::Orchestrator;
use sensing::{AudioMonitor, ListeningConfig};
use server::{create_router, AppState};
use settings::{FusionSettings, RunMode, SettingsStore};
use simulation::Simulation;

/// Wire the collaborators for the configured mode. In simulate mode the
/// returned monitor owns the background audio loop and must be stopped.
pub fn build_orchestrator(settings: &FusionSettings) -> Result<(Orchestrator, Option<AudioMonitor>)> {
    let deadline = settings.branch_deadline();

    match settings.mode {
        RunMode::Remote => {
            let endpoints = &settings.collaborators;
            let config = HttpClientConfig {
                vision_url: endpoints.vision_url.clone(),
                identity_url: endpoints.identity_url.clone(),
                audio_url: endpoints.audio_url.clone(),
                connect_timeout: Duration::from_millis(endpoints.connect_timeout_ms),
            };
            let client = build_client(&config).context("Failed to build HTTP client")?;
            let orchestrator = Orchestrator::new(
                Arc::new(HttpVision::new(client.clone(), config.vision_url)),
                Arc::new(HttpIdentity::new(client.clone(), config.identity_url)),
                Arc::new(HttpAudio::new(client, config.audio_url)),
            )
            .with_deadline(deadline);
            Ok((orchestrator, None))
        }
        RunMode::Simulate => {
            let sensing = &settings.sensing;
            let simulation = Simulation::default().with_sensing(sensing.clone());
            let mut monitor = AudioMonitor::new(ListeningConfig::default())
                .with_windows(sensing.audio_window, sensing.audio_short_window);
            monitor.start(Box::new(simulation.voice_detector()))?;
            let orchestrator = Orchestrator::new(
                Arc::new(LocalVision::new(simulation.vision_processor())),
                Arc::new(LocalIdentity::new(simulation.identity_processor())),
                Arc::new(LocalAudio::new(monitor.subscribe())),
            )
            .with_deadline(deadline);
            Ok((orchestrator, Some(monitor)))
        }
    }
}

pub async fn run() -> Result<()> {
    utils::logging::init();

    let store = SettingsStore::from_env().context("Failed to load settings")?;
    let settings = store.current();
    info!(
        "proctor-fusion {} starting ({:?} mode, deadline {:?})",
        env!("CARGO_PKG_VERSION"),
        settings.mode,
        settings.branch_deadline()
    );

    let (orchestrator, mut monitor) = build_orchestrator(&settings)?;
    let engine = FusionEngine::new(settings.scoring.clone(), settings.escalation.clone());
    let state = AppState::new(Arc::new(engine), Arc::new(orchestrator), settings.mode.clone());
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind))?;
    info!("listening on {}", settings.bind);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(monitor) = monitor.as_mut() {
        monitor.stop().await?;
    }
    info!("proctor-fusion stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
