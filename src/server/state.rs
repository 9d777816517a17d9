use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::fusion::FusionEngine;
use crate::metrics::MetricsCollector;
use crate::orchestrator::Orchestrator;
use crate::settings::RunMode;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FusionEngine>,
    pub orchestrator: Arc<Orchestrator>,
    pub metrics: MetricsCollector,
    pub mode: RunMode,
    pub version: String,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(engine: Arc<FusionEngine>, orchestrator: Arc<Orchestrator>, mode: RunMode) -> Self {
        Self {
            engine,
            orchestrator,
            metrics: MetricsCollector::new(),
            mode,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
