use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Modality;
use crate::fusion::{RiskBreakdown, VerdictStatus};
use crate::metrics::{CycleMetrics, MetricsSnapshot};
use crate::orchestrator::ObservationInstant;
use crate::settings::RunMode;

use super::error::{ApiError, ApiResult};
use super::state::AppState;

const ENABLE_LOGS: bool = true;

use crate::log_info;

const FRAME_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub risk_score: u8,
    pub status: VerdictStatus,
    pub message: String,
    pub cycle_id: Uuid,
    pub degraded: Vec<Modality>,
    pub breakdown: RiskBreakdown,
}

/// Run one fusion cycle on an uploaded frame.
pub async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<AnalyzeResponse>> {
    let started = Instant::now();

    let mut frame = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() == Some(FRAME_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            frame = Some(bytes);
            break;
        }
    }
    let frame = frame
        .ok_or_else(|| ApiError::BadRequest(format!("missing multipart field '{FRAME_FIELD}'")))?;

    let cycle_id = Uuid::new_v4();
    let analysis = state
        .orchestrator
        .analyze(ObservationInstant::now(frame))
        .await;
    let outcome = state.engine.evaluate(&analysis.features)?;
    let degraded = analysis.degraded();
    let total_ms = started.elapsed().as_millis() as u64;

    log_info!(
        "cycle {cycle_id}: score={} status={} degraded={:?} ({total_ms}ms)",
        outcome.risk_score,
        outcome.verdict.status,
        degraded
    );

    state
        .metrics
        .record_cycle(CycleMetrics {
            cycle_id,
            timestamp: Utc::now(),
            total_ms,
            risk_score: outcome.risk_score,
            status: outcome.verdict.status,
            degraded: degraded.clone(),
        })
        .await;

    Ok(Json(AnalyzeResponse {
        risk_score: outcome.risk_score,
        status: outcome.verdict.status,
        message: outcome.verdict.message,
        cycle_id,
        degraded,
        breakdown: outcome.breakdown,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerdictResponse {
    pub status: VerdictStatus,
    pub message: String,
    pub history: Vec<u8>,
}

/// Current verdict from history, without dispatching a new cycle.
pub async fn current_verdict(State(state): State<AppState>) -> Json<VerdictResponse> {
    let verdict = state.engine.current_verdict();
    Json(VerdictResponse {
        status: verdict.status,
        message: verdict.message,
        history: state.engine.history(),
    })
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.get_snapshot().await)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub mode: RunMode,
    pub uptime_secs: i64,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        mode: state.mode.clone(),
        uptime_secs: state.uptime_secs(),
    })
}
