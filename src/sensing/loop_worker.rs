use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::aggregation::{AudioAggregator, AudioFeatures, AudioObservation};

// Set to false to silence the per-chunk audio logs
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Voice-activity probability above which a chunk counts as talking.
pub const TALKING_THRESHOLD: f64 = 0.15;

/// Audio tagging black box. Each call returns the voice-activity
/// probability of every complete chunk captured since the previous call.
pub trait VoiceActivityDetector: Send {
    fn poll_chunks(&mut self) -> Result<Vec<f64>>;
}

pub type SharedDetector = Arc<Mutex<Box<dyn VoiceActivityDetector>>>;

#[derive(Debug, Clone, Copy)]
pub struct ListeningConfig {
    pub tick: Duration,
    pub chunk_timeout: Duration,
    pub talking_threshold: f64,
}

impl Default for ListeningConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            chunk_timeout: Duration::from_secs(5),
            talking_threshold: TALKING_THRESHOLD,
        }
    }
}

/// Classify one chunk's voice activity.
pub fn observe_chunk(voice_activity: f64, threshold: f64) -> AudioObservation {
    AudioObservation {
        is_talking: voice_activity > threshold,
        voice_confidence: voice_activity,
    }
}

/// Background loop owning the audio aggregator.
///
/// The aggregator is never shared: the loop is its only writer and
/// publishes snapshots into the single-slot `latest` cell.
pub async fn listening_loop(
    detector: SharedDetector,
    mut aggregator: AudioAggregator,
    latest: Arc<watch::Sender<Option<AudioFeatures>>>,
    config: ListeningConfig,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(config.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log_info!("audio listening loop started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let fut = process_pending_chunks(&detector, &mut aggregator, &latest, config.talking_threshold);
                match tokio::time::timeout(config.chunk_timeout, fut).await {
                    Ok(Ok(0)) => {},
                    Ok(Ok(n)) => log_debug!("processed {n} audio chunk(s)"),
                    Ok(Err(err)) => log_warn!("audio chunk processing failed: {err:?}"),
                    Err(_) => log_warn!("audio chunk processing timeout (> {:?})", config.chunk_timeout),
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("audio listening loop shutting down");
                break;
            }
        }
    }
}

async fn process_pending_chunks(
    detector: &SharedDetector,
    aggregator: &mut AudioAggregator,
    latest: &watch::Sender<Option<AudioFeatures>>,
    threshold: f64,
) -> Result<usize> {
    let chunks = tokio::task::spawn_blocking({
        let detector = Arc::clone(detector);
        move || detector.lock().poll_chunks()
    })
    .await
    .context("voice activity worker join failed")??;

    for voice_activity in &chunks {
        if !voice_activity.is_finite() {
            log_warn!("dropping non-finite voice activity {voice_activity}");
            continue;
        }
        aggregator.update(observe_chunk(*voice_activity, threshold));
    }

    if let Some(features) = aggregator.snapshot() {
        latest.send_replace(Some(features));
        log_debug!("audio features updated: {:?}", features.to_array());
    }

    Ok(chunks.len())
}
