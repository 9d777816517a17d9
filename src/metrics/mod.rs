mod types;

pub use types::{CycleMetrics, FailSafeCounts, MetricsSnapshot};

use std::sync::Arc;
use tokio::sync::Mutex;

const MAX_RECENT_CYCLES: usize = 20;

pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

#[derive(Default)]
struct MetricsState {
    recent_cycles: Vec<CycleMetrics>,
    cycle_count: u64,
    degraded_cycle_count: u64,
    fail_safe: FailSafeCounts,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsState {
                recent_cycles: Vec::with_capacity(MAX_RECENT_CYCLES),
                ..Default::default()
            })),
        }
    }

    pub async fn record_cycle(&self, metrics: CycleMetrics) {
        let mut state = self.inner.lock().await;

        state.cycle_count += 1;
        if !metrics.degraded.is_empty() {
            state.degraded_cycle_count += 1;
        }
        for modality in &metrics.degraded {
            state.fail_safe.bump(*modality);
        }

        state.recent_cycles.push(metrics);

        if state.recent_cycles.len() > MAX_RECENT_CYCLES {
            state.recent_cycles.remove(0);
        }
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        let state = self.inner.lock().await;
        MetricsSnapshot {
            recent_cycles: state.recent_cycles.clone(),
            cycle_count: state.cycle_count,
            degraded_cycle_count: state.degraded_cycle_count,
            fail_safe_substitutions: state.fail_safe.clone(),
        }
    }

    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        state.recent_cycles.clear();
        state.cycle_count = 0;
        state.degraded_cycle_count = 0;
        state.fail_safe = FailSafeCounts::default();
    }
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
