use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Modality;
use crate::fusion::VerdictStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleMetrics {
    pub cycle_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub total_ms: u64,
    pub risk_score: u8,
    pub status: VerdictStatus,
    pub degraded: Vec<Modality>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FailSafeCounts {
    pub vision: u64,
    pub identity: u64,
    pub audio: u64,
}

impl FailSafeCounts {
    pub fn bump(&mut self, modality: Modality) {
        match modality {
            Modality::Vision => self.vision += 1,
            Modality::Identity => self.identity += 1,
            Modality::Audio => self.audio += 1,
        }
    }

    pub fn get(&self, modality: Modality) -> u64 {
        match modality {
            Modality::Vision => self.vision,
            Modality::Identity => self.identity,
            Modality::Audio => self.audio,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub recent_cycles: Vec<CycleMetrics>,
    pub cycle_count: u64,
    pub degraded_cycle_count: u64,
    pub fail_safe_substitutions: FailSafeCounts,
}
