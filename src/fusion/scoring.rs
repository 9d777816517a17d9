use serde::{Deserialize, Serialize};

use super::config::ScoringConfig;
use super::features::CanonicalFeatureVector;

/// Per-category risk terms before weighting, each in [0, 1] for valid input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub phone: f64,
    pub identity: f64,
    pub gaze: f64,
    pub audio: f64,
    pub presence: f64,
}

/// Pure mapping from a canonical feature vector to an integer risk score.
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Risk score in [0, 100].
    pub fn score(&self, features: &CanonicalFeatureVector) -> u8 {
        let breakdown = breakdown(features);
        to_score(self.weighted_sum(&breakdown))
    }

    /// Score together with the per-category terms that produced it.
    pub fn score_with_breakdown(&self, features: &CanonicalFeatureVector) -> (u8, RiskBreakdown) {
        let breakdown = breakdown(features);
        (to_score(self.weighted_sum(&breakdown)), breakdown)
    }

    fn weighted_sum(&self, b: &RiskBreakdown) -> f64 {
        self.config.weight_phone * b.phone
            + self.config.weight_identity * b.identity
            + self.config.weight_gaze * b.gaze
            + self.config.weight_audio * b.audio
            + self.config.weight_presence * b.presence
    }
}

/// Combined identity risk, capped at 1.0 so the three terms cannot dominate.
pub fn identity_risk(features: &CanonicalFeatureVector) -> f64 {
    ((1.0 - features.id_dom) + features.id_switch + features.id_unkn).min(1.0)
}

/// Correlated indicators of the same risk take the worse one, never the sum.
pub fn breakdown(features: &CanonicalFeatureVector) -> RiskBreakdown {
    RiskBreakdown {
        phone: features.vis_phone,
        identity: identity_risk(features),
        gaze: features.gaze_off.max(features.gaze_turn),
        audio: features.audio_t2.max(features.audio_t5),
        presence: features.vis_multi.max(features.vis_miss),
    }
}

/// Scale to percent, clip to [0, 100], truncate.
fn to_score(weighted: f64) -> u8 {
    let pct = weighted * 100.0;
    if pct.is_nan() {
        log::warn!("risk score is NaN, clipping to 100");
        return 100;
    }
    pct.clamp(0.0, 100.0) as u8
}
