use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::config::{EscalationConfig, ScoringConfig};
use super::escalation::{EscalationStateMachine, Verdict};
use super::features::CanonicalFeatureVector;
use super::scoring::{RiskBreakdown, RiskScorer};
use crate::error::FusionResult;

/// Result of one fusion cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionOutcome {
    pub risk_score: u8,
    pub verdict: Verdict,
    pub breakdown: RiskBreakdown,
}

struct EngineState {
    escalation: EscalationStateMachine,
    last_features: Option<CanonicalFeatureVector>,
}

/// Scorer plus escalation history, shared across request handlers.
///
/// Thread-safe: the score history is the only mutable state and is guarded
/// by a `parking_lot::Mutex`. Scoring and verdict happen under one lock so
/// concurrent cycles never interleave between append and evaluation.
pub struct FusionEngine {
    scorer: RiskScorer,
    state: Mutex<EngineState>,
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default(), EscalationConfig::default())
    }
}

impl FusionEngine {
    pub fn new(scoring: ScoringConfig, escalation: EscalationConfig) -> Self {
        Self {
            scorer: RiskScorer::new(scoring),
            state: Mutex::new(EngineState {
                escalation: EscalationStateMachine::new(escalation),
                last_features: None,
            }),
        }
    }

    /// Score the vector, append it to history, then derive the verdict.
    pub fn evaluate(&self, features: &CanonicalFeatureVector) -> FusionResult<FusionOutcome> {
        let (risk_score, breakdown) = self.scorer.score_with_breakdown(features);

        let mut state = self.state.lock();
        state.escalation.record(risk_score)?;
        state.last_features = Some(*features);
        let verdict = state.escalation.verdict(features);

        Ok(FusionOutcome {
            risk_score,
            verdict,
            breakdown,
        })
    }

    /// Verdict for the most recent vector without running a new cycle.
    pub fn current_verdict(&self) -> Verdict {
        let state = self.state.lock();
        let features = state
            .last_features
            .unwrap_or_else(CanonicalFeatureVector::baseline);
        state.escalation.verdict(&features)
    }

    /// Copy of the score history, oldest first.
    pub fn history(&self) -> Vec<u8> {
        self.state.lock().escalation.history().copied().collect()
    }

    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }
}
