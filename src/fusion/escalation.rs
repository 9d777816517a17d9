use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::EscalationConfig;
use super::features::CanonicalFeatureVector;
use crate::aggregation::SlidingWindow;
use crate::error::{FusionError, FusionResult};

/// Escalation tiers, ordered by severity.
///
/// `Critical` and `AutoFail` are instant overrides that bypass the
/// history-averaged ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictStatus {
    Clean,
    Suspicious,
    HighRisk,
    Violation,
    Critical,
    AutoFail,
}

impl VerdictStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictStatus::Clean => "CLEAN",
            VerdictStatus::Suspicious => "SUSPICIOUS",
            VerdictStatus::HighRisk => "HIGH_RISK",
            VerdictStatus::Violation => "VIOLATION",
            VerdictStatus::Critical => "CRITICAL",
            VerdictStatus::AutoFail => "AUTO_FAIL",
        }
    }

    /// Fixed human-readable reason for each tier.
    pub fn reason(&self) -> &'static str {
        match self {
            VerdictStatus::Clean => "",
            VerdictStatus::Suspicious => "Inconsistent focus",
            VerdictStatus::HighRisk => "Multiple minor flags raised",
            VerdictStatus::Violation => "Sustained suspicious behavior",
            VerdictStatus::Critical => "Multiple People",
            VerdictStatus::AutoFail => "Identity Mismatch",
        }
    }

    pub fn is_override(&self) -> bool {
        matches!(self, VerdictStatus::Critical | VerdictStatus::AutoFail)
    }
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub message: String,
}

impl Verdict {
    fn of(status: VerdictStatus) -> Self {
        Self {
            status,
            message: status.reason().to_string(),
        }
    }
}

/// Rolling score history plus the override/tier rules evaluated over it.
///
/// There is no mode variable: every verdict is recomputed from the
/// current history, so risk that subsides de-escalates on its own.
#[derive(Debug, Clone)]
pub struct EscalationStateMachine {
    config: EscalationConfig,
    history: SlidingWindow<u8>,
}

impl Default for EscalationStateMachine {
    fn default() -> Self {
        Self::new(EscalationConfig::default())
    }
}

impl EscalationStateMachine {
    pub fn new(config: EscalationConfig) -> Self {
        // validate() rejects a zero capacity; clamp so an unvalidated config cannot panic
        let history = SlidingWindow::new(config.history_capacity.max(1));
        Self { config, history }
    }

    /// Append a score, evicting the oldest once the history is full.
    pub fn record(&mut self, score: u8) -> FusionResult<()> {
        if score > 100 {
            return Err(FusionError::InvariantViolation(format!(
                "risk score {score} outside [0, 100]"
            )));
        }
        self.history.push(score);
        Ok(())
    }

    /// Evaluate overrides first, then the history average.
    pub fn verdict(&self, features: &CanonicalFeatureVector) -> Verdict {
        if features.id_unkn > self.config.auto_fail_unknown_ratio {
            return Verdict::of(VerdictStatus::AutoFail);
        }
        if features.vis_multi > self.config.critical_multi_person_ratio {
            return Verdict::of(VerdictStatus::Critical);
        }
        Verdict::of(self.history_tier())
    }

    /// Tier from the averaged history alone, ignoring overrides.
    pub fn history_tier(&self) -> VerdictStatus {
        let Some(avg) = self.average() else {
            return VerdictStatus::Clean;
        };
        if avg > self.config.violation_avg {
            VerdictStatus::Violation
        } else if avg > self.config.high_risk_avg {
            VerdictStatus::HighRisk
        } else if avg > self.config.suspicious_avg {
            VerdictStatus::Suspicious
        } else {
            VerdictStatus::Clean
        }
    }

    pub fn average(&self) -> Option<f64> {
        if self.history.is_empty() {
            return None;
        }
        let sum: u32 = self.history.iter().map(|s| u32::from(*s)).sum();
        Some(f64::from(sum) / self.history.len() as f64)
    }

    pub fn history(&self) -> impl ExactSizeIterator<Item = &u8> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn machine_with(scores: &[u8]) -> EscalationStateMachine {
        let mut m = EscalationStateMachine::default();
        for s in scores {
            m.record(*s).unwrap();
        }
        m
    }

    #[test]
    fn test_empty_history_is_clean() {
        let m = EscalationStateMachine::default();
        let v = m.verdict(&CanonicalFeatureVector::baseline());
        assert_eq!(v.status, VerdictStatus::Clean);
        assert_eq!(v.message, "");
    }

    #[test]
    fn test_tiers_by_average() {
        let baseline = CanonicalFeatureVector::baseline();
        assert_eq!(machine_with(&[90, 85]).verdict(&baseline).status, VerdictStatus::Violation);
        assert_eq!(machine_with(&[60, 60]).verdict(&baseline).status, VerdictStatus::HighRisk);
        assert_eq!(machine_with(&[30, 30]).verdict(&baseline).status, VerdictStatus::Suspicious);
        assert_eq!(machine_with(&[25, 25]).verdict(&baseline).status, VerdictStatus::Clean);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let baseline = CanonicalFeatureVector::baseline();
        assert_eq!(machine_with(&[80]).verdict(&baseline).status, VerdictStatus::HighRisk);
        assert_eq!(machine_with(&[50]).verdict(&baseline).status, VerdictStatus::Suspicious);
        assert_eq!(machine_with(&[81]).verdict(&baseline).status, VerdictStatus::Violation);
    }

    #[test]
    fn test_reasons() {
        let baseline = CanonicalFeatureVector::baseline();
        assert_eq!(
            machine_with(&[100]).verdict(&baseline).message,
            "Sustained suspicious behavior"
        );
        assert_eq!(
            machine_with(&[60]).verdict(&baseline).message,
            "Multiple minor flags raised"
        );
        assert_eq!(machine_with(&[30]).verdict(&baseline).message, "Inconsistent focus");
    }

    #[test]
    fn test_auto_fail_overrides_clean_history() {
        let m = machine_with(&[0, 0, 0]);
        let v = m.verdict(&CanonicalFeatureVector {
            id_unkn: 0.9,
            ..CanonicalFeatureVector::baseline()
        });
        assert_eq!(v.status, VerdictStatus::AutoFail);
        assert_eq!(v.message, "Identity Mismatch");
    }

    #[test]
    fn test_auto_fail_beats_critical() {
        let m = machine_with(&[100; 10]);
        let v = m.verdict(&CanonicalFeatureVector {
            id_unkn: 0.81,
            vis_multi: 1.0,
            ..CanonicalFeatureVector::baseline()
        });
        assert_eq!(v.status, VerdictStatus::AutoFail);
    }

    #[test]
    fn test_critical_overrides_history() {
        let m = machine_with(&[100; 10]);
        let v = m.verdict(&CanonicalFeatureVector {
            vis_multi: 0.6,
            ..CanonicalFeatureVector::baseline()
        });
        assert_eq!(v.status, VerdictStatus::Critical);
        assert_eq!(v.message, "Multiple People");
    }

    #[test]
    fn test_override_thresholds_are_strict() {
        let m = EscalationStateMachine::default();
        let v = m.verdict(&CanonicalFeatureVector {
            id_unkn: 0.8,
            vis_multi: 0.5,
            ..CanonicalFeatureVector::baseline()
        });
        assert_eq!(v.status, VerdictStatus::Clean);
    }

    #[test]
    fn test_history_slides_and_self_corrects() {
        let mut m = machine_with(&[100; 10]);
        assert_eq!(m.history_tier(), VerdictStatus::Violation);
        for _ in 0..10 {
            m.record(0).unwrap();
        }
        assert_eq!(m.history_len(), 10);
        assert_eq!(m.history_tier(), VerdictStatus::Clean);
    }

    #[test]
    fn test_history_keeps_newest_scores_at_capacity() {
        let mut m = EscalationStateMachine::new(EscalationConfig {
            history_capacity: 3,
            ..Default::default()
        });
        for s in [10, 20, 30, 40] {
            m.record(s).unwrap();
        }
        let kept: Vec<u8> = m.history().copied().collect();
        assert_eq!(kept, vec![20, 30, 40]);
        assert_eq!(m.average(), Some(30.0));
    }

    #[test]
    fn test_zero_capacity_holds_one_score() {
        let mut m = EscalationStateMachine::new(EscalationConfig {
            history_capacity: 0,
            ..Default::default()
        });
        m.record(90).unwrap();
        m.record(10).unwrap();
        assert_eq!(m.history().copied().collect::<Vec<_>>(), vec![10]);
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        let mut m = EscalationStateMachine::default();
        assert!(matches!(
            m.record(101),
            Err(FusionError::InvariantViolation(_))
        ));
        assert_eq!(m.history_len(), 0);
    }

    #[test]
    fn test_severity_order() {
        assert!(VerdictStatus::Clean < VerdictStatus::Suspicious);
        assert!(VerdictStatus::Violation < VerdictStatus::Critical);
        assert!(VerdictStatus::Critical < VerdictStatus::AutoFail);
        assert!(VerdictStatus::AutoFail.is_override());
        assert!(!VerdictStatus::Violation.is_override());
    }

    #[test]
    fn test_status_serializes_as_tag() {
        let json = serde_json::to_string(&VerdictStatus::HighRisk).unwrap();
        assert_eq!(json, "\"HIGH_RISK\"");
        assert_eq!(VerdictStatus::AutoFail.to_string(), "AUTO_FAIL");
    }

    proptest! {
        #[test]
        fn prop_tier_depends_only_on_multiset(
            scores in prop::collection::vec(0u8..=100, 10),
        ) {
            let forward = machine_with(&scores);
            let mut reversed_scores = scores.clone();
            reversed_scores.reverse();
            let reversed = machine_with(&reversed_scores);
            let mut sorted_scores = scores.clone();
            sorted_scores.sort_unstable();
            let sorted = machine_with(&sorted_scores);
            prop_assert_eq!(forward.history_tier(), reversed.history_tier());
            prop_assert_eq!(forward.history_tier(), sorted.history_tier());
        }
    }
}
