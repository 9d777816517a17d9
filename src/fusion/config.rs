use serde::{Deserialize, Serialize};

use crate::error::{FusionError, FusionResult};

/// Category weights of the risk scorer. Must sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weight_phone: f64,
    pub weight_identity: f64,
    pub weight_gaze: f64,
    pub weight_audio: f64,
    pub weight_presence: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weight_phone: 0.35,
            weight_identity: 0.25,
            weight_gaze: 0.15,
            weight_audio: 0.15,
            weight_presence: 0.10,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> FusionResult<()> {
        let weights = [
            ("weight_phone", self.weight_phone),
            ("weight_identity", self.weight_identity),
            ("weight_gaze", self.weight_gaze),
            ("weight_audio", self.weight_audio),
            ("weight_presence", self.weight_presence),
        ];
        for (name, w) in weights {
            if !w.is_finite() || !(0.0..=1.0).contains(&w) {
                return Err(FusionError::Config(format!(
                    "{name} must be in [0, 1], got {w}"
                )));
            }
        }
        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(FusionError::Config(format!(
                "scoring weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

/// Override triggers, tier thresholds and history length of the escalation machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Scores kept for the rolling average.
    pub history_capacity: usize,
    /// `id_unkn` above this is an instant AUTO_FAIL.
    pub auto_fail_unknown_ratio: f64,
    /// `vis_multi` above this is an instant CRITICAL.
    pub critical_multi_person_ratio: f64,
    pub violation_avg: f64,
    pub high_risk_avg: f64,
    pub suspicious_avg: f64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            auto_fail_unknown_ratio: 0.8,
            critical_multi_person_ratio: 0.5,
            violation_avg: 80.0,
            high_risk_avg: 50.0,
            suspicious_avg: 25.0,
        }
    }
}

impl EscalationConfig {
    pub fn validate(&self) -> FusionResult<()> {
        if self.history_capacity < 1 {
            return Err(FusionError::Config(format!(
                "history_capacity must be >= 1, got {}",
                self.history_capacity
            )));
        }
        for (name, v) in [
            ("auto_fail_unknown_ratio", self.auto_fail_unknown_ratio),
            ("critical_multi_person_ratio", self.critical_multi_person_ratio),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(FusionError::Config(format!(
                    "{name} must be in [0, 1], got {v}"
                )));
            }
        }
        if !(0.0 <= self.suspicious_avg
            && self.suspicious_avg < self.high_risk_avg
            && self.high_risk_avg < self.violation_avg
            && self.violation_avg <= 100.0)
        {
            return Err(FusionError::Config(format!(
                "tier thresholds must satisfy 0 <= suspicious < high_risk < violation <= 100, got {} / {} / {}",
                self.suspicious_avg, self.high_risk_avg, self.violation_avg
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(ScoringConfig::default().validate().is_ok());
        assert!(EscalationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let config = ScoringConfig {
            weight_phone: 0.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(FusionError::Config(_))));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let config = ScoringConfig {
            weight_phone: -0.1,
            weight_identity: 0.70,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unordered_tiers_rejected() {
        let config = EscalationConfig {
            high_risk_avg: 90.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_history_rejected() {
        let config = EscalationConfig {
            history_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EscalationConfig =
            serde_json::from_str(r#"{"history_capacity": 20}"#).unwrap();
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.violation_avg, 80.0);
    }
}
