pub mod config;
pub mod engine;
pub mod escalation;
pub mod features;
pub mod scoring;

pub use config::{EscalationConfig, ScoringConfig};
pub use engine::{FusionEngine, FusionOutcome};
pub use escalation::{EscalationStateMachine, Verdict, VerdictStatus};
pub use features::{AudioVector, CanonicalFeatureVector, IdentityVector, VisionVector};
pub use scoring::{RiskBreakdown, RiskScorer};
