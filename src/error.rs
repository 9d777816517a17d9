use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The three feature-extraction collaborators feeding a fusion cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Vision,
    Identity,
    Audio,
}

impl Modality {
    pub const ALL: [Modality; 3] = [Modality::Vision, Modality::Identity, Modality::Audio];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Vision => "vision",
            Modality::Identity => "identity",
            Modality::Audio => "audio",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a collaborator branch did not produce a usable sub-vector.
///
/// Every variant is recovered by fail-safe substitution inside the
/// orchestrator; none of them reach the caller of the fusion endpoint.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    /// Transport failure or non-success status from the collaborator.
    #[error("{modality} collaborator unavailable: {reason}")]
    Unavailable { modality: Modality, reason: String },

    /// Wrong arity, non-numeric or out-of-range values.
    #[error("{modality} collaborator returned a malformed response: {reason}")]
    Malformed { modality: Modality, reason: String },

    /// Branch exceeded the per-branch deadline.
    #[error("{modality} collaborator timed out after {deadline_ms}ms")]
    Timeout { modality: Modality, deadline_ms: u64 },

    /// The modality's sliding window is still empty.
    #[error("{0} collaborator has no aggregated features yet")]
    NoData(Modality),

    /// The branch task panicked or was cancelled before resolving.
    #[error("{modality} branch task failed: {reason}")]
    TaskFailed { modality: Modality, reason: String },
}

impl CollaboratorError {
    pub fn modality(&self) -> Modality {
        match self {
            CollaboratorError::Unavailable { modality, .. }
            | CollaboratorError::Malformed { modality, .. }
            | CollaboratorError::Timeout { modality, .. }
            | CollaboratorError::TaskFailed { modality, .. } => *modality,
            CollaboratorError::NoData(modality) => *modality,
        }
    }

    /// Short machine-readable tag used in metrics and responses.
    pub fn kind(&self) -> &'static str {
        match self {
            CollaboratorError::Unavailable { .. } => "unavailable",
            CollaboratorError::Malformed { .. } => "malformed",
            CollaboratorError::Timeout { .. } => "timeout",
            CollaboratorError::NoData(_) => "no_data",
            CollaboratorError::TaskFailed { .. } => "task_failed",
        }
    }
}

/// Fatal errors of the fusion core itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FusionError {
    /// A programmer error: a buffer or score escaped its bounds.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;
pub type FusionResult<T> = Result<T, FusionError>;
