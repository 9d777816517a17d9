//! Feature-extraction collaborators.
//!
//! Each collaborator turns one observation instant into its fixed-arity
//! sub-vector. They are black boxes to the orchestrator: it only sees the
//! traits below and a [`CollaboratorError`] when a branch cannot deliver.

pub mod http;
pub mod local;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::CollaboratorResult;
use crate::fusion::features::{AudioVector, IdentityVector, VisionVector};

pub use http::{HttpAudio, HttpClientConfig, HttpIdentity, HttpVision};
pub use local::{LocalAudio, LocalIdentity, LocalVision};

#[async_trait]
pub trait VisionCollaborator: Send + Sync {
    async fn analyze(&self, frame: Bytes) -> CollaboratorResult<VisionVector>;
}

#[async_trait]
pub trait IdentityCollaborator: Send + Sync {
    async fn analyze(&self, frame: Bytes) -> CollaboratorResult<IdentityVector>;
}

/// Audio is polled, not pushed a frame: it reports its latest smoothed state.
#[async_trait]
pub trait AudioCollaborator: Send + Sync {
    async fn latest(&self) -> CollaboratorResult<AudioVector>;
}
