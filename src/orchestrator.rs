//! Fan-out/fan-in over the three collaborators.
//!
//! Every observation instant dispatches the vision, identity and audio
//! branches concurrently, waits for all three to resolve (value, error or
//! deadline), substitutes the fail-safe sub-vector for each failed branch and
//! assembles one [`CanonicalFeatureVector`]. A single branch failure never
//! aborts the cycle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::collaborators::{AudioCollaborator, IdentityCollaborator, VisionCollaborator};
use crate::error::{CollaboratorError, CollaboratorResult, Modality};
use crate::fusion::features::{AudioVector, CanonicalFeatureVector, IdentityVector, VisionVector};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// One discrete time-slice handed to the orchestrator.
#[derive(Debug, Clone)]
pub struct ObservationInstant {
    pub frame: Bytes,
    pub captured_at: DateTime<Utc>,
}

impl ObservationInstant {
    pub fn now(frame: Bytes) -> Self {
        Self {
            frame,
            captured_at: Utc::now(),
        }
    }
}

/// Assembled vector plus the branch failures that were papered over.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub features: CanonicalFeatureVector,
    pub failures: Vec<CollaboratorError>,
}

impl Analysis {
    pub fn degraded(&self) -> Vec<Modality> {
        self.failures.iter().map(CollaboratorError::modality).collect()
    }

    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

pub struct Orchestrator {
    vision: Arc<dyn VisionCollaborator>,
    identity: Arc<dyn IdentityCollaborator>,
    audio: Arc<dyn AudioCollaborator>,
    deadline: Option<Duration>,
}

impl Orchestrator {
    pub fn new(
        vision: Arc<dyn VisionCollaborator>,
        identity: Arc<dyn IdentityCollaborator>,
        audio: Arc<dyn AudioCollaborator>,
    ) -> Self {
        Self {
            vision,
            identity,
            audio,
            deadline: None,
        }
    }

    /// Per-branch deadline. `None` waits on each branch indefinitely.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub async fn analyze(&self, instant: ObservationInstant) -> Analysis {
        let vision = {
            let collaborator = Arc::clone(&self.vision);
            let frame = instant.frame.clone();
            run_branch(Modality::Vision, self.deadline, async move {
                collaborator.analyze(frame).await
            })
        };
        let identity = {
            let collaborator = Arc::clone(&self.identity);
            let frame = instant.frame.clone();
            run_branch(Modality::Identity, self.deadline, async move {
                collaborator.analyze(frame).await
            })
        };
        let audio = {
            let collaborator = Arc::clone(&self.audio);
            run_branch(Modality::Audio, self.deadline, async move {
                collaborator.latest().await
            })
        };

        let (vision, identity, audio) = tokio::join!(vision, identity, audio);

        let mut failures = Vec::new();
        let vision = recover(vision, VisionVector::FAIL_SAFE, &mut failures);
        let identity = recover(identity, IdentityVector::FAIL_SAFE, &mut failures);
        let audio = recover(audio, AudioVector::FAIL_SAFE, &mut failures);

        log_debug!(
            "observation at {} assembled ({} branch failure(s))",
            instant.captured_at,
            failures.len()
        );

        Analysis {
            features: CanonicalFeatureVector::assemble(vision, identity, audio),
            failures,
        }
    }
}

/// Run one branch on its own task so a panic stays inside the branch.
async fn run_branch<T, F>(
    modality: Modality,
    deadline: Option<Duration>,
    branch: F,
) -> CollaboratorResult<T>
where
    T: Send + 'static,
    F: Future<Output = CollaboratorResult<T>> + Send + 'static,
{
    let mut handle = tokio::spawn(branch);

    let joined = match deadline {
        Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                return Err(CollaboratorError::Timeout {
                    modality,
                    deadline_ms: limit.as_millis() as u64,
                });
            }
        },
        None => handle.await,
    };

    joined.map_err(|e| CollaboratorError::TaskFailed {
        modality,
        reason: e.to_string(),
    })?
}

fn recover<T>(
    result: CollaboratorResult<T>,
    fail_safe: T,
    failures: &mut Vec<CollaboratorError>,
) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            log_warn!(
                "{} branch failed ({}): {err}; substituting fail-safe",
                err.modality(),
                err.kind()
            );
            failures.push(err);
            fail_safe
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticVision(CollaboratorResult<VisionVector>);

    #[async_trait]
    impl VisionCollaborator for StaticVision {
        async fn analyze(&self, _frame: Bytes) -> CollaboratorResult<VisionVector> {
            self.0.clone()
        }
    }

    struct StaticIdentity(CollaboratorResult<IdentityVector>);

    #[async_trait]
    impl IdentityCollaborator for StaticIdentity {
        async fn analyze(&self, _frame: Bytes) -> CollaboratorResult<IdentityVector> {
            self.0.clone()
        }
    }

    struct StaticAudio(CollaboratorResult<AudioVector>);

    #[async_trait]
    impl AudioCollaborator for StaticAudio {
        async fn latest(&self) -> CollaboratorResult<AudioVector> {
            self.0.clone()
        }
    }

    struct SlowAudio(Duration);

    #[async_trait]
    impl AudioCollaborator for SlowAudio {
        async fn latest(&self) -> CollaboratorResult<AudioVector> {
            tokio::time::sleep(self.0).await;
            Ok(AudioVector([0.0, 0.0, 0.0]))
        }
    }

    struct PanickingIdentity;

    #[async_trait]
    impl IdentityCollaborator for PanickingIdentity {
        async fn analyze(&self, _frame: Bytes) -> CollaboratorResult<IdentityVector> {
            panic!("classifier blew up")
        }
    }

    struct CountingVision(Arc<AtomicUsize>);

    #[async_trait]
    impl VisionCollaborator for CountingVision {
        async fn analyze(&self, _frame: Bytes) -> CollaboratorResult<VisionVector> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(VisionVector([0.0; 5]))
        }
    }

    fn clean_vision() -> Arc<dyn VisionCollaborator> {
        Arc::new(StaticVision(Ok(VisionVector([0.2, 0.0, 0.0, 0.0, 0.0]))))
    }

    fn clean_identity() -> Arc<dyn IdentityCollaborator> {
        Arc::new(StaticIdentity(Ok(IdentityVector([1.0, 0.0, 0.0]))))
    }

    fn clean_audio() -> Arc<dyn AudioCollaborator> {
        Arc::new(StaticAudio(Ok(AudioVector([0.0, 0.1, 0.3]))))
    }

    fn instant() -> ObservationInstant {
        ObservationInstant::now(Bytes::from_static(b"frame"))
    }

    #[tokio::test]
    async fn test_all_branches_succeed() {
        let orch = Orchestrator::new(clean_vision(), clean_identity(), clean_audio());
        let analysis = orch.analyze(instant()).await;
        assert!(!analysis.is_degraded());
        let f = analysis.features;
        assert_eq!(f.vis_phone, 0.2);
        assert_eq!(f.id_dom, 1.0);
        assert_eq!(f.audio_t5, 0.1);
        assert_eq!(f.audio_conf, 0.3);
    }

    #[tokio::test]
    async fn test_vision_unavailable_gets_fail_safe_only() {
        let vision: Arc<dyn VisionCollaborator> =
            Arc::new(StaticVision(Err(CollaboratorError::Unavailable {
                modality: Modality::Vision,
                reason: "connection refused".into(),
            })));
        let orch = Orchestrator::new(vision, clean_identity(), clean_audio());
        let analysis = orch.analyze(instant()).await;

        assert_eq!(analysis.degraded(), vec![Modality::Vision]);
        assert_eq!(analysis.features.vision(), VisionVector::FAIL_SAFE);
        assert_eq!(analysis.features.identity().0, [1.0, 0.0, 0.0]);
        assert_eq!(analysis.features.audio().0, [0.0, 0.1, 0.3]);
    }

    #[tokio::test]
    async fn test_panicking_branch_is_contained() {
        let orch = Orchestrator::new(clean_vision(), Arc::new(PanickingIdentity), clean_audio());
        let analysis = orch.analyze(instant()).await;
        assert_eq!(analysis.failures.len(), 1);
        assert_eq!(analysis.failures[0].kind(), "task_failed");
        assert_eq!(analysis.features.identity(), IdentityVector::FAIL_SAFE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_substitutes_slow_branch() {
        let orch = Orchestrator::new(
            clean_vision(),
            clean_identity(),
            Arc::new(SlowAudio(Duration::from_secs(30))),
        )
        .with_deadline(Some(Duration::from_millis(500)));

        let analysis = orch.analyze(instant()).await;
        assert_eq!(
            analysis.failures,
            vec![CollaboratorError::Timeout {
                modality: Modality::Audio,
                deadline_ms: 500
            }]
        );
        assert_eq!(analysis.features.audio(), AudioVector::FAIL_SAFE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_deadline_waits() {
        let orch = Orchestrator::new(
            clean_vision(),
            clean_identity(),
            Arc::new(SlowAudio(Duration::from_secs(30))),
        );
        let analysis = orch.analyze(instant()).await;
        assert!(!analysis.is_degraded());
        assert_eq!(analysis.features.audio().0, [0.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_every_branch_failing_is_all_fail_safe() {
        let orch = Orchestrator::new(
            Arc::new(StaticVision(Err(CollaboratorError::NoData(Modality::Vision)))),
            Arc::new(StaticIdentity(Err(CollaboratorError::NoData(Modality::Identity)))),
            Arc::new(StaticAudio(Err(CollaboratorError::NoData(Modality::Audio)))),
        );
        let analysis = orch.analyze(instant()).await;
        assert_eq!(analysis.degraded(), Modality::ALL.to_vec());
        assert_eq!(
            analysis.features,
            CanonicalFeatureVector::assemble(
                VisionVector::FAIL_SAFE,
                IdentityVector::FAIL_SAFE,
                AudioVector::FAIL_SAFE
            )
        );
    }

    #[tokio::test]
    async fn test_each_cycle_dispatches_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let orch = Orchestrator::new(
            Arc::new(CountingVision(Arc::clone(&calls))),
            clean_identity(),
            clean_audio(),
        );
        for _ in 0..3 {
            orch.analyze(instant()).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
