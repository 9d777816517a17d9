use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::aggregation::AudioFeatures;
use crate::error::{CollaboratorError, CollaboratorResult, Modality};
use crate::fusion::features::{AudioVector, IdentityVector, VisionVector};
use crate::sensing::{FrameDecodeError, IdentityProcessor, VisionProcessor};

use super::{AudioCollaborator, IdentityCollaborator, VisionCollaborator};

fn task_failed(modality: Modality, err: tokio::task::JoinError) -> CollaboratorError {
    CollaboratorError::TaskFailed {
        modality,
        reason: err.to_string(),
    }
}

/// A frame the processor cannot decode is a bad input, not a dead processor.
fn processing_failed(modality: Modality, err: anyhow::Error) -> CollaboratorError {
    if err.downcast_ref::<FrameDecodeError>().is_some() {
        CollaboratorError::Malformed {
            modality,
            reason: err.to_string(),
        }
    } else {
        CollaboratorError::Unavailable {
            modality,
            reason: format!("{err:#}"),
        }
    }
}

/// In-process vision collaborator. Inference runs on the blocking pool.
#[derive(Clone)]
pub struct LocalVision {
    processor: Arc<Mutex<VisionProcessor>>,
}

impl LocalVision {
    pub fn new(processor: VisionProcessor) -> Self {
        Self {
            processor: Arc::new(Mutex::new(processor)),
        }
    }
}

#[async_trait]
impl VisionCollaborator for LocalVision {
    async fn analyze(&self, frame: Bytes) -> CollaboratorResult<VisionVector> {
        let processor = Arc::clone(&self.processor);
        let vector = tokio::task::spawn_blocking(move || processor.lock().process_bytes(&frame))
            .await
            .map_err(|e| task_failed(Modality::Vision, e))?
            .map_err(|e| processing_failed(Modality::Vision, e))?;
        VisionVector::from_values(&vector.0)
    }
}

/// In-process identity collaborator.
#[derive(Clone)]
pub struct LocalIdentity {
    processor: Arc<Mutex<IdentityProcessor>>,
}

impl LocalIdentity {
    pub fn new(processor: IdentityProcessor) -> Self {
        Self {
            processor: Arc::new(Mutex::new(processor)),
        }
    }
}

#[async_trait]
impl IdentityCollaborator for LocalIdentity {
    async fn analyze(&self, frame: Bytes) -> CollaboratorResult<IdentityVector> {
        let processor = Arc::clone(&self.processor);
        let vector = tokio::task::spawn_blocking(move || processor.lock().process_bytes(&frame))
            .await
            .map_err(|e| task_failed(Modality::Identity, e))?
            .map_err(|e| processing_failed(Modality::Identity, e))?;
        IdentityVector::from_values(&vector.0)
    }
}

/// Reads the audio monitor's latest-value cell. Never blocks on the loop.
#[derive(Clone)]
pub struct LocalAudio {
    latest: watch::Receiver<Option<AudioFeatures>>,
}

impl LocalAudio {
    pub fn new(latest: watch::Receiver<Option<AudioFeatures>>) -> Self {
        Self { latest }
    }
}

#[async_trait]
impl AudioCollaborator for LocalAudio {
    async fn latest(&self) -> CollaboratorResult<AudioVector> {
        let features = (*self.latest.borrow()).ok_or(CollaboratorError::NoData(Modality::Audio))?;
        AudioVector::from_values(&features.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensing::gaze::HeadPose;
    use crate::sensing::identity::tests::ScriptedRecognizer;
    use crate::sensing::vision::tests::{png_frame, FixedDetector, FixedPose};
    use crate::sensing::FaceObservation;

    #[tokio::test]
    async fn test_local_vision_runs_processor() {
        let vision = LocalVision::new(VisionProcessor::new(
            Box::new(FixedDetector(vec!["face", "person", "person"])),
            Box::new(FixedPose(Some(HeadPose {
                yaw_deg: 30.0,
                pitch_deg: 0.0,
            }))),
        ));
        let v = vision.analyze(Bytes::from(png_frame())).await.unwrap();
        assert_eq!(v.0, [0.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_local_identity_error_is_unavailable() {
        // empty script: recognizer errors on the first frame
        let identity = LocalIdentity::new(IdentityProcessor::new(Box::new(ScriptedRecognizer(
            Default::default(),
        ))));
        let err = identity.analyze(Bytes::from(png_frame())).await.unwrap_err();
        assert_eq!(err.kind(), "unavailable");
    }

    #[tokio::test]
    async fn test_undecodable_frame_is_malformed() {
        let vision = LocalVision::new(VisionProcessor::new(
            Box::new(FixedDetector(vec!["face"])),
            Box::new(FixedPose(None)),
        ));
        let err = vision.analyze(Bytes::from_static(b"garbage")).await.unwrap_err();
        assert_eq!(err.kind(), "malformed");
        assert_eq!(err.modality(), Modality::Vision);

        let identity = LocalIdentity::new(IdentityProcessor::new(Box::new(ScriptedRecognizer(
            Default::default(),
        ))));
        let err = identity.analyze(Bytes::from_static(b"garbage")).await.unwrap_err();
        assert_eq!(err.kind(), "malformed");
        assert_eq!(err.modality(), Modality::Identity);
    }

    #[tokio::test]
    async fn test_local_identity_labels_face() {
        let identity = LocalIdentity::new(IdentityProcessor::new(Box::new(ScriptedRecognizer(
            vec![FaceObservation::Face {
                best: Some(("alice".into(), 0.97)),
            }]
            .into(),
        ))));
        let v = identity.analyze(Bytes::from(png_frame())).await.unwrap();
        assert_eq!(v.0, [1.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_local_audio_empty_cell_is_no_data() {
        let (_tx, rx) = watch::channel(None);
        let audio = LocalAudio::new(rx);
        assert_eq!(
            audio.latest().await.unwrap_err(),
            CollaboratorError::NoData(Modality::Audio)
        );
    }

    #[tokio::test]
    async fn test_local_audio_reads_latest() {
        let (tx, rx) = watch::channel(None);
        let audio = LocalAudio::new(rx);
        tx.send_replace(Some(AudioFeatures::from_array([0.5, 0.2, 0.4])));
        assert_eq!(audio.latest().await.unwrap().0, [0.5, 0.2, 0.4]);
    }
}
