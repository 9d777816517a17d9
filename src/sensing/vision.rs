use anyhow::{Context, Result};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregation::{VisionAggregator, VisionObservation};
use crate::fusion::features::VisionVector;

use super::gaze::{GazeEvaluator, HeadPose};

/// The uploaded bytes are not an image the `image` crate can read.
#[derive(Error, Debug)]
#[error("frame could not be decoded: {0}")]
pub struct FrameDecodeError(#[from] pub image::ImageError);

pub fn decode_frame(encoded: &[u8]) -> Result<DynamicImage, FrameDecodeError> {
    Ok(image::load_from_memory(encoded)?)
}

/// One labelled box from the object detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: String,
    pub confidence: f32,
}

impl Detection {
    pub fn new(class: impl Into<String>, confidence: f32) -> Self {
        Self {
            class: class.into(),
            confidence,
        }
    }
}

/// Object/face detector black box.
pub trait ObjectDetector: Send {
    fn detect(&mut self, frame: &DynamicImage) -> Result<Vec<Detection>>;
}

/// Head-pose estimator black box. `None` when no face landmarks were found.
pub trait HeadPoseEstimator: Send {
    fn estimate(&mut self, frame: &DynamicImage) -> Result<Option<HeadPose>>;
}

/// Detector class names mapped onto the three vision signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionClasses {
    pub phone: String,
    pub person: String,
    pub face: String,
}

impl Default for VisionClasses {
    fn default() -> Self {
        Self {
            phone: "prohibited_device".into(),
            person: "person".into(),
            face: "face".into(),
        }
    }
}

impl VisionClasses {
    pub fn observe(&self, detections: &[Detection]) -> VisionObservation {
        let persons = detections.iter().filter(|d| d.class == self.person).count();
        VisionObservation {
            phone_present: detections.iter().any(|d| d.class == self.phone),
            multi_person: persons >= 2,
            face_missing: !detections.iter().any(|d| d.class == self.face),
        }
    }
}

/// Vision-service side of the pipeline: detections and pose for one frame
/// in, the 5-value vision vector out.
pub struct VisionProcessor {
    detector: Box<dyn ObjectDetector>,
    pose: Box<dyn HeadPoseEstimator>,
    classes: VisionClasses,
    gaze: GazeEvaluator,
    aggregator: VisionAggregator,
}

impl VisionProcessor {
    pub fn new(detector: Box<dyn ObjectDetector>, pose: Box<dyn HeadPoseEstimator>) -> Self {
        Self {
            detector,
            pose,
            classes: VisionClasses::default(),
            gaze: GazeEvaluator::default(),
            aggregator: VisionAggregator::default(),
        }
    }

    pub fn with_classes(mut self, classes: VisionClasses) -> Self {
        self.classes = classes;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.aggregator = VisionAggregator::new(window);
        self
    }

    /// Decode an encoded frame and process it. An undecodable frame fails
    /// with [`FrameDecodeError`] and leaves the window untouched.
    pub fn process_bytes(&mut self, encoded: &[u8]) -> Result<VisionVector> {
        let frame = decode_frame(encoded)?;
        self.process_frame(&frame)
    }

    pub fn process_frame(&mut self, frame: &DynamicImage) -> Result<VisionVector> {
        let detections = self
            .detector
            .detect(frame)
            .context("object detection failed")?;
        let pose = self
            .pose
            .estimate(frame)
            .context("head pose estimation failed")?;

        self.aggregator.update(self.classes.observe(&detections));
        let ratios = self
            .aggregator
            .snapshot()
            .context("vision window empty after update")?;
        let gaze = self.gaze.evaluate(pose);

        Ok(VisionVector([
            ratios.phone_ratio,
            ratios.multi_person_ratio,
            ratios.face_missing_ratio,
            gaze.gaze_off,
            gaze.head_turned,
        ]))
    }
}
