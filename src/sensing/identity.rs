use anyhow::{Context, Result};
use image::DynamicImage;

use crate::aggregation::{IdentityAggregator, IdentityLabel};
use crate::fusion::features::IdentityVector;

use super::vision::decode_frame;

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Minimum classifier probability to accept a recognised identity.
pub const RECOGNITION_THRESHOLD: f64 = 0.80;

/// What the face pipeline saw in one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceObservation {
    NoFace,
    /// A face was found; `best` is the top enrolled match, if any.
    Face { best: Option<(String, f64)> },
}

/// Face detection + embedding classifier black box.
pub trait FaceRecognizer: Send {
    fn recognize(&mut self, frame: &DynamicImage) -> Result<FaceObservation>;
}

/// Identity-service side of the pipeline: one frame in, the 3-value
/// identity vector out.
pub struct IdentityProcessor {
    recognizer: Box<dyn FaceRecognizer>,
    threshold: f64,
    aggregator: IdentityAggregator,
}

impl IdentityProcessor {
    pub fn new(recognizer: Box<dyn FaceRecognizer>) -> Self {
        Self {
            recognizer,
            threshold: RECOGNITION_THRESHOLD,
            aggregator: IdentityAggregator::default(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.aggregator = IdentityAggregator::new(window);
        self
    }

    /// Map a face observation onto a history label.
    pub fn label_for(&self, observation: FaceObservation) -> IdentityLabel {
        match observation {
            FaceObservation::NoFace => IdentityLabel::Missing,
            FaceObservation::Face {
                best: Some((name, probability)),
            } if probability > self.threshold => IdentityLabel::Known(name),
            FaceObservation::Face { .. } => IdentityLabel::Unknown,
        }
    }

    /// Undecodable frames fail with [`FrameDecodeError`] without touching history.
    pub fn process_bytes(&mut self, encoded: &[u8]) -> Result<IdentityVector> {
        let frame = decode_frame(encoded)?;
        self.process_frame(&frame)
    }

    pub fn process_frame(&mut self, frame: &DynamicImage) -> Result<IdentityVector> {
        let observation = self
            .recognizer
            .recognize(frame)
            .context("face recognition failed")?;
        let label = self.label_for(observation);
        log_debug!("identity frame labelled {label}");
        self.aggregator.update(label);

        let ratios = self
            .aggregator
            .snapshot()
            .context("identity history empty after update")?;
        Ok(IdentityVector([
            ratios.dominant_ratio,
            ratios.switch_ratio,
            ratios.unknown_ratio,
        ]))
    }
}
