use serde::{Deserialize, Serialize};

use super::window::SlidingWindow;

/// Audio window length in one-second chunks.
pub const AUDIO_WINDOW: usize = 5;
/// Short trailing window ("last 2 seconds") inside the audio window.
pub const AUDIO_SHORT_WINDOW: usize = 2;

/// One classified audio chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioObservation {
    pub is_talking: bool,
    pub voice_confidence: f64,
}

/// Smoothed audio sub-vector: `[talking_2s, talking_5s, confidence_2s]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub talking_ratio_2s: f64,
    pub talking_ratio_5s: f64,
    pub voice_confidence_2s: f64,
}

impl AudioFeatures {
    pub fn to_array(self) -> [f64; 3] {
        [
            self.talking_ratio_2s,
            self.talking_ratio_5s,
            self.voice_confidence_2s,
        ]
    }

    pub fn from_array(values: [f64; 3]) -> Self {
        Self {
            talking_ratio_2s: values[0],
            talking_ratio_5s: values[1],
            voice_confidence_2s: values[2],
        }
    }
}

/// Talking/confidence windows for the audio modality.
///
/// The 2s and 5s talking ratios are two trailing means over the same buffer.
#[derive(Debug, Clone)]
pub struct AudioAggregator {
    talking: SlidingWindow<f64>,
    confidence: SlidingWindow<f64>,
    short_window: usize,
}

impl Default for AudioAggregator {
    fn default() -> Self {
        Self::new(AUDIO_WINDOW, AUDIO_SHORT_WINDOW)
    }
}

impl AudioAggregator {
    pub fn new(window: usize, short_window: usize) -> Self {
        Self {
            talking: SlidingWindow::new(window),
            confidence: SlidingWindow::new(window),
            short_window: short_window.clamp(1, window),
        }
    }

    pub fn update(&mut self, observation: AudioObservation) {
        self.talking
            .push(if observation.is_talking { 1.0 } else { 0.0 });
        self.confidence.push(observation.voice_confidence);
    }

    /// `None` until the first chunk has been classified.
    pub fn snapshot(&self) -> Option<AudioFeatures> {
        Some(AudioFeatures {
            talking_ratio_2s: self.talking.trailing_mean(self.short_window)?,
            talking_ratio_5s: self.talking.mean()?,
            voice_confidence_2s: self.confidence.trailing_mean(self.short_window)?,
        })
    }

    pub fn len(&self) -> usize {
        self.talking.len()
    }

    pub fn is_empty(&self) -> bool {
        self.talking.is_empty()
    }
}
