//! Synthetic in-process collaborators for demos and smoke tests.
//!
//! Every detector draws from a seeded `StdRng`, so a fixed seed replays the
//! same session.

use anyhow::Result;
use image::DynamicImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::sensing::{
    Detection, FaceObservation, FaceRecognizer, HeadPose, HeadPoseEstimator, IdentityProcessor,
    ObjectDetector, VisionClasses, VisionProcessor, VoiceActivityDetector,
};
use crate::settings::SensingSettings;

/// Per-frame event probabilities of the simulated candidate.
#[derive(Debug, Clone, Copy)]
pub struct SimulationProfile {
    pub phone: f64,
    pub second_person: f64,
    pub face_missing: f64,
    pub look_away: f64,
    pub impostor: f64,
    pub talking: f64,
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self {
            phone: 0.05,
            second_person: 0.03,
            face_missing: 0.05,
            look_away: 0.15,
            impostor: 0.02,
            talking: 0.10,
        }
    }
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

pub struct SyntheticDetector {
    rng: StdRng,
    profile: SimulationProfile,
    classes: VisionClasses,
}

impl ObjectDetector for SyntheticDetector {
    fn detect(&mut self, _frame: &DynamicImage) -> Result<Vec<Detection>> {
        let mut detections = vec![Detection::new(
            self.classes.person.clone(),
            self.rng.gen_range(0.7..1.0),
        )];
        if !self.rng.gen_bool(self.profile.face_missing) {
            detections.push(Detection::new(
                self.classes.face.clone(),
                self.rng.gen_range(0.6..1.0),
            ));
        }
        if self.rng.gen_bool(self.profile.second_person) {
            detections.push(Detection::new(self.classes.person.clone(), 0.8));
        }
        if self.rng.gen_bool(self.profile.phone) {
            detections.push(Detection::new(self.classes.phone.clone(), 0.75));
        }
        Ok(detections)
    }
}

pub struct SyntheticPose {
    rng: StdRng,
    profile: SimulationProfile,
}

impl HeadPoseEstimator for SyntheticPose {
    fn estimate(&mut self, _frame: &DynamicImage) -> Result<Option<HeadPose>> {
        if self.rng.gen_bool(self.profile.face_missing) {
            return Ok(None);
        }
        let spread = if self.rng.gen_bool(self.profile.look_away) {
            45.0
        } else {
            10.0
        };
        Ok(Some(HeadPose {
            yaw_deg: self.rng.gen_range(-spread..spread),
            pitch_deg: self.rng.gen_range(-spread..spread) * 0.6,
        }))
    }
}

pub struct SyntheticRecognizer {
    rng: StdRng,
    profile: SimulationProfile,
    candidate: String,
}

impl FaceRecognizer for SyntheticRecognizer {
    fn recognize(&mut self, _frame: &DynamicImage) -> Result<FaceObservation> {
        if self.rng.gen_bool(self.profile.face_missing) {
            return Ok(FaceObservation::NoFace);
        }
        let best = if self.rng.gen_bool(self.profile.impostor) {
            ("impostor".to_string(), self.rng.gen_range(0.3..0.8))
        } else {
            (self.candidate.clone(), self.rng.gen_range(0.82..1.0))
        };
        Ok(FaceObservation::Face { best: Some(best) })
    }
}

/// Emits one chunk per poll.
pub struct SyntheticVoice {
    rng: StdRng,
    profile: SimulationProfile,
}

impl VoiceActivityDetector for SyntheticVoice {
    fn poll_chunks(&mut self) -> Result<Vec<f64>> {
        let activity = if self.rng.gen_bool(self.profile.talking) {
            self.rng.gen_range(0.3..0.95)
        } else {
            self.rng.gen_range(0.0..0.1)
        };
        Ok(vec![activity])
    }
}

/// Builds the synthetic detectors. Each gets its own stream derived from
/// `seed` so modalities do not mirror each other.
pub struct Simulation {
    profile: SimulationProfile,
    seed: Option<u64>,
    sensing: SensingSettings,
}

impl Simulation {
    pub fn new(profile: SimulationProfile, seed: Option<u64>) -> Self {
        Self {
            profile,
            seed,
            sensing: SensingSettings::default(),
        }
    }

    /// Windows, threshold and class names for the processors built here.
    pub fn with_sensing(mut self, sensing: SensingSettings) -> Self {
        self.sensing = sensing;
        self
    }

    fn stream(&self, offset: u64) -> StdRng {
        rng_for(self.seed.map(|s| s.wrapping_add(offset)))
    }

    pub fn vision_processor(&self) -> VisionProcessor {
        VisionProcessor::new(
            Box::new(SyntheticDetector {
                rng: self.stream(1),
                profile: self.profile,
                classes: self.sensing.classes.clone(),
            }),
            Box::new(SyntheticPose {
                rng: self.stream(2),
                profile: self.profile,
            }),
        )
        .with_classes(self.sensing.classes.clone())
        .with_window(self.sensing.vision_window)
    }

    pub fn identity_processor(&self) -> IdentityProcessor {
        IdentityProcessor::new(Box::new(SyntheticRecognizer {
            rng: self.stream(3),
            profile: self.profile,
            candidate: "candidate".into(),
        }))
        .with_threshold(self.sensing.recognition_threshold)
        .with_window(self.sensing.identity_window)
    }

    pub fn voice_detector(&self) -> SyntheticVoice {
        SyntheticVoice {
            rng: self.stream(4),
            profile: self.profile,
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimulationProfile::default(), None)
    }
}
