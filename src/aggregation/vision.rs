use serde::{Deserialize, Serialize};

use super::window::SlidingWindow;

/// Vision window length in frames.
pub const VISION_WINDOW: usize = 10;

/// Per-frame binary flags derived from object detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisionObservation {
    pub phone_present: bool,
    pub multi_person: bool,
    pub face_missing: bool,
}

/// Smoothed vision ratios over the trailing frame window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisionRatios {
    pub phone_ratio: f64,
    pub multi_person_ratio: f64,
    pub face_missing_ratio: f64,
}

#[derive(Debug, Clone)]
pub struct VisionAggregator {
    phone: SlidingWindow<bool>,
    multi_person: SlidingWindow<bool>,
    face_missing: SlidingWindow<bool>,
}

impl Default for VisionAggregator {
    fn default() -> Self {
        Self::new(VISION_WINDOW)
    }
}

impl VisionAggregator {
    pub fn new(window: usize) -> Self {
        Self {
            phone: SlidingWindow::new(window),
            multi_person: SlidingWindow::new(window),
            face_missing: SlidingWindow::new(window),
        }
    }

    pub fn update(&mut self, observation: VisionObservation) {
        self.phone.push(observation.phone_present);
        self.multi_person.push(observation.multi_person);
        self.face_missing.push(observation.face_missing);
    }

    /// Event counts divided by current occupancy; `None` before the first frame.
    pub fn snapshot(&self) -> Option<VisionRatios> {
        Some(VisionRatios {
            phone_ratio: self.phone.ratio()?,
            multi_person_ratio: self.multi_person.ratio()?,
            face_missing_ratio: self.face_missing.ratio()?,
        })
    }

    pub fn len(&self) -> usize {
        self.phone.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phone.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_none() {
        assert!(VisionAggregator::default().snapshot().is_none());
    }

    #[test]
    fn test_early_ratios_use_occupancy() {
        let mut agg = VisionAggregator::default();
        agg.update(VisionObservation {
            phone_present: true,
            ..Default::default()
        });
        agg.update(VisionObservation::default());
        let r = agg.snapshot().unwrap();
        assert!((r.phone_ratio - 0.5).abs() < 1e-12);
        assert_eq!(r.multi_person_ratio, 0.0);
        assert_eq!(r.face_missing_ratio, 0.0);
    }

    #[test]
    fn test_window_slides_after_ten_frames() {
        let mut agg = VisionAggregator::default();
        agg.update(VisionObservation {
            face_missing: true,
            ..Default::default()
        });
        for _ in 0..VISION_WINDOW {
            agg.update(VisionObservation::default());
        }
        assert_eq!(agg.len(), VISION_WINDOW);
        assert_eq!(agg.snapshot().unwrap().face_missing_ratio, 0.0);
    }

    #[test]
    fn test_each_signal_tracked_independently() {
        let mut agg = VisionAggregator::new(4);
        let frames = [
            (true, false, false),
            (true, true, false),
            (false, true, true),
            (false, false, true),
        ];
        for (phone, multi, missing) in frames {
            agg.update(VisionObservation {
                phone_present: phone,
                multi_person: multi,
                face_missing: missing,
            });
        }
        let r = agg.snapshot().unwrap();
        assert_eq!(r.phone_ratio, 0.5);
        assert_eq!(r.multi_person_ratio, 0.5);
        assert_eq!(r.face_missing_ratio, 0.5);
    }
}
