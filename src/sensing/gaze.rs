use serde::{Deserialize, Serialize};

const YAW_THRESHOLD_DEG: f64 = 20.0;
const PITCH_THRESHOLD_DEG: f64 = 15.0;

/// Head orientation for one frame, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    pub yaw_deg: f64,
    pub pitch_deg: f64,
}

/// Binary per-frame gaze indicators, `[gaze_off, head_turned]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeIndicators {
    pub gaze_off: f64,
    pub head_turned: f64,
}

impl GazeIndicators {
    /// No face to estimate a pose from is maximal gaze risk.
    pub const FACE_MISSING: Self = Self {
        gaze_off: 1.0,
        head_turned: 1.0,
    };
}

/// Stateless per-frame pose classifier. Windowing, if any, happens
/// downstream in the fusion history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeEvaluator {
    pub yaw_threshold_deg: f64,
    pub pitch_threshold_deg: f64,
}

impl Default for GazeEvaluator {
    fn default() -> Self {
        Self {
            yaw_threshold_deg: YAW_THRESHOLD_DEG,
            pitch_threshold_deg: PITCH_THRESHOLD_DEG,
        }
    }
}

impl GazeEvaluator {
    pub fn evaluate(&self, pose: Option<HeadPose>) -> GazeIndicators {
        let Some(pose) = pose else {
            return GazeIndicators::FACE_MISSING;
        };
        // Non-finite angles come from a degenerate pose solve; treat as off-screen.
        if !pose.yaw_deg.is_finite() || !pose.pitch_deg.is_finite() {
            return GazeIndicators::FACE_MISSING;
        }
        GazeIndicators {
            gaze_off: flag(pose.yaw_deg.abs() > self.yaw_threshold_deg),
            head_turned: flag(pose.pitch_deg.abs() > self.pitch_threshold_deg),
        }
    }
}

fn flag(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(yaw_deg: f64, pitch_deg: f64) -> Option<HeadPose> {
        Some(HeadPose { yaw_deg, pitch_deg })
    }

    #[test]
    fn test_facing_screen() {
        let g = GazeEvaluator::default().evaluate(pose(5.0, -3.0));
        assert_eq!(g, GazeIndicators { gaze_off: 0.0, head_turned: 0.0 });
    }

    #[test]
    fn test_yaw_beyond_threshold_either_side() {
        let eval = GazeEvaluator::default();
        assert_eq!(eval.evaluate(pose(25.0, 0.0)).gaze_off, 1.0);
        assert_eq!(eval.evaluate(pose(-25.0, 0.0)).gaze_off, 1.0);
        assert_eq!(eval.evaluate(pose(20.0, 0.0)).gaze_off, 0.0);
    }

    #[test]
    fn test_pitch_marks_head_turned() {
        let g = GazeEvaluator::default().evaluate(pose(0.0, -16.0));
        assert_eq!(g.gaze_off, 0.0);
        assert_eq!(g.head_turned, 1.0);
    }

    #[test]
    fn test_missing_face_is_max_risk() {
        assert_eq!(
            GazeEvaluator::default().evaluate(None),
            GazeIndicators::FACE_MISSING
        );
    }

    #[test]
    fn test_nan_pose_is_max_risk() {
        let g = GazeEvaluator::default().evaluate(pose(f64::NAN, 0.0));
        assert_eq!(g, GazeIndicators::FACE_MISSING);
    }
}
