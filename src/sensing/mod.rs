pub mod controller;
pub mod gaze;
pub mod identity;
pub mod loop_worker;
pub mod vision;

pub use controller::AudioMonitor;
pub use gaze::{GazeEvaluator, GazeIndicators, HeadPose};
pub use identity::{FaceObservation, FaceRecognizer, IdentityProcessor};
pub use loop_worker::{ListeningConfig, VoiceActivityDetector};
pub use vision::{
    decode_frame, Detection, FrameDecodeError, HeadPoseEstimator, ObjectDetector, VisionClasses,
    VisionProcessor,
};
