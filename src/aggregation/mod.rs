pub mod audio;
pub mod identity;
pub mod vision;
pub mod window;

pub use audio::{AudioAggregator, AudioFeatures, AudioObservation};
pub use identity::{IdentityAggregator, IdentityLabel, IdentityRatios};
pub use vision::{VisionAggregator, VisionObservation, VisionRatios};
pub use window::SlidingWindow;
