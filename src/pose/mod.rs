pub mod detector;
pub mod landmark;
pub mod source;
pub mod synthetic;

pub use detector::PoseEstimator;
pub use landmark::{Landmark, LandmarkIndex, PoseFrame};
pub use source::PoseSource;
