//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the analysis core and external
//! services, encoders and collaborators.

mod assessment_provider;
mod face_detector;
mod image_codec;
mod progress;
mod result_output;

pub use assessment_provider::AssessmentProvider;
pub use face_detector::FaceDetector;
pub use image_codec::ImageCodec;
pub use progress::{ProgressEvent, ProgressSink};
pub use result_output::{HistoryStore, ResultOutput};
