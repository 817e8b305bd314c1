//! Test support utilities for glow-score.
//!
//! Provides mocks for every port, detection builders and synthetic photos for
//! testing the analysis pipeline.
//!
//! # Example
//!
//! ```
//! use glow_test_support::{DetectionBuilder, MockFaceDetector, ScriptedProvider};
//!
//! let detector = MockFaceDetector::new().with_face(DetectionBuilder::front().build());
//! let provider = ScriptedProvider::new("primary").then_status(500).then_text("{}");
//! ```

mod builders;
mod mocks;

pub use builders::{assessment_json, DetectionBuilder, SyntheticImageBuilder};
pub use mocks::{
    MockFaceDetector, MockHistoryStore, MockImageCodec, MockProgressSink, MockResultOutput,
    ScriptedProvider,
};
