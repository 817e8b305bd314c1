//! Glow Score Core - Domain logic and the facial analysis pipeline
//!
//! This crate contains the domain types, the ports to external services, the
//! pipeline stages (validation gate, request builder, generative client,
//! response sanitizer, deterministic fallback, score synthesis) and the
//! orchestrating [`AnalysisPipeline`].

pub mod domain;
pub mod modules;
pub mod pipeline;
pub mod ports;
pub mod retry;

pub use domain::{
    AnalysisAccuracy, AnalysisError, AnalysisResult, Angle, AssessmentOutcome, AssessmentPrompt,
    AssessmentSource, EncodedImage, FaceDetection, HistoryEntry, ImageRef, ImageSet, ParseError,
    Rating, ServiceError, StructuredAssessment, ValidationVerdict,
};
pub use modules::{
    FaceValidationGate, GateConfig, GenerativeAssessmentClient, NamedOrder, ProviderStrategy,
};
pub use pipeline::AnalysisPipeline;
pub use ports::{
    AssessmentProvider, FaceDetector, HistoryStore, ImageCodec, ProgressEvent, ProgressSink,
    ResultOutput,
};
pub use retry::{Backoff, RetryPolicy};
