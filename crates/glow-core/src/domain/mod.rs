//! Core domain types for facial analysis.

mod assessment;
mod detection;
mod error;
mod image;
mod prompt;
mod result;
mod verdict;

pub use assessment::{
    AssessmentOutcome, AssessmentSource, BeautyScores, DermatologyAssessment, SkinAnalysis,
    StructuredAssessment,
};
pub use detection::{
    BoundingBox, DominantColor, FaceDetection, Landmark, LandmarkKind, Likelihood, Pose,
};
pub use error::{is_retryable_status, AnalysisError, ParseError, ServiceError};
pub use image::{Angle, EncodedImage, ImageRef, ImageSet};
pub use prompt::AssessmentPrompt;
pub use result::{
    AnalysisAccuracy, AnalysisResult, DermatologyInsights, DetailedScores, HistoryEntry, Rating,
    DETAIL_MAX, DETAIL_MIN,
};
pub use verdict::{RejectReason, ValidationVerdict};
