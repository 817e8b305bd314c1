//! Pipeline stages.

mod assessment;
mod fallback;
mod gate;
mod request;
mod sanitizer;
mod scoring;

pub use assessment::{
    Completion, GenerativeAssessmentClient, InOrder, NamedOrder, ProviderStrategy,
};
pub use fallback::{feature_score, hash_score, stable_hash, DeterministicFallbackGenerator};
pub use gate::{AngleRules, FaceValidationGate, GateConfig};
pub use request::AssessmentRequestBuilder;
pub use sanitizer::{RepairStage, ResponseSanitizer};
pub use scoring::{
    brightness, facial_symmetry, final_score, multi_angle_symmetry, profile_consistency,
    ScoreSynthesizer, SynthesisInput,
};
