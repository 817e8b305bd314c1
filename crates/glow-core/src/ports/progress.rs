//! Progress reporting port for UI integration.

use crate::domain::{Angle, AssessmentSource, ValidationVerdict};

/// Step events emitted during one analysis run.
///
/// Notifications only; sinks cannot influence the pipeline.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Detection finished for the listed angles.
    DetectionCompleted {
        /// Angles whose detection call returned a face.
        angles: Vec<Angle>,
    },
    /// The front photo passed the gate.
    ValidationPassed {
        /// Angles accepted for analysis.
        accepted: Vec<Angle>,
        /// Profile verdicts that failed and were dropped.
        dropped: Vec<ValidationVerdict>,
    },
    /// An assessment is available.
    AssessmentCompleted {
        /// Generative or fallback.
        source: AssessmentSource,
    },
    /// Final scores computed.
    SynthesisCompleted {
        /// The glow score.
        overall_score: u8,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
