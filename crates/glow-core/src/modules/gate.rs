//! Face validation gate.
//!
//! Applies per-angle acceptance thresholds to detection results. A failing
//! front photo is terminal for the run; failing profiles are dropped.

use tracing::{debug, warn};

use crate::domain::{
    AnalysisError, Angle, FaceDetection, LandmarkKind, Likelihood, RejectReason, ValidationVerdict,
};

/// Acceptance rules for one kind of angle.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleRules {
    /// Minimum detection confidence (0.0-1.0).
    pub min_confidence: f64,
    /// Landmarks that must be present.
    pub required_landmarks: Vec<LandmarkKind>,
    /// Minimum length of the shorter bounding box side, in pixels.
    pub min_face_side: u32,
    /// Maximum absolute roll, pan or tilt in degrees. `None` skips the check.
    pub max_pose_degrees: Option<f64>,
}

/// Configuration for the validation gate.
#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    /// Rules for the mandatory front photo.
    pub front: AngleRules,
    /// Rules for left and right profiles.
    pub profile: AngleRules,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            front: AngleRules {
                min_confidence: 0.5,
                required_landmarks: vec![
                    LandmarkKind::LeftEye,
                    LandmarkKind::RightEye,
                    LandmarkKind::NoseTip,
                ],
                min_face_side: 100,
                max_pose_degrees: Some(45.0),
            },
            profile: AngleRules {
                min_confidence: 0.3,
                required_landmarks: vec![LandmarkKind::NoseTip],
                min_face_side: 80,
                max_pose_degrees: None,
            },
        }
    }
}

/// Validation gate applied before any generative call.
#[derive(Debug, Clone, Default)]
pub struct FaceValidationGate {
    config: GateConfig,
}

impl FaceValidationGate {
    /// Creates a gate with the given thresholds.
    #[must_use]
    pub const fn new(config: GateConfig) -> Self {
        Self { config }
    }

    /// Evaluates every check for one angle. `None` means no face was found.
    #[must_use]
    pub fn evaluate(&self, angle: Angle, detection: Option<&FaceDetection>) -> ValidationVerdict {
        let Some(detection) = detection else {
            return ValidationVerdict {
                angle,
                reasons: vec![RejectReason::NoFace],
            };
        };

        let rules = if angle.is_profile() {
            &self.config.profile
        } else {
            &self.config.front
        };
        let mut reasons = Vec::new();

        if detection.confidence < rules.min_confidence {
            reasons.push(RejectReason::LowConfidence {
                confidence: detection.confidence,
                min: rules.min_confidence,
            });
        }

        for kind in &rules.required_landmarks {
            if !detection.has_landmark(*kind) {
                reasons.push(RejectReason::MissingLandmark {
                    landmark: landmark_name(*kind).to_string(),
                });
            }
        }

        let side = detection.bounding_box.min_side();
        if side < rules.min_face_side {
            reasons.push(RejectReason::FaceTooSmall {
                side,
                min: rules.min_face_side,
            });
        }

        if let Some(max) = rules.max_pose_degrees {
            let degrees = detection.pose.max_abs();
            if degrees > max {
                reasons.push(RejectReason::ExtremePose { degrees, max });
            }
        }

        if detection.exposure == Likelihood::VeryLikely {
            reasons.push(RejectReason::PoorExposure);
        }
        if detection.blur == Likelihood::VeryLikely {
            reasons.push(RejectReason::Blurred);
        }

        let verdict = ValidationVerdict { angle, reasons };
        debug!("Validation for {angle}: {verdict}");
        verdict
    }

    /// Validates the front photo, handing back the accepted detection.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::FaceNotDetected`] if any front check fails.
    pub fn require_front(
        &self,
        detection: Option<FaceDetection>,
    ) -> Result<FaceDetection, AnalysisError> {
        let verdict = self.evaluate(Angle::Front, detection.as_ref());
        match detection {
            Some(detection) if verdict.passed() => Ok(detection),
            _ => {
                warn!("Front photo rejected: {verdict}");
                Err(AnalysisError::FaceNotDetected(verdict))
            }
        }
    }
}

const fn landmark_name(kind: LandmarkKind) -> &'static str {
    match kind {
        LandmarkKind::LeftEye => "left_eye",
        LandmarkKind::RightEye => "right_eye",
        LandmarkKind::MidpointBetweenEyes => "midpoint_between_eyes",
        LandmarkKind::NoseTip => "nose_tip",
        LandmarkKind::MouthLeft => "mouth_left",
        LandmarkKind::MouthRight => "mouth_right",
        LandmarkKind::MouthCenter => "mouth_center",
        LandmarkKind::LeftEarTragion => "left_ear_tragion",
        LandmarkKind::RightEarTragion => "right_ear_tragion",
        LandmarkKind::ChinGnathion => "chin_gnathion",
        LandmarkKind::ForeheadGlabella => "forehead_glabella",
        LandmarkKind::Other => "other",
    }
}
