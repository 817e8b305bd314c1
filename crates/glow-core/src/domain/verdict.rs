//! Validation verdicts produced by the face validation gate.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Angle;

/// Why a detection was rejected.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RejectReason {
    /// The service found no face at all.
    NoFace,
    /// Detection confidence below the angle's minimum.
    LowConfidence { confidence: f64, min: f64 },
    /// A required landmark is missing.
    MissingLandmark { landmark: String },
    /// Face bounding box smaller than the angle's minimum side.
    FaceTooSmall { side: u32, min: u32 },
    /// Head turned or tilted too far.
    ExtremePose { degrees: f64, max: f64 },
    /// Under-exposure reported as very likely.
    PoorExposure,
    /// Blur reported as very likely.
    Blurred,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFace => f.write_str("no face found"),
            Self::LowConfidence { confidence, min } => {
                write!(f, "confidence {confidence:.2} below {min:.2}")
            }
            Self::MissingLandmark { landmark } => write!(f, "missing landmark {landmark}"),
            Self::FaceTooSmall { side, min } => write!(f, "face {side}px smaller than {min}px"),
            Self::ExtremePose { degrees, max } => {
                write!(f, "head angle {degrees:.0} exceeds {max:.0} degrees")
            }
            Self::PoorExposure => f.write_str("photo is badly exposed"),
            Self::Blurred => f.write_str("photo is blurred"),
        }
    }
}

/// Outcome of validating one angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// Validated angle.
    pub angle: Angle,
    /// Every failed check; empty when the angle passed.
    pub reasons: Vec<RejectReason>,
}

impl ValidationVerdict {
    /// True when no check failed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.reasons.is_empty()
    }
}

impl fmt::Display for ValidationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            return f.write_str("ok");
        }
        for (i, reason) in self.reasons.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{reason}")?;
        }
        Ok(())
    }
}
