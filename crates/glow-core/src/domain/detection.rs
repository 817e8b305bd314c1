//! Face detection results as consumed by the validation gate and scoring.

use serde::{Deserialize, Serialize};

use super::Angle;

/// Axis-aligned face bounding box in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BoundingBox {
    /// Length of the shorter side.
    #[must_use]
    pub const fn min_side(&self) -> u32 {
        if self.width < self.height {
            self.width
        } else {
            self.height
        }
    }
}

/// Facial landmark kinds used by the gate and the symmetry metric.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkKind {
    LeftEye,
    RightEye,
    MidpointBetweenEyes,
    NoseTip,
    MouthLeft,
    MouthRight,
    MouthCenter,
    LeftEarTragion,
    RightEarTragion,
    ChinGnathion,
    ForeheadGlabella,
    /// Any landmark the pipeline does not use.
    Other,
}

/// A single landmark position in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Landmark type.
    pub kind: LandmarkKind,
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

/// Head pose in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Rotation around the viewing axis.
    pub roll: f64,
    /// Left/right rotation (yaw).
    pub pan: f64,
    /// Up/down rotation (pitch).
    pub tilt: f64,
}

impl Pose {
    /// Largest absolute angle of the three axes.
    #[must_use]
    pub fn max_abs(&self) -> f64 {
        self.roll.abs().max(self.pan.abs()).max(self.tilt.abs())
    }

    /// Sum of absolute angles.
    #[must_use]
    pub fn total_abs(&self) -> f64 {
        self.roll.abs() + self.pan.abs() + self.tilt.abs()
    }
}

/// Five-step likelihood scale reported by the detection service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Likelihood {
    #[default]
    Unknown,
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
}

/// One dominant image color with its share of the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DominantColor {
    /// Red, green, blue channels (0-255).
    pub rgb: [u8; 3],
    /// Fraction of pixels close to this color (0.0-1.0).
    pub pixel_fraction: f64,
}

/// Detection output for one angle. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    /// Which photo this detection belongs to.
    pub angle: Angle,
    /// Detection confidence (0.0 to 1.0).
    pub confidence: f64,
    /// Detected landmarks.
    pub landmarks: Vec<Landmark>,
    /// Head pose.
    pub pose: Pose,
    /// Face bounding box.
    pub bounding_box: BoundingBox,
    /// Under-exposure likelihood.
    ///
    /// The detection service only reports under-exposure, so the gate has no
    /// over-exposure signal. A washed-out face passes this check.
    pub exposure: Likelihood,
    /// Blur likelihood.
    pub blur: Likelihood,
    /// Dominant colors of the whole image.
    pub dominant_colors: Vec<DominantColor>,
}

impl FaceDetection {
    /// Returns the position of the first landmark of `kind`.
    #[must_use]
    pub fn landmark(&self, kind: LandmarkKind) -> Option<(f64, f64)> {
        self.landmarks
            .iter()
            .find(|l| l.kind == kind)
            .map(|l| (l.x, l.y))
    }

    /// True if a landmark of `kind` was detected.
    #[must_use]
    pub fn has_landmark(&self, kind: LandmarkKind) -> bool {
        self.landmark(kind).is_some()
    }
}
