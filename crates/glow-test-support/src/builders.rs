//! Builders for detections, provider answers and synthetic photos.

use std::path::Path;

use glow_core::domain::{
    Angle, BoundingBox, DominantColor, FaceDetection, Landmark, LandmarkKind, Likelihood, Pose,
};
use image::{DynamicImage, Rgb, RgbImage};

/// Builder for [`FaceDetection`] values.
///
/// Starts from a confident, well-framed, symmetric face so tests only spell
/// out the property they care about.
#[derive(Debug, Clone)]
pub struct DetectionBuilder {
    detection: FaceDetection,
}

impl DetectionBuilder {
    /// A good frontal detection: confidence 0.92, all landmarks, small pose.
    #[must_use]
    pub fn front() -> Self {
        let lm = |kind, x, y| Landmark { kind, x, y };
        Self {
            detection: FaceDetection {
                angle: Angle::Front,
                confidence: 0.92,
                landmarks: vec![
                    lm(LandmarkKind::LeftEye, 160.0, 200.0),
                    lm(LandmarkKind::RightEye, 240.0, 200.0),
                    lm(LandmarkKind::MidpointBetweenEyes, 200.0, 200.0),
                    lm(LandmarkKind::NoseTip, 200.0, 250.0),
                    lm(LandmarkKind::MouthLeft, 170.0, 300.0),
                    lm(LandmarkKind::MouthRight, 232.0, 300.0),
                    lm(LandmarkKind::LeftEarTragion, 110.0, 230.0),
                    lm(LandmarkKind::RightEarTragion, 292.0, 230.0),
                ],
                pose: Pose {
                    roll: 2.0,
                    pan: 3.0,
                    tilt: -1.0,
                },
                bounding_box: BoundingBox {
                    x: 90,
                    y: 120,
                    width: 220,
                    height: 260,
                },
                exposure: Likelihood::VeryUnlikely,
                blur: Likelihood::VeryUnlikely,
                dominant_colors: vec![
                    DominantColor {
                        rgb: [214, 168, 140],
                        pixel_fraction: 0.45,
                    },
                    DominantColor {
                        rgb: [60, 48, 40],
                        pixel_fraction: 0.2,
                    },
                ],
            },
        }
    }

    /// A good profile detection: nose tip only, turned about 60°.
    #[must_use]
    pub fn profile(angle: Angle) -> Self {
        let pan = if angle == Angle::Left { -60.0 } else { 58.0 };
        let mut builder = Self::front()
            .angle(angle)
            .confidence(0.8)
            .pose(1.0, pan, 0.0);
        builder.detection.landmarks.retain(|l| {
            matches!(
                l.kind,
                LandmarkKind::NoseTip | LandmarkKind::LeftEarTragion | LandmarkKind::MouthLeft
            )
        });
        builder
    }

    /// Sets the angle.
    #[must_use]
    pub fn angle(mut self, angle: Angle) -> Self {
        self.detection.angle = angle;
        self
    }

    /// Sets the detection confidence.
    #[must_use]
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.detection.confidence = confidence;
        self
    }

    /// Sets roll, pan and tilt in degrees.
    #[must_use]
    pub fn pose(mut self, roll: f64, pan: f64, tilt: f64) -> Self {
        self.detection.pose = Pose { roll, pan, tilt };
        self
    }

    /// Removes a landmark.
    #[must_use]
    pub fn without_landmark(mut self, kind: LandmarkKind) -> Self {
        self.detection.landmarks.retain(|l| l.kind != kind);
        self
    }

    /// Sets the bounding box size.
    #[must_use]
    pub fn face_size(mut self, width: u32, height: u32) -> Self {
        self.detection.bounding_box.width = width;
        self.detection.bounding_box.height = height;
        self
    }

    /// Sets the exposure and blur likelihoods.
    #[must_use]
    pub fn quality(mut self, exposure: Likelihood, blur: Likelihood) -> Self {
        self.detection.exposure = exposure;
        self.detection.blur = blur;
        self
    }

    /// Replaces the dominant colors.
    #[must_use]
    pub fn colors(mut self, colors: Vec<DominantColor>) -> Self {
        self.detection.dominant_colors = colors;
        self
    }

    /// Returns the detection.
    #[must_use]
    pub fn build(self) -> FaceDetection {
        self.detection
    }
}

/// A well-formed assessment answer with the given overall beauty score.
#[must_use]
pub fn assessment_json(overall_score: u8) -> String {
    format!(
        r#"{{
  "skinAnalysis": {{
    "skinType": "Combination",
    "skinTone": "Medium",
    "textureScore": 84,
    "clarityScore": 86,
    "hydrationLevel": 78,
    "poreVisibility": 22,
    "evenness": 83,
    "concerns": ["Mild dehydration"]
  }},
  "dermatologyAssessment": {{
    "acneRisk": "Low",
    "agingSigns": [],
    "skinHealth": "Good",
    "conditions": []
  }},
  "beautyScores": {{"overallScore": {overall_score}, "facialHarmony": 85, "skinGlow": 88}},
  "professionalRecommendations": ["Use a hydrating serum", "Wear SPF 30 daily"],
  "confidence": 0.85
}}"#
    )
}

/// Builder for synthetic photos.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    /// A warm skin-toned gradient, roughly face-colored.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn skin_tone(width: u32, height: u32) -> DynamicImage {
        let img = RgbImage::from_fn(width, height, |x, y| {
            let shade = ((x + y) * 40 / (width + height).max(1)) as u8;
            Rgb([200 + shade / 2, 150 + shade, 120 + shade])
        });
        DynamicImage::ImageRgb8(img)
    }

    /// Writes a skin-toned image to `path`; the format follows the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_skin_tone(path: &Path, width: u32, height: u32) -> anyhow::Result<()> {
        Self::skin_tone(width, height).save(path)?;
        Ok(())
    }
}
