//! Assessment request builder.
//!
//! Composes the provider-neutral prompt from detection results. Pure: the same
//! detections always produce the same prompt.

use crate::domain::{AssessmentPrompt, FaceDetection, LandmarkKind, Likelihood};

/// Instructions sent with every request.
const SYSTEM_PROMPT: &str = "You are a cosmetic skin analysis assistant. \
Assess the skin in the supplied photo using the face detection context. \
Respond with a single JSON object and nothing else, following this schema:";

/// Schema example embedded in the system prompt.
const SCHEMA_EXAMPLE: &str = r#"{
  "skinAnalysis": {
    "skinType": "Normal|Oily|Dry|Combination|Sensitive",
    "skinTone": "string",
    "textureScore": 0-100,
    "clarityScore": 0-100,
    "hydrationLevel": 0-100,
    "poreVisibility": 0-100,
    "evenness": 0-100,
    "concerns": ["string"]
  },
  "dermatologyAssessment": {
    "acneRisk": "Low|Medium|High",
    "agingSigns": ["string"],
    "skinHealth": "string",
    "conditions": ["string"]
  },
  "beautyScores": {"overallScore": 0-100, "facialHarmony": 0-100, "skinGlow": 0-100},
  "professionalRecommendations": ["string"],
  "confidence": 0.0-1.0
}"#;

/// Landmarks reported to the model, with their prompt labels.
const REPORTED_LANDMARKS: &[(LandmarkKind, &str)] = &[
    (LandmarkKind::LeftEye, "left_eye"),
    (LandmarkKind::RightEye, "right_eye"),
    (LandmarkKind::NoseTip, "nose_tip"),
    (LandmarkKind::MouthLeft, "mouth_left"),
    (LandmarkKind::MouthRight, "mouth_right"),
    (LandmarkKind::LeftEarTragion, "left_ear"),
    (LandmarkKind::RightEarTragion, "right_ear"),
];

/// Maximum dominant colors listed per angle.
const MAX_COLORS: usize = 5;

/// Builds assessment prompts from detection results.
pub struct AssessmentRequestBuilder;

impl AssessmentRequestBuilder {
    /// Composes the prompt for the accepted detections, front first.
    ///
    /// The returned prompt carries no image; the caller attaches the front
    /// photo for vision-capable providers.
    #[must_use]
    pub fn build(detections: &[FaceDetection], is_multi_angle: bool) -> AssessmentPrompt {
        let angles: Vec<&str> = detections.iter().map(|d| d.angle.as_str()).collect();
        let mode = if is_multi_angle {
            "multi-angle"
        } else {
            "single-angle"
        };

        let mut lines = vec![format!("Analysis mode: {mode} ({})", angles.join(", "))];
        for detection in detections {
            lines.push(describe(detection));
            if !detection.dominant_colors.is_empty() {
                lines.push(describe_colors(detection));
            }
        }
        if is_multi_angle {
            lines.push(
                "Use the profile views to judge consistency of skin texture and tone across the face."
                    .to_string(),
            );
        }

        AssessmentPrompt {
            system: format!("{SYSTEM_PROMPT}\n{SCHEMA_EXAMPLE}"),
            user: lines.join("\n"),
            image: None,
        }
    }
}

fn describe(detection: &FaceDetection) -> String {
    let landmarks: Vec<String> = REPORTED_LANDMARKS
        .iter()
        .map(|(kind, label)| {
            let present = if detection.has_landmark(*kind) { "yes" } else { "no" };
            format!("{label}={present}")
        })
        .collect();
    let bbox = detection.bounding_box;
    format!(
        "[{}] confidence={:.2} landmarks: {} pose: roll={:.1} pan={:.1} tilt={:.1} face={}x{}px exposure_issue={} blur={}",
        detection.angle,
        detection.confidence,
        landmarks.join(" "),
        detection.pose.roll,
        detection.pose.pan,
        detection.pose.tilt,
        bbox.width,
        bbox.height,
        likelihood_label(detection.exposure),
        likelihood_label(detection.blur),
    )
}

fn describe_colors(detection: &FaceDetection) -> String {
    let colors: Vec<String> = detection
        .dominant_colors
        .iter()
        .take(MAX_COLORS)
        .map(|c| {
            format!(
                "#{:02x}{:02x}{:02x} ({:.0}%)",
                c.rgb[0],
                c.rgb[1],
                c.rgb[2],
                c.pixel_fraction * 100.0
            )
        })
        .collect();
    format!("[{}] dominant colors: {}", detection.angle, colors.join(", "))
}

const fn likelihood_label(likelihood: Likelihood) -> &'static str {
    match likelihood {
        Likelihood::Unknown => "unknown",
        Likelihood::VeryUnlikely => "very_unlikely",
        Likelihood::Unlikely => "unlikely",
        Likelihood::Possible => "possible",
        Likelihood::Likely => "likely",
        Likelihood::VeryLikely => "very_likely",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Angle, BoundingBox, DominantColor, Landmark, Pose};

    fn detection(angle: Angle, confidence: f64) -> FaceDetection {
        FaceDetection {
            angle,
            confidence,
            landmarks: vec![Landmark {
                kind: LandmarkKind::NoseTip,
                x: 10.0,
                y: 10.0,
            }],
            pose: Pose {
                roll: 1.0,
                pan: -2.5,
                tilt: 0.0,
            },
            bounding_box: BoundingBox {
                x: 0,
                y: 0,
                width: 150,
                height: 180,
            },
            exposure: Likelihood::VeryUnlikely,
            blur: Likelihood::Possible,
            dominant_colors: vec![DominantColor {
                rgb: [200, 150, 120],
                pixel_fraction: 0.42,
            }],
        }
    }

    #[test]
    fn test_single_angle_prompt() {
        let prompt = AssessmentRequestBuilder::build(&[detection(Angle::Front, 0.93)], false);
        assert!(prompt.system.contains("\"skinAnalysis\""));
        assert!(prompt.user.starts_with("Analysis mode: single-angle (front)"));
        assert!(prompt.user.contains("[front] confidence=0.93"));
        assert!(prompt.user.contains("nose_tip=yes"));
        assert!(prompt.user.contains("left_eye=no"));
        assert!(prompt.user.contains("pan=-2.5"));
        assert!(prompt.user.contains("blur=possible"));
        assert!(prompt.user.contains("#c89678 (42%)"));
        assert!(prompt.image.is_none());
    }

    #[test]
    fn test_multi_angle_prompt_lists_every_view() {
        let dets = [
            detection(Angle::Front, 0.9),
            detection(Angle::Left, 0.6),
            detection(Angle::Right, 0.7),
        ];
        let prompt = AssessmentRequestBuilder::build(&dets, true);
        assert!(prompt
            .user
            .starts_with("Analysis mode: multi-angle (front, left, right)"));
        assert!(prompt.user.contains("[left] confidence=0.60"));
        assert!(prompt.user.contains("[right] confidence=0.70"));
        assert!(prompt.user.contains("profile views"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let dets = [detection(Angle::Front, 0.81)];
        assert_eq!(
            AssessmentRequestBuilder::build(&dets, false),
            AssessmentRequestBuilder::build(&dets, false)
        );
    }
}
