//! Score synthesis.
//!
//! Combines the structured assessment with geometric and color measurements
//! from detection into the final bounded result.

use crate::domain::{
    AnalysisAccuracy, AnalysisResult, AssessmentOutcome, DermatologyInsights, DetailedScores,
    DominantColor, FaceDetection, LandmarkKind, Rating, DETAIL_MAX, DETAIL_MIN,
};

/// Symmetry and brightness bounds.
const MEASURE_MIN: f64 = 65.0;
const MEASURE_MAX: f64 = 98.0;
/// Symmetry or brightness when nothing can be measured.
const MEASURE_DEFAULT: f64 = 82.0;

/// Bonus added to multi-angle symmetry.
const MULTI_ANGLE_SYMMETRY_BONUS: f64 = 5.0;
/// Bonus added to the final multi-angle score.
const MULTI_ANGLE_SCORE_BONUS: f64 = 2.0;
/// Confidence added for multi-angle runs.
const MULTI_ANGLE_CONFIDENCE_BONUS: f64 = 0.10;

/// Luminance that scores best.
const IDEAL_LUMINANCE: f64 = 0.6;
/// Saturation that earns the bonus.
const IDEAL_SATURATION: f64 = 0.3;
/// Bonus for a skin-like dominant color.
const SKIN_TONE_BONUS: f64 = 3.0;

/// Advice keyed by detailed score name, used for the weakest metric.
const METRIC_TIPS: &[(&str, &str)] = &[
    ("facialSymmetry", "Shoot in even, frontal light to keep both sides of your face balanced"),
    ("skinGlow", "A weekly gentle exfoliation helps reveal brighter, more radiant skin"),
    ("skinClarity", "Double-cleanse in the evening to keep pores clear"),
    ("hydration", "Layer a hydrating serum under your moisturizer to lock in water"),
    ("texture", "Retinoids or mild acids used a few nights a week can smooth texture"),
    ("evenTone", "Daily sunscreen and a vitamin C serum help even out skin tone"),
    ("poreRefinement", "Niacinamide can help minimize the look of pores"),
    ("skinHealth", "Consistent sleep, water intake and sun protection support overall skin health"),
];

/// Maximum number of tips in a result.
const MAX_TIPS: usize = 5;

/// Everything the synthesizer consumes for one run.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisInput<'a> {
    /// Accepted front detection.
    pub front: &'a FaceDetection,
    /// Accepted profile detections.
    pub profiles: &'a [FaceDetection],
    /// Assessment and where it came from.
    pub outcome: &'a AssessmentOutcome,
    /// Reference to the front photo.
    pub image_uri: &'a str,
    /// RFC 3339 timestamp of the run.
    pub timestamp: &'a str,
}

/// Produces the final [`AnalysisResult`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreSynthesizer;

impl ScoreSynthesizer {
    /// Synthesizes the result.
    #[must_use]
    pub fn synthesize(input: &SynthesisInput<'_>) -> AnalysisResult {
        let assessment = &input.outcome.assessment;
        let multi_angle = !input.profiles.is_empty();

        let front_symmetry = facial_symmetry(input.front);
        let symmetry = match profile_consistency(input.profiles) {
            Some(consistency) => multi_angle_symmetry(front_symmetry, consistency),
            None => front_symmetry,
        };
        let brightness = brightness(&input.front.dominant_colors);

        let overall_score = final_score(
            assessment.beauty_scores.overall_score,
            symmetry,
            brightness,
            assessment.skin_analysis.texture_score,
            multi_angle,
        );

        let skin = &assessment.skin_analysis;
        let detailed_scores = DetailedScores {
            facial_symmetry: detail(symmetry),
            skin_glow: detail((assessment.beauty_scores.skin_glow + brightness) / 2.0),
            skin_clarity: detail(skin.clarity_score),
            hydration: detail(skin.hydration_level),
            texture: detail(skin.texture_score),
            even_tone: detail(skin.evenness),
            pore_refinement: detail(100.0 - skin.pore_visibility),
            skin_health: detail(
                (skin.clarity_score
                    + skin.hydration_level
                    + skin.evenness
                    + (100.0 - skin.pore_visibility))
                    / 4.0,
            ),
        };

        let analysis_accuracy = if input.outcome.source.is_fallback() {
            AnalysisAccuracy::Fallback
        } else if multi_angle {
            AnalysisAccuracy::Enhanced
        } else {
            AnalysisAccuracy::Standard
        };

        let mut confidence = assessment.confidence;
        if multi_angle {
            confidence += MULTI_ANGLE_CONFIDENCE_BONUS;
        }

        let derm = &assessment.dermatology_assessment;
        AnalysisResult {
            overall_score,
            rating: Rating::from_score(overall_score),
            detailed_scores,
            dermatology_insights: DermatologyInsights {
                skin_type: skin.skin_type.clone(),
                skin_tone: skin.skin_tone.clone(),
                acne_risk: derm.acne_risk.clone(),
                skin_health: derm.skin_health.clone(),
                concerns: skin.concerns.clone(),
                aging_signs: derm.aging_signs.clone(),
                analysis_accuracy,
                multi_angle,
            },
            personalized_tips: personalized_tips(
                &assessment.professional_recommendations,
                &detailed_scores,
            ),
            confidence: confidence.clamp(0.0, 1.0),
            timestamp: input.timestamp.to_string(),
            image_uri: input.image_uri.to_string(),
        }
    }
}

/// Front-view symmetry from mirrored landmark distances.
///
/// Each pair scores `min/max × 100`. The first available pair weighs 50 %
/// and the others share the remaining 50 %. Clamped to `[65, 98]`; 82 when
/// no pair can be measured.
#[must_use]
pub fn facial_symmetry(detection: &FaceDetection) -> f64 {
    let ratios = symmetry_ratios(detection);
    let Some((first, rest)) = ratios.split_first() else {
        return MEASURE_DEFAULT;
    };
    let combined = if rest.is_empty() {
        *first
    } else {
        #[allow(clippy::cast_precision_loss)]
        let share = 0.5 / rest.len() as f64;
        first * 0.5 + rest.iter().map(|r| r * share).sum::<f64>()
    };
    combined.clamp(MEASURE_MIN, MEASURE_MAX)
}

fn symmetry_ratios(detection: &FaceDetection) -> Vec<f64> {
    use LandmarkKind::{
        LeftEarTragion, LeftEye, MidpointBetweenEyes, MouthLeft, MouthRight, NoseTip,
        RightEarTragion, RightEye,
    };

    let pairs = [
        (LeftEye, RightEye, NoseTip),
        (MouthLeft, MouthRight, NoseTip),
        (LeftEarTragion, RightEarTragion, NoseTip),
        (LeftEye, RightEye, MidpointBetweenEyes),
    ];
    pairs
        .iter()
        .filter_map(|(left, right, anchor)| {
            let anchor = detection.landmark(*anchor)?;
            let d1 = distance(detection.landmark(*left)?, anchor);
            let d2 = distance(detection.landmark(*right)?, anchor);
            ratio(d1, d2)
        })
        .collect()
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

fn ratio(a: f64, b: f64) -> Option<f64> {
    let max = a.max(b);
    (max > 0.0).then(|| a.min(b) / max * 100.0)
}

/// Consistency of the profile views, 0-100.
///
/// With both profiles, the ratio of their absolute yaw angles; with one,
/// its detection confidence. `None` without profiles.
#[must_use]
pub fn profile_consistency(profiles: &[FaceDetection]) -> Option<f64> {
    match profiles {
        [] => None,
        [only] => Some(only.confidence.clamp(0.0, 1.0) * 100.0),
        [a, b, ..] => Some(ratio(a.pose.pan.abs(), b.pose.pan.abs()).unwrap_or(100.0)),
    }
}

/// Blends front symmetry with profile consistency and adds the multi-angle
/// bonus. Never lower than the front symmetry plus the bonus, capped at 100.
#[must_use]
pub fn multi_angle_symmetry(front: f64, consistency: f64) -> f64 {
    let blended = 0.7 * front + 0.3 * consistency;
    (front.max(blended) + MULTI_ANGLE_SYMMETRY_BONUS).min(100.0)
}

/// Glow estimate from dominant colors, weighted by pixel fraction.
///
/// Rewards luminance near 0.6, saturation near 0.3 and skin-like colors.
/// Clamped to `[65, 98]`; 82 without color data.
#[must_use]
pub fn brightness(colors: &[DominantColor]) -> f64 {
    let total: f64 = colors.iter().map(|c| c.pixel_fraction.max(0.0)).sum();
    if total <= 0.0 {
        return MEASURE_DEFAULT;
    }

    let (mut luminance, mut saturation) = (0.0, 0.0);
    for color in colors {
        let weight = color.pixel_fraction.max(0.0) / total;
        luminance += relative_luminance(color.rgb) * weight;
        saturation += hsv_saturation(color.rgb) * weight;
    }

    let mut score = 70.0 + (1.0 - (luminance - IDEAL_LUMINANCE).abs() / IDEAL_LUMINANCE) * 20.0;
    let saturation_gap = (saturation - IDEAL_SATURATION).abs();
    if saturation_gap <= 0.1 {
        score += 5.0;
    } else if saturation_gap <= 0.2 {
        score += 2.0;
    }
    if colors.iter().any(|c| is_skin_tone(c.rgb)) {
        score += SKIN_TONE_BONUS;
    }
    score.clamp(MEASURE_MIN, MEASURE_MAX)
}

fn relative_luminance([r, g, b]: [u8; 3]) -> f64 {
    (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) / 255.0
}

fn hsv_saturation(rgb: [u8; 3]) -> f64 {
    let max = rgb.iter().copied().max().unwrap_or(0);
    let min = rgb.iter().copied().min().unwrap_or(0);
    if max == 0 {
        0.0
    } else {
        f64::from(max - min) / f64::from(max)
    }
}

/// Classic RGB skin-color rule.
fn is_skin_tone([r, g, b]: [u8; 3]) -> bool {
    r > 95 && g > 40 && b > 20 && r > g && r > b && r.abs_diff(g) > 15
}

/// Weighted final score, clamped to `[0, 100]`.
#[must_use]
pub fn final_score(
    beauty: f64,
    symmetry: f64,
    brightness: f64,
    texture: f64,
    multi_angle: bool,
) -> u8 {
    let bonus = if multi_angle {
        MULTI_ANGLE_SCORE_BONUS
    } else {
        0.0
    };
    let score = beauty * 0.5 + symmetry * 0.25 + brightness * 0.15 + texture * 0.10 + bonus;
    to_u8(score.round().clamp(0.0, 100.0))
}

fn detail(value: f64) -> u8 {
    to_u8(value.round().clamp(f64::from(DETAIL_MIN), f64::from(DETAIL_MAX)))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(value: f64) -> u8 {
    // callers clamp into 0..=100
    value as u8
}

/// Recommendations from the assessment plus a tip for the weakest metric.
fn personalized_tips(recommendations: &[String], scores: &DetailedScores) -> Vec<String> {
    let mut tips: Vec<String> = Vec::new();
    for rec in recommendations {
        let rec = rec.trim();
        if !rec.is_empty() && !tips.iter().any(|t| t == rec) {
            tips.push(rec.to_string());
        }
    }
    tips.truncate(MAX_TIPS - 1);

    let weakest = scores
        .entries()
        .into_iter()
        .min_by_key(|(_, score)| *score)
        .map(|(name, _)| name);
    if let Some(tip) = weakest.and_then(|name| {
        METRIC_TIPS
            .iter()
            .find(|(metric, _)| *metric == name)
            .map(|(_, tip)| *tip)
    }) {
        if !tips.iter().any(|t| t == tip) {
            tips.push(tip.to_string());
        }
    }
    tips
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Angle, BoundingBox, Landmark, Likelihood, Pose, StructuredAssessment};

    fn face(angle: Angle, landmarks: &[(LandmarkKind, f64, f64)]) -> FaceDetection {
        FaceDetection {
            angle,
            confidence: 0.9,
            landmarks: landmarks
                .iter()
                .map(|&(kind, x, y)| Landmark { kind, x, y })
                .collect(),
            pose: Pose::default(),
            bounding_box: BoundingBox {
                x: 0,
                y: 0,
                width: 200,
                height: 200,
            },
            exposure: Likelihood::VeryUnlikely,
            blur: Likelihood::VeryUnlikely,
            dominant_colors: vec![],
        }
    }

    fn symmetric_front() -> FaceDetection {
        face(
            Angle::Front,
            &[
                (LandmarkKind::LeftEye, 80.0, 100.0),
                (LandmarkKind::RightEye, 120.0, 100.0),
                (LandmarkKind::NoseTip, 100.0, 130.0),
            ],
        )
    }

    fn profile(angle: Angle, pan: f64, confidence: f64) -> FaceDetection {
        let mut det = face(angle, &[(LandmarkKind::NoseTip, 60.0, 120.0)]);
        det.pose.pan = pan;
        det.confidence = confidence;
        det
    }

    #[test]
    fn test_symmetry_defaults_without_landmarks() {
        let det = face(Angle::Front, &[]);
        assert!((facial_symmetry(&det) - 82.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_perfect_symmetry_is_capped() {
        assert!((facial_symmetry(&symmetric_front()) - 98.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_symmetry_weights_first_pair() {
        // eye-nose ratio 100, mouth-nose ratio 50
        let det = face(
            Angle::Front,
            &[
                (LandmarkKind::LeftEye, 80.0, 100.0),
                (LandmarkKind::RightEye, 120.0, 100.0),
                (LandmarkKind::NoseTip, 100.0, 100.0),
                (LandmarkKind::MouthLeft, 80.0, 100.0),
                (LandmarkKind::MouthRight, 110.0, 100.0),
            ],
        );
        assert!((facial_symmetry(&det) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_lopsided_face_is_floored() {
        let det = face(
            Angle::Front,
            &[
                (LandmarkKind::LeftEye, 10.0, 100.0),
                (LandmarkKind::RightEye, 105.0, 100.0),
                (LandmarkKind::NoseTip, 100.0, 100.0),
            ],
        );
        assert!((facial_symmetry(&det) - 65.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_profile_consistency() {
        assert_eq!(profile_consistency(&[]), None);
        let single = [profile(Angle::Left, 60.0, 0.7)];
        assert!((profile_consistency(&single).unwrap_or_default() - 70.0).abs() < 1e-9);
        let pair = [profile(Angle::Left, -60.0, 0.7), profile(Angle::Right, 45.0, 0.8)];
        assert!((profile_consistency(&pair).unwrap_or_default() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_multi_angle_symmetry_never_below_front() {
        for front in [65.0, 80.0, 98.0] {
            for consistency in [0.0, 50.0, 100.0] {
                let multi = multi_angle_symmetry(front, consistency);
                assert!(multi >= (front + 5.0).min(100.0) - 1e-9);
                assert!(multi <= 100.0);
            }
        }
        assert!((multi_angle_symmetry(80.0, 100.0) - 91.0).abs() < 1e-9);
    }

    #[test]
    fn test_brightness_default_and_floor() {
        assert!((brightness(&[]) - 82.0).abs() < f64::EPSILON);
        let black = [DominantColor {
            rgb: [0, 0, 0],
            pixel_fraction: 1.0,
        }];
        assert!((brightness(&black) - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_brightness_rewards_warm_mid_tones() {
        let skin = [DominantColor {
            rgb: [224, 172, 150],
            pixel_fraction: 0.6,
        }];
        let gray = [DominantColor {
            rgb: [90, 90, 90],
            pixel_fraction: 0.6,
        }];
        assert!(brightness(&skin) > brightness(&gray));
    }

    #[test]
    fn test_final_score_formula() {
        // 46.5 + 20.5 + 12.3 + 8.0 = 87.3
        assert_eq!(final_score(93.0, 82.0, 82.0, 80.0, false), 87);
        assert_eq!(final_score(93.0, 82.0, 82.0, 80.0, true), 89);
        assert_eq!(final_score(100.0, 100.0, 100.0, 100.0, true), 100);
        assert_eq!(final_score(0.0, 0.0, 0.0, 0.0, false), 0);
    }

    #[test]
    fn test_tips_include_weakest_metric() {
        let scores = DetailedScores {
            facial_symmetry: 90,
            skin_glow: 90,
            skin_clarity: 90,
            hydration: 61,
            texture: 90,
            even_tone: 90,
            pore_refinement: 90,
            skin_health: 90,
        };
        let recs = vec!["Use sunscreen".to_string(), "Use sunscreen".to_string(), " ".into()];
        let tips = personalized_tips(&recs, &scores);
        assert_eq!(tips.len(), 2);
        assert_eq!(tips[0], "Use sunscreen");
        assert!(tips[1].contains("hydrating serum"));
    }

    #[test]
    fn test_synthesize_single_and_multi_angle() {
        let assessment = StructuredAssessment {
            confidence: 0.85,
            ..StructuredAssessment::default()
        };
        let outcome = AssessmentOutcome::generative(assessment, "primary");
        let front = symmetric_front();
        let profiles = [profile(Angle::Left, 60.0, 0.8), profile(Angle::Right, 55.0, 0.8)];

        let single = ScoreSynthesizer::synthesize(&SynthesisInput {
            front: &front,
            profiles: &[],
            outcome: &outcome,
            image_uri: "front.jpg",
            timestamp: "2026-01-01T00:00:00Z",
        });
        let multi = ScoreSynthesizer::synthesize(&SynthesisInput {
            front: &front,
            profiles: &profiles,
            outcome: &outcome,
            image_uri: "front.jpg",
            timestamp: "2026-01-01T00:00:00Z",
        });

        assert!(multi.overall_score >= single.overall_score);
        assert!((multi.confidence - single.confidence - 0.10).abs() < 1e-9);
        assert_eq!(
            single.dermatology_insights.analysis_accuracy,
            AnalysisAccuracy::Standard
        );
        assert_eq!(
            multi.dermatology_insights.analysis_accuracy,
            AnalysisAccuracy::Enhanced
        );
        assert!(multi.dermatology_insights.multi_angle);
        for (_, score) in multi.detailed_scores.entries() {
            assert!((DETAIL_MIN..=DETAIL_MAX).contains(&score));
        }
        assert_eq!(single.rating, Rating::from_score(single.overall_score));
        assert_eq!(single.image_uri, "front.jpg");
    }

    #[test]
    fn test_fallback_source_marks_accuracy() {
        let outcome = AssessmentOutcome::fallback(StructuredAssessment::default(), "HTTP 500");
        let front = symmetric_front();
        let result = ScoreSynthesizer::synthesize(&SynthesisInput {
            front: &front,
            profiles: &[],
            outcome: &outcome,
            image_uri: "front.jpg",
            timestamp: "2026-01-01T00:00:00Z",
        });
        assert_eq!(
            result.dermatology_insights.analysis_accuracy,
            AnalysisAccuracy::Fallback
        );
    }
}
