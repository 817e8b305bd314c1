//! Deterministic fallback assessment.
//!
//! Used whenever the generative path fails after the gate has passed. The
//! output depends only on the image identifier and the front detection, so a
//! repeated run on the same photo yields the same assessment.

use sha2::{Digest, Sha256};

use crate::domain::{
    BeautyScores, DermatologyAssessment, FaceDetection, Likelihood, SkinAnalysis,
    StructuredAssessment,
};

/// Lower bound of the blended base score.
const BASE_MIN: f64 = 65.0;
/// Upper bound of the blended base score.
const BASE_MAX: f64 = 98.0;
/// Feature score used when no detection is available.
const NEUTRAL_FEATURE_SCORE: f64 = 80.0;

const SKIN_TYPES: &[&str] = &["Normal", "Combination", "Oily", "Dry", "Sensitive"];
const SKIN_TONES: &[&str] = &["Fair", "Light", "Medium", "Olive", "Tan", "Deep"];
const CONCERNS: &[&str] = &[
    "Mild dehydration",
    "Enlarged pores",
    "Uneven texture",
    "Dullness",
    "Occasional breakouts",
    "Redness",
    "Dark spots",
];
const AGING_SIGNS: &[&str] = &["Fine lines", "Loss of firmness", "Under-eye lines"];
const RECOMMENDATIONS: &[&str] = &[
    "Apply a broad-spectrum SPF 30+ sunscreen every morning",
    "Use a gentle, pH-balanced cleanser twice daily",
    "Add a hyaluronic acid serum to support hydration",
    "Exfoliate with a mild chemical exfoliant once or twice a week",
    "Introduce a vitamin C serum to brighten tone",
    "Use a non-comedogenic moisturizer suited to your skin type",
    "Aim for seven to nine hours of sleep to support skin recovery",
    "Drink water regularly throughout the day",
];

/// Stable 32-bit hash of an image identifier.
///
/// The first four bytes of SHA-256 over the UTF-8 identifier, read big-endian.
/// Independent of platform, process and toolchain.
#[must_use]
pub fn stable_hash(id: &str) -> u32 {
    let digest = Sha256::digest(id.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Score in `70..=95` derived from the hash.
#[must_use]
pub fn hash_score(hash: u32) -> f64 {
    70.0 + f64::from(hash % 26)
}

/// Score from detection quality: confidence reward, pose penalty and
/// exposure/blur bonuses. Each contribution is capped.
#[must_use]
pub fn feature_score(detection: Option<&FaceDetection>) -> f64 {
    let Some(detection) = detection else {
        return NEUTRAL_FEATURE_SCORE;
    };
    let confidence = (detection.confidence * 20.0).min(20.0);
    let pose_penalty = (detection.pose.total_abs() / 3.0 * 0.3).min(10.0);
    70.0 + confidence - pose_penalty + quality_bonus(detection.exposure)
        + quality_bonus(detection.blur)
}

const fn quality_bonus(likelihood: Likelihood) -> f64 {
    match likelihood {
        Likelihood::VeryUnlikely => 4.0,
        Likelihood::Unlikely => 2.0,
        _ => 0.0,
    }
}

/// Builds synthetic assessments from an image identifier and detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicFallbackGenerator;

impl DeterministicFallbackGenerator {
    /// Blended base score, clamped to `[65, 98]`.
    #[must_use]
    pub fn base_score(image_id: &str, detection: Option<&FaceDetection>) -> f64 {
        let blended = feature_score(detection) * 0.6 + hash_score(stable_hash(image_id)) * 0.4;
        blended.round().clamp(BASE_MIN, BASE_MAX)
    }

    /// Generates the assessment for `image_id`.
    #[must_use]
    pub fn generate(image_id: &str, detection: Option<&FaceDetection>) -> StructuredAssessment {
        let hash = stable_hash(image_id);
        let base = Self::base_score(image_id, detection);

        let skin_analysis = SkinAnalysis {
            skin_type: pick(SKIN_TYPES, hash >> 3).to_string(),
            skin_tone: pick(SKIN_TONES, hash >> 7).to_string(),
            texture_score: base - 2.0,
            clarity_score: base + 1.0,
            hydration_level: base - 4.0,
            pore_visibility: (105.0 - base).clamp(5.0, 40.0),
            evenness: base - 1.0,
            concerns: concerns(hash, base),
        };

        let acne_risk = if base >= 85.0 {
            "Low"
        } else if base >= 75.0 {
            pick(&["Low", "Medium"], hash >> 11)
        } else {
            "Medium"
        };
        let skin_health = if base >= 88.0 {
            "Excellent"
        } else if base >= 78.0 {
            "Good"
        } else {
            "Fair"
        };
        let aging_signs = if base >= 88.0 {
            Vec::new()
        } else {
            vec![pick(AGING_SIGNS, hash >> 19).to_string()]
        };

        let start = index(RECOMMENDATIONS.len(), hash >> 21);
        let professional_recommendations = [0, 1, 3]
            .iter()
            .map(|offset| RECOMMENDATIONS[(start + offset) % RECOMMENDATIONS.len()].to_string())
            .collect();

        let confidence = detection.map_or(0.65, |d| 0.65 + d.confidence.clamp(0.0, 1.0) * 0.15);

        StructuredAssessment {
            skin_analysis,
            dermatology_assessment: DermatologyAssessment {
                acne_risk: acne_risk.to_string(),
                aging_signs,
                skin_health: skin_health.to_string(),
                conditions: Vec::new(),
            },
            beauty_scores: BeautyScores {
                overall_score: base,
                facial_harmony: base - 3.0,
                skin_glow: base + 2.0,
            },
            professional_recommendations,
            confidence,
        }
        .clamped()
    }
}

/// Two distinct concerns, or one for high scores.
fn concerns(hash: u32, base: f64) -> Vec<String> {
    let n = CONCERNS.len();
    let first = index(n, hash >> 13);
    if base >= 90.0 {
        return vec![CONCERNS[first].to_string()];
    }
    let second = (first + 1 + index(n - 1, hash >> 17)) % n;
    vec![CONCERNS[first].to_string(), CONCERNS[second].to_string()]
}

fn index(len: usize, bits: u32) -> usize {
    bits as usize % len
}

fn pick<'a>(options: &[&'a str], bits: u32) -> &'a str {
    options[index(options.len(), bits)]
}
