//! Structured skin assessment schema shared by the generative and fallback paths.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ParseError;

/// Top-level keys of the assessment object.
const SECTION_KEYS: &[&str] = &[
    "skinAnalysis",
    "dermatologyAssessment",
    "beautyScores",
    "professionalRecommendations",
    "confidence",
];

/// Skin analysis keys that are hoisted when a model returns them at top level.
const SKIN_ANALYSIS_KEYS: &[&str] = &[
    "skinType",
    "skinTone",
    "textureScore",
    "clarityScore",
    "hydrationLevel",
    "poreVisibility",
    "evenness",
    "concerns",
    "tags",
];

/// Where an assessment came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssessmentSource {
    /// Parsed from a generative provider's output.
    Generative {
        /// Name of the provider that answered.
        provider: String,
    },
    /// Synthesized by the deterministic fallback.
    Fallback {
        /// Why the generative path was abandoned.
        reason: String,
    },
}

impl AssessmentSource {
    /// True for the deterministic fallback.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// An assessment together with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentOutcome {
    pub assessment: StructuredAssessment,
    pub source: AssessmentSource,
}

impl AssessmentOutcome {
    /// Outcome parsed from a provider's answer.
    #[must_use]
    pub fn generative(assessment: StructuredAssessment, provider: impl Into<String>) -> Self {
        Self {
            assessment,
            source: AssessmentSource::Generative {
                provider: provider.into(),
            },
        }
    }

    /// Outcome synthesized by the fallback generator.
    #[must_use]
    pub fn fallback(assessment: StructuredAssessment, reason: impl Into<String>) -> Self {
        Self {
            assessment,
            source: AssessmentSource::Fallback {
                reason: reason.into(),
            },
        }
    }
}

/// Confidence assumed when a model omits it.
const DEFAULT_CONFIDENCE: f64 = 0.8;

/// Parsed assessment, produced by the sanitizer or the fallback generator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructuredAssessment {
    pub skin_analysis: SkinAnalysis,
    pub dermatology_assessment: DermatologyAssessment,
    pub beauty_scores: BeautyScores,
    pub professional_recommendations: Vec<String>,
    /// Self-reported confidence (0.0 to 1.0).
    pub confidence: f64,
}

/// Skin characteristics. Scores are 0-100; pore visibility is lower-is-better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SkinAnalysis {
    pub skin_type: String,
    pub skin_tone: String,
    pub texture_score: f64,
    pub clarity_score: f64,
    pub hydration_level: f64,
    pub pore_visibility: f64,
    pub evenness: f64,
    #[serde(alias = "tags")]
    pub concerns: Vec<String>,
}

impl Default for SkinAnalysis {
    fn default() -> Self {
        Self {
            skin_type: "Normal".into(),
            skin_tone: "Medium".into(),
            texture_score: 80.0,
            clarity_score: 80.0,
            hydration_level: 80.0,
            pore_visibility: 25.0,
            evenness: 80.0,
            concerns: Vec::new(),
        }
    }
}

/// Dermatology-oriented observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DermatologyAssessment {
    pub acne_risk: String,
    pub aging_signs: Vec<String>,
    pub skin_health: String,
    pub conditions: Vec<String>,
}

impl Default for DermatologyAssessment {
    fn default() -> Self {
        Self {
            acne_risk: "Low".into(),
            aging_signs: Vec::new(),
            skin_health: "Good".into(),
            conditions: Vec::new(),
        }
    }
}

/// Aesthetic scores (0-100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BeautyScores {
    pub overall_score: f64,
    pub facial_harmony: f64,
    pub skin_glow: f64,
}

impl Default for BeautyScores {
    fn default() -> Self {
        Self {
            overall_score: 80.0,
            facial_harmony: 80.0,
            skin_glow: 80.0,
        }
    }
}

impl StructuredAssessment {
    /// Builds an assessment from loosely shaped JSON.
    ///
    /// The value must be an object carrying at least one known key. Skin
    /// analysis fields found at top level are moved under `skinAnalysis`.
    /// Missing fields take neutral defaults and every number is clamped.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Schema`] if the value is not a recognizable
    /// assessment or a field has the wrong type.
    pub fn from_value(value: Value) -> Result<Self, ParseError> {
        let Value::Object(mut object) = value else {
            return Err(ParseError::Schema("assessment is not a JSON object".into()));
        };

        let known = object
            .keys()
            .any(|k| SECTION_KEYS.contains(&k.as_str()) || SKIN_ANALYSIS_KEYS.contains(&k.as_str()));
        if !known {
            return Err(ParseError::Schema("no assessment fields present".into()));
        }

        hoist_skin_fields(&mut object);
        let has_confidence = object.contains_key("confidence");

        let mut assessment: Self = serde_json::from_value(Value::Object(object))
            .map_err(|e| ParseError::Schema(e.to_string()))?;
        if !has_confidence {
            assessment.confidence = DEFAULT_CONFIDENCE;
        }
        Ok(assessment.clamped())
    }

    /// Returns a copy with every score forced into its valid range.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        let s = &mut self.skin_analysis;
        for score in [
            &mut s.texture_score,
            &mut s.clarity_score,
            &mut s.hydration_level,
            &mut s.pore_visibility,
            &mut s.evenness,
        ] {
            *score = score.clamp(0.0, 100.0);
        }
        let b = &mut self.beauty_scores;
        for score in [&mut b.overall_score, &mut b.facial_harmony, &mut b.skin_glow] {
            *score = score.clamp(0.0, 100.0);
        }
        self.confidence = self.confidence.clamp(0.0, 1.0);
        self
    }
}

/// Moves top-level skin analysis keys into the `skinAnalysis` section.
///
/// A value already present in the section is kept.
fn hoist_skin_fields(object: &mut Map<String, Value>) {
    let stray: Vec<(&str, Value)> = SKIN_ANALYSIS_KEYS
        .iter()
        .filter_map(|k| object.remove(*k).map(|v| (*k, v)))
        .collect();
    if stray.is_empty() {
        return;
    }

    let section = object
        .entry("skinAnalysis")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(section) = section {
        for (key, value) in stray {
            // `tags` is an alias of `concerns`
            if key == "tags" && section.contains_key("concerns") {
                continue;
            }
            section.entry(key).or_insert(value);
        }
    }
}
