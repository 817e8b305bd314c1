//! Analysis result types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lower bound of every detailed score.
pub const DETAIL_MIN: u8 = 60;
/// Upper bound of every detailed score.
pub const DETAIL_MAX: u8 = 98;

/// Complete analysis result returned to collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Glow score (0-100).
    pub overall_score: u8,
    /// Label derived from the overall score.
    pub rating: Rating,
    /// Named sub-metrics, each within `DETAIL_MIN..=DETAIL_MAX`.
    pub detailed_scores: DetailedScores,
    /// Skin and dermatology observations.
    pub dermatology_insights: DermatologyInsights,
    /// Advice for the user.
    pub personalized_tips: Vec<String>,
    /// Confidence in the result (0.0 to 1.0).
    pub confidence: f64,
    /// Timestamp of analysis (RFC 3339).
    pub timestamp: String,
    /// Reference to the front photo.
    pub image_uri: String,
}

/// Score band label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Outstanding,
    Amazing,
    Excellent,
    Great,
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    Fair,
}

impl Rating {
    /// Maps an overall score onto its band.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        match score {
            90.. => Self::Outstanding,
            85..=89 => Self::Amazing,
            80..=84 => Self::Excellent,
            75..=79 => Self::Great,
            70..=74 => Self::VeryGood,
            60..=69 => Self::Good,
            _ => Self::Fair,
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Outstanding => "Outstanding",
            Self::Amazing => "Amazing",
            Self::Excellent => "Excellent",
            Self::Great => "Great",
            Self::VeryGood => "Very Good",
            Self::Good => "Good",
            Self::Fair => "Fair",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The eight named sub-metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedScores {
    pub facial_symmetry: u8,
    pub skin_glow: u8,
    pub skin_clarity: u8,
    pub hydration: u8,
    pub texture: u8,
    pub even_tone: u8,
    pub pore_refinement: u8,
    pub skin_health: u8,
}

impl DetailedScores {
    /// Returns `(name, score)` pairs in declaration order.
    #[must_use]
    pub const fn entries(&self) -> [(&'static str, u8); 8] {
        [
            ("facialSymmetry", self.facial_symmetry),
            ("skinGlow", self.skin_glow),
            ("skinClarity", self.skin_clarity),
            ("hydration", self.hydration),
            ("texture", self.texture),
            ("evenTone", self.even_tone),
            ("poreRefinement", self.pore_refinement),
            ("skinHealth", self.skin_health),
        ]
    }
}

/// How the assessment behind a result was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisAccuracy {
    /// Generative assessment with profile photos.
    Enhanced,
    /// Generative assessment from the front photo only.
    Standard,
    /// Deterministic fallback assessment.
    Fallback,
}

/// Skin and dermatology observations carried into the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DermatologyInsights {
    pub skin_type: String,
    pub skin_tone: String,
    pub acne_risk: String,
    pub skin_health: String,
    pub concerns: Vec<String>,
    pub aging_signs: Vec<String>,
    pub analysis_accuracy: AnalysisAccuracy,
    pub multi_angle: bool,
}

/// Trimmed result handed to the history collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub overall_score: u8,
    pub rating: Rating,
    pub detailed_scores: DetailedScores,
    pub confidence: f64,
    pub analysis_accuracy: AnalysisAccuracy,
    pub timestamp: String,
}

impl From<&AnalysisResult> for HistoryEntry {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            overall_score: result.overall_score,
            rating: result.rating,
            detailed_scores: result.detailed_scores,
            confidence: result.confidence,
            analysis_accuracy: result.dermatology_insights.analysis_accuracy,
            timestamp: result.timestamp.clone(),
        }
    }
}
