//! Prompt payload sent to generative providers.

use super::EncodedImage;

/// Provider-neutral assessment request.
///
/// Providers map this onto their own wire shape. Text-only providers ignore
/// `image`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentPrompt {
    /// Instructions and the expected JSON schema.
    pub system: String,
    /// Per-angle detection context.
    pub user: String,
    /// Front photo for vision-capable providers.
    pub image: Option<EncodedImage>,
}
