//! Generative assessment provider port.

use async_trait::async_trait;

use crate::domain::{AssessmentPrompt, ServiceError};

/// Port for one generative-text provider.
///
/// Each provider normalizes its own response shape to plain completion text.
#[async_trait]
pub trait AssessmentProvider: Send + Sync {
    /// Provider name used in logs and in the assessment source.
    fn name(&self) -> &str;

    /// Sends one completion request.
    ///
    /// # Errors
    ///
    /// Returns a transient or permanent [`ServiceError`] if the call failed.
    async fn complete(&self, prompt: &AssessmentPrompt) -> Result<String, ServiceError>;
}
