//! Generative assessment client.
//!
//! Tries each configured provider in the order chosen by a
//! [`ProviderStrategy`]. Every provider gets its own retry budget; the first
//! completion wins.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{AssessmentPrompt, ServiceError};
use crate::ports::AssessmentProvider;
use crate::retry::RetryPolicy;

/// Decides the order in which providers are tried.
pub trait ProviderStrategy: Send + Sync + fmt::Debug {
    /// Returns indices into `providers`, most preferred first. Indices not
    /// returned are skipped.
    fn order(&self, providers: &[Arc<dyn AssessmentProvider>], prompt: &AssessmentPrompt)
        -> Vec<usize>;
}

/// Tries providers in registration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct InOrder;

impl ProviderStrategy for InOrder {
    fn order(
        &self,
        providers: &[Arc<dyn AssessmentProvider>],
        _prompt: &AssessmentPrompt,
    ) -> Vec<usize> {
        (0..providers.len()).collect()
    }
}

/// Tries providers by name in the given order; unnamed providers are skipped.
#[derive(Debug, Clone, Default)]
pub struct NamedOrder {
    names: Vec<String>,
}

impl NamedOrder {
    /// Creates a strategy from provider names.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ProviderStrategy for NamedOrder {
    fn order(
        &self,
        providers: &[Arc<dyn AssessmentProvider>],
        _prompt: &AssessmentPrompt,
    ) -> Vec<usize> {
        self.names
            .iter()
            .filter_map(|name| providers.iter().position(|p| p.name() == name))
            .collect()
    }
}

/// Raw completion and the provider that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Name of the answering provider.
    pub provider: String,
    /// Unparsed completion text.
    pub text: String,
}

/// Client over an ordered set of generative providers.
pub struct GenerativeAssessmentClient {
    providers: Vec<Arc<dyn AssessmentProvider>>,
    strategy: Box<dyn ProviderStrategy>,
    retry: RetryPolicy,
}

impl fmt::Debug for GenerativeAssessmentClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("GenerativeAssessmentClient")
            .field("providers", &names)
            .field("strategy", &self.strategy)
            .field("retry", &self.retry)
            .finish()
    }
}

impl GenerativeAssessmentClient {
    /// Creates a client trying `providers` in order with the default retry
    /// policy (3 attempts, linear 1 s backoff).
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn AssessmentProvider>>) -> Self {
        Self {
            providers,
            strategy: Box::new(InOrder),
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the provider ordering strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl ProviderStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Replaces the per-provider retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// True if no provider is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Requests a completion, escalating to the next provider when one is
    /// exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Cancelled`] as soon as `cancel` fires, or the
    /// last provider's failure when every provider is exhausted.
    pub async fn request(
        &self,
        prompt: &AssessmentPrompt,
        cancel: &CancellationToken,
    ) -> Result<Completion, ServiceError> {
        let order = self.strategy.order(&self.providers, prompt);
        let mut last_error = ServiceError::permanent("no assessment provider configured");

        for provider in order.iter().filter_map(|&i| self.providers.get(i)) {
            let label = format!("{} assessment", provider.name());
            debug!("Requesting assessment from {}", provider.name());

            match self.retry.run(&label, cancel, |_| provider.complete(prompt)).await {
                Ok(text) => {
                    info!("Assessment received from {}", provider.name());
                    return Ok(Completion {
                        provider: provider.name().to_string(),
                        text,
                    });
                }
                Err(ServiceError::Cancelled) => return Err(ServiceError::Cancelled),
                Err(err) => {
                    warn!("Provider {} exhausted: {err}", provider.name());
                    last_error = err;
                }
            }
        }

        Err(last_error)
    }
}
