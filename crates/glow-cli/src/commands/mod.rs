//! CLI command definitions and handlers.

pub mod analyze;
pub mod validate;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glow_adapters::{
    ChatCompletionsProvider, DetectionConfig, FsImageCodec, MessagesProvider, ProviderConfig,
    VisionFaceDetector, DEFAULT_VISION_ENDPOINT,
};
use glow_core::{
    AnalysisPipeline, AssessmentProvider, FaceValidationGate, GateConfig,
    GenerativeAssessmentClient, ImageSet, NamedOrder, RetryPolicy,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{AppConfig, ServiceConfig};

/// Glow Score - Multi-angle facial glow analysis
#[derive(Parser)]
#[command(name = "glow-score")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared analyze arguments (photos, services, flags).
    #[command(flatten)]
    pub analyze: analyze::AnalyzeArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a photo set and print the glow score
    Analyze(analyze::AnalyzeArgs),
    /// Check whether photos are usable without scoring them
    Validate(validate::ValidateArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Analysis produced a result.
    Success = 0,
    /// The front photo has no usable face.
    FaceNotDetected = 1,
    /// Any other failure.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}

/// Photos of one analysis run.
#[derive(Args, Clone, Debug, Default)]
pub struct PhotoArgs {
    /// Front-facing photo (file path or data: URI)
    #[arg(value_name = "FRONT")]
    pub front: Option<String>,

    /// Left profile photo
    #[arg(long, value_name = "PHOTO")]
    pub left: Option<String>,

    /// Right profile photo
    #[arg(long, value_name = "PHOTO")]
    pub right: Option<String>,
}

impl PhotoArgs {
    /// Builds the image set, front first.
    pub fn image_set(&self) -> Result<ImageSet> {
        let front = self
            .front
            .as_deref()
            .context("No front photo specified. Use --help for usage information.")?;
        let mut images = ImageSet::front(front);
        if let Some(left) = &self.left {
            images = images.with_left(left.as_str());
        }
        if let Some(right) = &self.right {
            images = images.with_right(right.as_str());
        }
        Ok(images)
    }
}

/// Parse and validate a confidence value (0.0-1.0).
fn parse_confidence(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0.0..=1.0"))
    }
}

/// Service overrides shared by every command.
#[derive(Args, Clone, Debug, Default)]
pub struct ServiceArgs {
    /// Face detection base URL (overrides config)
    #[arg(long, value_name = "URL")]
    pub detection_endpoint: Option<String>,

    /// Primary assessment provider URL (overrides config)
    #[arg(long, value_name = "URL")]
    pub primary_endpoint: Option<String>,

    /// Alternate assessment provider URL (overrides config)
    #[arg(long, value_name = "URL")]
    pub alternate_endpoint: Option<String>,

    /// Minimum front detection confidence (0.0-1.0)
    #[arg(long, value_parser = parse_confidence)]
    pub min_confidence: Option<f64>,
}

impl ServiceArgs {
    /// Apply configuration file values, respecting CLI precedence.
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.detection_endpoint = self
            .detection_endpoint
            .or_else(|| config.detection.endpoint.clone());
        self.primary_endpoint = self
            .primary_endpoint
            .or_else(|| config.primary.endpoint.clone());
        self.alternate_endpoint = self
            .alternate_endpoint
            .or_else(|| config.alternate.endpoint.clone());
        self.min_confidence = self.min_confidence.or(config.gate.min_front_confidence);
        self
    }
}

fn timeout(service: &ServiceConfig, default_secs: u64) -> Duration {
    Duration::from_secs(service.timeout_secs.unwrap_or(default_secs))
}

fn provider_config(name: &str, endpoint: &str, service: &ServiceConfig) -> ProviderConfig {
    let mut config = ProviderConfig::new(
        name,
        endpoint,
        service.api_key.clone().unwrap_or_default(),
    );
    config.model.clone_from(&service.model);
    config.timeout = timeout(service, 30);
    if let Some(max_tokens) = service.max_tokens {
        config.max_tokens = max_tokens;
    }
    if let Some(temperature) = service.temperature {
        config.temperature = temperature;
    }
    config
}

/// Wires adapters and settings into a pipeline.
///
/// `services` must already have been merged with `config`.
pub fn build_pipeline(config: &AppConfig, services: &ServiceArgs) -> AnalysisPipeline {
    let detection_timeout = timeout(&config.detection, 15);
    let detector = VisionFaceDetector::new(DetectionConfig {
        endpoint: services
            .detection_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_VISION_ENDPOINT.to_string()),
        api_key: config.detection.api_key.clone().unwrap_or_default(),
        timeout: detection_timeout,
    });

    let mut providers: Vec<Arc<dyn AssessmentProvider>> = Vec::new();
    if let Some(endpoint) = &services.primary_endpoint {
        providers.push(Arc::new(MessagesProvider::new(provider_config(
            "primary",
            endpoint,
            &config.primary,
        ))));
    }
    if let Some(endpoint) = &services.alternate_endpoint {
        providers.push(Arc::new(ChatCompletionsProvider::new(provider_config(
            "alternate",
            endpoint,
            &config.alternate,
        ))));
    }
    if providers.is_empty() {
        warn!("No assessment provider configured; results will use the offline estimate");
    }

    let mut retry = RetryPolicy::default();
    if let Some(attempts) = config.assessment.max_attempts {
        retry = retry.with_max_attempts(attempts);
    }
    let mut generative = GenerativeAssessmentClient::new(providers).with_retry_policy(retry);
    if let Some(order) = &config.assessment.provider_order {
        debug!("Provider order: {order:?}");
        generative = generative.with_strategy(NamedOrder::new(order.iter().cloned()));
    }

    let mut gate = GateConfig::default();
    if let Some(min) = services.min_confidence {
        gate.front.min_confidence = min;
    }
    if let Some(min) = config.gate.min_profile_confidence {
        gate.profile.min_confidence = min;
    }
    if let Some(side) = config.gate.min_face_size {
        gate.front.min_face_side = side;
    }

    AnalysisPipeline::new(Arc::new(FsImageCodec::new()), Arc::new(detector), generative)
        .with_gate(FaceValidationGate::new(gate))
        .with_detection_retry(RetryPolicy::single(detection_timeout))
}

/// Returns a token cancelled on Ctrl-C.
pub fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling analysis");
            trigger.cancel();
        }
    });
    token
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use glow_core::Angle;

    #[test]
    fn test_image_set_requires_front() {
        let err = PhotoArgs::default().image_set().unwrap_err();
        assert!(err.to_string().contains("No front photo specified"));
    }

    #[test]
    fn test_image_set_with_profiles() {
        let args = PhotoArgs {
            front: Some("f.jpg".into()),
            left: None,
            right: Some("r.jpg".into()),
        };
        let images = args.image_set().unwrap();
        assert!(images.is_multi_angle());
        let angles: Vec<_> = images.profiles().map(|(a, _)| a).collect();
        assert_eq!(angles, vec![Angle::Right]);
    }

    #[test]
    fn test_cli_overrides_config() {
        let config: AppConfig = toml::from_str(
            r#"
[detection]
endpoint = "https://config.example.com"

[primary]
endpoint = "https://primary.example.com"

[gate]
min_front_confidence = 0.6
"#,
        )
        .unwrap();
        let args = ServiceArgs {
            detection_endpoint: Some("http://127.0.0.1:9000".into()),
            min_confidence: Some(0.8),
            ..ServiceArgs::default()
        }
        .with_config(&config);

        assert_eq!(args.detection_endpoint.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(args.primary_endpoint.as_deref(), Some("https://primary.example.com"));
        assert_eq!(args.alternate_endpoint, None);
        assert_eq!(args.min_confidence, Some(0.8));
    }

    #[test]
    fn test_parse_confidence() {
        assert_eq!(parse_confidence("0.5"), Ok(0.5));
        assert!(parse_confidence("1.5").is_err());
        assert!(parse_confidence("high").is_err());
    }

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success as u8, 0);
        assert_eq!(ExitCode::FaceNotDetected as u8, 1);
        assert_eq!(ExitCode::Error as u8, 2);
    }
}
