//! Analyze command - score a photo set.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use glow_adapters::JsonlHistoryStore;
use glow_core::{AnalysisError, AnalysisResult, HistoryEntry, HistoryStore, ResultOutput};
use tracing::{info, warn};

use super::{build_pipeline, interrupt_token, ExitCode, PhotoArgs, ServiceArgs};
use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressBar};

/// Arguments for the analyze command.
#[derive(Args, Clone, Debug, Default)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub photos: PhotoArgs,

    #[command(flatten)]
    pub services: ServiceArgs,

    /// Append a trimmed entry to this JSON Lines history file
    #[arg(long, value_name = "FILE")]
    pub history: Option<PathBuf>,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl AnalyzeArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.services = self.services.with_config(config);
        if self.history.is_none() {
            self.history.clone_from(&config.output.history);
        }
        if !self.pretty {
            self.pretty = config.output.pretty.unwrap_or(false);
        }
        if !self.progress {
            self.progress = config.output.progress.unwrap_or(false);
        }
        self
    }
}

/// Run the analyze command.
///
/// Expects `args` to have been processed through `with_config()` first.
pub async fn run(args: &AnalyzeArgs, config: &AppConfig) -> Result<ExitCode> {
    let images = args.photos.image_set()?;
    info!("Running analyze command on {} photo(s)", 1 + images.profiles().count());

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress = Arc::new(ProgressBar::new(args.quiet, show_progress));
    let pipeline = build_pipeline(config, &args.services).with_progress(progress);
    let output = JsonOutput::stdout(args.pretty);

    let result = match pipeline.analyze(&images, &interrupt_token()).await {
        Ok(result) => result,
        Err(e @ AnalysisError::FaceNotDetected(_)) => {
            eprintln!("error: {e}");
            return Ok(ExitCode::FaceNotDetected);
        }
        Err(e) => return Err(e.into()),
    };

    let store = args.history.as_ref().map(JsonlHistoryStore::new);
    publish(
        &result,
        &output,
        store.as_ref().map(|s| s as &dyn HistoryStore),
    )?;

    Ok(ExitCode::Success)
}

/// Writes `result` and records its trimmed entry in `history`.
///
/// A history failure is logged, not returned.
pub fn publish(
    result: &AnalysisResult,
    output: &dyn ResultOutput,
    history: Option<&dyn HistoryStore>,
) -> Result<()> {
    output.write(result)?;
    output.flush()?;

    if let Some(store) = history {
        if let Err(e) = store.record(&HistoryEntry::from(result)) {
            warn!("Failed to record history: {e:#}");
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use glow_core::{
        AnalysisPipeline, AssessmentProvider, GenerativeAssessmentClient, ImageSet,
    };
    use glow_test_support::{
        assessment_json, DetectionBuilder, MockFaceDetector, MockHistoryStore, MockImageCodec,
        MockResultOutput, ScriptedProvider,
    };
    use tokio_util::sync::CancellationToken;

    async fn analyzed() -> AnalysisResult {
        let provider: Arc<dyn AssessmentProvider> =
            Arc::new(ScriptedProvider::always("primary", &assessment_json(90)));
        AnalysisPipeline::new(
            Arc::new(MockImageCodec::new()),
            Arc::new(MockFaceDetector::new().with_face(DetectionBuilder::front().build())),
            GenerativeAssessmentClient::new(vec![provider]),
        )
        .analyze(&ImageSet::front("front.jpg"), &CancellationToken::new())
        .await
        .unwrap()
    }

    struct BrokenStore;

    impl HistoryStore for BrokenStore {
        fn record(&self, _entry: &HistoryEntry) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[tokio::test]
    async fn test_publish_writes_and_records() {
        let result = analyzed().await;
        let output = MockResultOutput::new();
        let history = MockHistoryStore::new();

        publish(&result, &output, Some(&history)).unwrap();

        assert_eq!(output.results(), vec![result.clone()]);
        assert_eq!(output.flush_count(), 1);
        let entries = history.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].overall_score, result.overall_score);
        assert_eq!(entries[0].timestamp, result.timestamp);
    }

    #[tokio::test]
    async fn test_publish_without_history() {
        let result = analyzed().await;
        let output = MockResultOutput::new();

        publish(&result, &output, None).unwrap();

        assert_eq!(output.results().len(), 1);
    }

    #[tokio::test]
    async fn test_history_failure_does_not_fail_publish() {
        let result = analyzed().await;
        let output = MockResultOutput::new();

        publish(&result, &output, Some(&BrokenStore)).unwrap();

        assert_eq!(output.results().len(), 1);
        assert_eq!(output.flush_count(), 1);
    }
}
