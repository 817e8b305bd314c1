//! Validate command - check photos against the gate without scoring.

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{build_pipeline, interrupt_token, ExitCode, PhotoArgs, ServiceArgs};
use crate::config::AppConfig;
use crate::output::JsonOutput;

/// Arguments for the validate command.
#[derive(Args, Clone, Debug, Default)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub photos: PhotoArgs,

    #[command(flatten)]
    pub services: ServiceArgs,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Run the validate command.
///
/// Prints one verdict per photo, front first. Exits with
/// [`ExitCode::FaceNotDetected`] when the front photo fails.
pub async fn run(args: &ValidateArgs, config: &AppConfig) -> Result<ExitCode> {
    let images = args.photos.image_set()?;
    let services = args.services.clone().with_config(config);
    let pretty = args.pretty || config.output.pretty.unwrap_or(false);

    let verdicts = build_pipeline(config, &services)
        .validate(&images, &interrupt_token())
        .await?;

    for verdict in &verdicts {
        info!("{} photo: {verdict}", verdict.angle);
    }
    JsonOutput::stdout(pretty).write_verdicts(&verdicts)?;

    let front_passed = verdicts.first().is_some_and(glow_core::ValidationVerdict::passed);
    Ok(if front_passed {
        ExitCode::Success
    } else {
        ExitCode::FaceNotDetected
    })
}
