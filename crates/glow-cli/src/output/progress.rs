//! Progress bar adapter using indicatif.

use glow_core::{ProgressEvent, ProgressSink};
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};

/// Number of pipeline steps reported by [`ProgressEvent`].
const STEPS: u64 = 4;

/// Progress bar adapter for CLI output.
pub struct ProgressBar {
    bar: Option<IndicatifBar>,
    quiet: bool,
}

impl ProgressBar {
    /// Creates a new progress bar.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, suppress all output
    /// * `show_bar` - If true, show progress bar; otherwise show per-step warnings only
    #[must_use]
    pub fn new(quiet: bool, show_bar: bool) -> Self {
        if quiet {
            return Self {
                bar: None,
                quiet: true,
            };
        }

        let bar = show_bar.then(|| {
            let bar = IndicatifBar::new(STEPS);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:20.cyan/blue}] {msg}")
            {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar.set_message("detecting faces");
            bar
        });

        Self { bar, quiet }
    }

    fn step(&self, message: String) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
            bar.set_message(message);
        }
    }
}

impl ProgressSink for ProgressBar {
    fn on_event(&self, event: ProgressEvent) {
        if self.quiet {
            return;
        }

        match event {
            ProgressEvent::DetectionCompleted { angles } => {
                self.step(format!("faces found in {} photo(s)", angles.len()));
            }
            ProgressEvent::ValidationPassed { accepted, dropped } => {
                for verdict in &dropped {
                    eprintln!("WARN: Ignoring {} photo: {verdict}", verdict.angle);
                }
                self.step(format!("assessing {} angle(s)", accepted.len()));
            }
            ProgressEvent::AssessmentCompleted { source } => {
                if source.is_fallback() {
                    eprintln!("WARN: Assessment service unavailable, using offline estimate");
                }
                self.step("scoring".to_string());
            }
            ProgressEvent::SynthesisCompleted { overall_score } => {
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                    bar.finish_with_message(format!("Done: glow score {overall_score}"));
                }
            }
        }
    }
}
