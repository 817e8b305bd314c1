//! Output ports for finished analyses.

use crate::domain::{AnalysisResult, HistoryEntry};

/// Port for outputting analysis results.
pub trait ResultOutput: Send + Sync {
    /// Writes a single analysis result.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write(&self, result: &AnalysisResult) -> anyhow::Result<()>;

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&self) -> anyhow::Result<()>;
}

/// Port for the history collaborator, which stores trimmed results.
pub trait HistoryStore: Send + Sync {
    /// Appends one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be stored.
    fn record(&self, entry: &HistoryEntry) -> anyhow::Result<()>;
}
