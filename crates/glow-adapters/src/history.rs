//! Append-only JSON Lines history of finished analyses.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glow_core::{HistoryEntry, HistoryStore};
use tracing::debug;

/// [`HistoryStore`] writing one JSON object per line.
#[derive(Debug, Clone)]
pub struct JsonlHistoryStore {
    path: PathBuf,
}

impl JsonlHistoryStore {
    /// Creates a store appending to `path`. The file and its parent
    /// directory are created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The history file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every stored entry, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a line is not an entry.
    pub fn load(&self) -> Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read history: {}", self.path.display()))?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("Invalid history entry on line {}", i + 1))
            })
            .collect()
    }
}

impl HistoryStore for JsonlHistoryStore {
    fn record(&self, entry: &HistoryEntry) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open history: {}", self.path.display()))?;
        writeln!(file, "{line}")?;
        debug!("Recorded history entry in {}", self.path.display());
        Ok(())
    }
}
