//! JSON output adapter.

use anyhow::Result;
use glow_core::{AnalysisResult, ResultOutput, ValidationVerdict};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Mutex;

/// JSON output adapter.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    pretty: bool,
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout(pretty: bool) -> Self {
        Self::new(Box::new(io::stdout()), pretty)
    }

    /// Creates a new JSON output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>, pretty: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            pretty,
        }
    }

    /// Writes validation verdicts as a JSON array.
    pub fn write_verdicts(&self, verdicts: &[ValidationVerdict]) -> Result<()> {
        self.write_value(verdicts)
    }

    #[allow(clippy::significant_drop_tightening)]
    fn write_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }
}

impl ResultOutput for JsonOutput {
    fn write(&self, result: &AnalysisResult) -> Result<()> {
        self.write_value(result)
    }

    #[allow(clippy::significant_drop_tightening)]
    fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writer.flush()?;
        Ok(())
    }
}
