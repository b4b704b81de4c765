//! Builder for the run summary

use std::fs::File;
use std::path::Path;

use crate::error::{ItdError, Result};
use crate::utils::bed::BreakpointWindows;

use super::types::{CallerReport, FilterStats, RunSummary};

/// Collects the pieces of a run into a `RunSummary`
pub struct OutputCollector {
    output: RunSummary,
}

impl OutputCollector {
    /// Create a new collector stamped with version and timestamp
    pub fn new() -> Self {
        Self {
            output: RunSummary {
                version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: crate::utils::time::utc_now_iso8601(),
                ..Default::default()
            },
        }
    }

    pub fn with_sample(mut self, sample_name: &str, genome_version: &str) -> Self {
        self.output.sample_name = Some(sample_name.to_string());
        self.output.genome_version = Some(genome_version.to_string());
        self
    }

    pub fn with_windows(mut self, windows: BreakpointWindows) -> Self {
        self.output.windows = Some(windows);
        self
    }

    pub fn with_caller(mut self, report: CallerReport) -> Self {
        self.output.caller = Some(report);
        self
    }

    pub fn with_filter(mut self, stats: FilterStats) -> Self {
        self.output.filter = Some(stats);
        self
    }

    /// Build and return the final summary
    pub fn build(self) -> RunSummary {
        self.output
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        self.output.write_json(path)
    }
}

impl Default for OutputCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSummary {
    /// Write this summary as pretty JSON, validating it first when enabled
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if super::schema::enabled()
            && let Err(e) = super::schema::validate(self)
        {
            log::warn!("{} ({})", e, path.display());
            if cfg!(debug_assertions) {
                return Err(e);
            }
        }
        let file = File::create(path).map_err(|e| ItdError::io(e, path))?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| ItdError::io(std::io::Error::other(e), path))
    }
}
