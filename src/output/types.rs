//! Data structures reported at the end of a run
//!
//! `FilterStats` is what one filtering pass returns; `RunSummary` is the
//! serialized record of the whole run.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::utils::bed::BreakpointWindows;

/// Counters and calls from one filtering pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FilterStats {
    /// Well-formed data lines examined
    pub total_variants: u64,

    /// Data lines that passed the ITD rule and were written
    pub itd_variants: u64,

    /// One entry per emitted record
    pub calls: Vec<ItdCall>,
}

/// Short description of an emitted ITD record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ItdCall {
    pub chrom: String,

    /// 1-based VCF position
    pub position: u64,

    pub id: String,

    pub ref_length: usize,

    pub alt_length: usize,
}

/// Outcome of the external caller
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CallerReport {
    /// Shell command line that was run
    pub command: String,

    /// Process exit code, absent if killed by a signal
    pub exit_code: Option<i32>,

    pub success: bool,
}

/// Top-level run summary
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RunSummary {
    /// Tool version
    pub version: String,

    /// Timestamp of analysis (ISO 8601 format)
    pub timestamp: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub genome_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub windows: Option<BreakpointWindows>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<CallerReport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterStats>,
}
