//! Configuration for the FGFR1 ITD pipeline.
//!
//! This module provides structs and loading functions for:
//! - External caller settings (VarDict tool paths, SV thresholds, failure policy)
//! - ITD filter thresholds and breakpoint exon labels

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{ItdError, Result};

// ============================================================================
// Caller Configuration
// ============================================================================

/// What to do when the external variant caller exits unsuccessfully
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CallerFailurePolicy {
    /// Stop the run before filtering
    Abort,
    /// Log the failure and filter whatever output exists (default)
    #[default]
    BestEffort,
}

/// VarDict invocation settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CallerConfig {
    #[serde(default = "default_vardict")]
    pub vardict: String,
    #[serde(default = "default_teststrandbias")]
    pub teststrandbias: String,
    #[serde(default = "default_var2vcf")]
    pub var2vcf: String,
    /// Minimum structural variant length (VarDict `-L`)
    #[serde(default = "default_min_sv_length")]
    pub min_sv_length: u32,
    /// Nucleotides to extend each region by (VarDict `-x`)
    #[serde(default = "default_extension_length")]
    pub extension_length: u32,
    #[serde(default = "default_min_vaf")]
    pub min_vaf: f64,
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default)]
    pub failure_policy: CallerFailurePolicy,
}

fn default_vardict() -> String { "~/biotools/vardict".to_string() }
fn default_teststrandbias() -> String { "~/biotools/vardict_app/bin/teststrandbias.R".to_string() }
fn default_var2vcf() -> String { "~/biotools/vardict_app/bin/var2vcf_valid.pl".to_string() }
fn default_min_sv_length() -> u32 { 7000 }
fn default_extension_length() -> u32 { 6000 }
fn default_min_vaf() -> f64 { 0.01 }
fn default_threads() -> usize { 4 }

impl Default for CallerConfig {
    fn default() -> Self {
        Self {
            vardict: default_vardict(),
            teststrandbias: default_teststrandbias(),
            var2vcf: default_var2vcf(),
            min_sv_length: default_min_sv_length(),
            extension_length: default_extension_length(),
            min_vaf: default_min_vaf(),
            threads: default_threads(),
            failure_policy: CallerFailurePolicy::default(),
        }
    }
}

// ============================================================================
// Filter Configuration
// ============================================================================

/// ITD filter thresholds and the exon labels that define the breakpoint windows
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ItdFilterParams {
    /// Minimum ALT allele length for a record to count as an ITD
    #[serde(default = "default_min_alt_length")]
    pub min_alt_length: usize,
    #[serde(default = "default_five_prime_label")]
    pub five_prime_label: String,
    #[serde(default = "default_three_prime_label")]
    pub three_prime_label: String,
}

fn default_min_alt_length() -> usize { 4000 }
fn default_five_prime_label() -> String { "exon-9-10".to_string() }
fn default_three_prime_label() -> String { "exon-18".to_string() }

impl Default for ItdFilterParams {
    fn default() -> Self {
        Self {
            min_alt_length: default_min_alt_length(),
            five_prime_label: default_five_prime_label(),
            three_prime_label: default_three_prime_label(),
        }
    }
}

// ============================================================================
// Pipeline Configuration
// ============================================================================

/// Main pipeline configuration
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PipelineConfig {
    #[serde(default)]
    pub caller: CallerConfig,
    #[serde(default)]
    pub filter: ItdFilterParams,
    /// Root directory holding `<genome_version>/FGFR1_*.bed`
    #[serde(default = "default_bedfiles_dir")]
    pub bedfiles_dir: PathBuf,
}

fn default_bedfiles_dir() -> PathBuf { PathBuf::from("bedfiles") }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            caller: CallerConfig::default(),
            filter: ItdFilterParams::default(),
            bedfiles_dir: default_bedfiles_dir(),
        }
    }
}

impl PipelineConfig {
    /// Load pipeline configuration from a JSON file
    pub fn load(path: &str) -> Result<Self> {
        let file = File::open(path).map_err(|e| ItdError::io(e, path))?;
        let reader = BufReader::new(file);
        let config: PipelineConfig = serde_json::from_reader(reader)
            .map_err(|e| ItdError::Config(format!("{}: {}", path, e)))?;
        Ok(config)
    }

    /// Load from a file if given, otherwise fall back to defaults
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Reject values the caller or filter cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.caller.min_vaf) {
            return Err(ItdError::Config(format!(
                "min VAF must be between 0 and 1, got {}",
                self.caller.min_vaf
            )));
        }
        if self.caller.threads == 0 {
            return Err(ItdError::Config("thread count must be at least 1".to_string()));
        }
        if self.filter.min_alt_length == 0 {
            return Err(ItdError::Config("min ALT length must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Gene region BED handed to the caller
    pub fn gene_bed(&self, genome_version: &str) -> PathBuf {
        self.bedfiles_dir.join(genome_version).join("FGFR1_gene.bed")
    }

    /// Breakpoint exon BED used to build the filter windows
    pub fn breakpoint_bed(&self, genome_version: &str) -> PathBuf {
        self.bedfiles_dir
            .join(genome_version)
            .join("FGFR1_ITD_breakpoint_exons.bed")
    }
}

/// Path of the `.bai` index expected next to a BAM file
pub fn bam_index_path(bam: &Path) -> PathBuf {
    let s = bam.to_string_lossy();
    let stem = s.strip_suffix(".bam").unwrap_or(&s);
    PathBuf::from(format!("{}.bai", stem))
}
