use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::caller::VardictCommand;
use crate::config::{bam_index_path, PipelineConfig};
use crate::error::{ItdError, Result};
use crate::output::{CallerReport, FilterStats, OutputCollector, RunSummary};
use crate::utils::bed::{load_breakpoint_windows, BreakpointWindows};
use crate::var::itd::filter_vcf_file;

/// Result from PipelineRunner::run().
pub struct PipelineResult {
    pub summary: RunSummary,
    pub stats: FilterStats,
}

struct StepTimer {
    total_start: Instant,
    step_start: Instant,
}

impl StepTimer {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            total_start: now,
            step_start: now,
        }
    }
    fn start(&mut self, name: &str) {
        info!("===== [STAGE] {} =====", name);
        self.step_start = Instant::now();
    }
    fn end(&self) {
        let now = Instant::now();
        info!("----- Stage Time: {:.2?} -----", now.duration_since(self.step_start));
        info!("----- Total Time: {:.2?} -----", now.duration_since(self.total_start));
    }
}

/// Fail with `Preflight` if `path` does not exist
pub fn validate_file_exists(path: &Path, kind: &str) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ItdError::Preflight {
            kind: kind.to_string(),
            path: path.to_path_buf(),
        }),
        Err(e) => Err(ItdError::io(e, path)),
    }
}

/// Load windows from `breakpoints` and filter an existing VCF into `out_vcf`.
pub fn filter_existing_vcf(
    vcf: &Path,
    breakpoints: &Path,
    out_vcf: &Path,
    config: &PipelineConfig,
) -> Result<(BreakpointWindows, FilterStats)> {
    let windows = load_breakpoint_windows(breakpoints, &config.filter)?;
    info!(
        "Loaded breakpoint windows: 5' {}-{}, 3' {}-{}",
        windows.five_prime.start,
        windows.five_prime.end,
        windows.three_prime.start,
        windows.three_prime.end
    );
    let stats = filter_vcf_file(vcf, out_vcf, &windows.three_prime, &config.filter)?;
    Ok((windows, stats))
}

pub struct PipelineRunner<'a> {
    reference: PathBuf,
    bam: PathBuf,
    out_vcf: PathBuf,
    sample_name: String,
    genome_version: String,
    intermediate_vcf: Option<PathBuf>,
    keep_intermediate: bool,
    config: &'a PipelineConfig,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(
        reference: &Path,
        bam: &Path,
        out_vcf: &Path,
        sample_name: &str,
        config: &'a PipelineConfig,
    ) -> Self {
        Self {
            reference: reference.to_path_buf(),
            bam: bam.to_path_buf(),
            out_vcf: out_vcf.to_path_buf(),
            sample_name: sample_name.to_string(),
            genome_version: "hg38".to_string(),
            intermediate_vcf: None,
            keep_intermediate: false,
            config,
        }
    }

    pub fn with_genome_version(mut self, genome_version: &str) -> Self {
        self.genome_version = genome_version.to_string();
        self
    }

    pub fn with_intermediate_vcf(mut self, path: Option<&Path>) -> Self {
        self.intermediate_vcf = path.map(|p| p.to_path_buf());
        self
    }

    pub fn keep_intermediate(mut self, keep: bool) -> Self {
        self.keep_intermediate = keep;
        self
    }

    /// Where the raw VarDict VCF is written before filtering
    pub fn intermediate_path(&self) -> PathBuf {
        self.intermediate_vcf.clone().unwrap_or_else(|| {
            std::env::temp_dir().join(format!("{}.vardict_raw_output.vcf", self.sample_name))
        })
    }

    /// Check that every input the run needs is on disk.
    pub fn preflight(&self) -> Result<()> {
        info!("Performing preflight checks...");
        validate_file_exists(&self.reference, "reference genome")?;
        validate_file_exists(&self.bam, "input BAM file")?;
        validate_file_exists(&bam_index_path(&self.bam), "BAM index file")?;
        validate_file_exists(&self.config.gene_bed(&self.genome_version), "FGFR1 gene BED file")?;
        validate_file_exists(
            &self.config.breakpoint_bed(&self.genome_version),
            "breakpoint exon BED file",
        )?;
        info!("Preflight checks passed");
        Ok(())
    }

    pub fn run(self) -> Result<PipelineResult> {
        info!("Starting FGFR1 ITD calling for {} ({})", self.sample_name, self.genome_version);
        let mut timer = StepTimer::new();

        timer.start("Preflight");
        self.config.validate()?;
        self.preflight()?;
        timer.end();

        timer.start("Breakpoint windows");
        let windows = load_breakpoint_windows(
            &self.config.breakpoint_bed(&self.genome_version),
            &self.config.filter,
        )?;
        info!(
            "Loaded exon coordinates: {} {}-{}, {} {}-{}",
            self.config.filter.five_prime_label,
            windows.five_prime.start,
            windows.five_prime.end,
            self.config.filter.three_prime_label,
            windows.three_prime.start,
            windows.three_prime.end
        );
        timer.end();

        let intermediate = self.intermediate_path();
        let result = self.call_and_filter(&windows, &intermediate, &mut timer);

        if !self.keep_intermediate && intermediate.exists() {
            info!("Deleting intermediate VCF {}", intermediate.display());
            if let Err(e) = std::fs::remove_file(&intermediate) {
                warn!("Failed to delete intermediate VCF {}: {}", intermediate.display(), e);
            }
        }

        let (report, stats) = result?;
        let summary = OutputCollector::new()
            .with_sample(&self.sample_name, &self.genome_version)
            .with_windows(windows)
            .with_caller(report)
            .with_filter(stats.clone())
            .build();
        Ok(PipelineResult { summary, stats })
    }

    fn call_and_filter(
        &self,
        windows: &BreakpointWindows,
        intermediate: &Path,
        timer: &mut StepTimer,
    ) -> Result<(CallerReport, FilterStats)> {
        timer.start("VarDict");
        let gene_bed = self.config.gene_bed(&self.genome_version);
        let report = VardictCommand {
            config: &self.config.caller,
            reference: &self.reference,
            bam: &self.bam,
            region_bed: &gene_bed,
            sample_name: &self.sample_name,
            output_vcf: intermediate,
        }
        .run()?;
        timer.end();

        timer.start("ITD filter");
        let stats = filter_vcf_file(
            intermediate,
            &self.out_vcf,
            &windows.three_prime,
            &self.config.filter,
        )?;
        info!("Filtered VCF written to {}", self.out_vcf.display());
        timer.end();

        Ok((report, stats))
    }
}
