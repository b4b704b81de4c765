//! VarDict invocation.
//!
//! The caller is a three-stage shell pipeline
//! (`vardict | teststrandbias.R | var2vcf_valid.pl > out.vcf`), so it is run
//! through `bash -o pipefail -c`; a failure in any stage fails the run.

use log::{debug, error, info, warn};
use std::path::Path;
use std::process::Command;

use crate::config::{CallerConfig, CallerFailurePolicy};
use crate::error::{ItdError, Result};
use crate::output::CallerReport;

/// Inputs for one VarDict run
pub struct VardictCommand<'a> {
    pub config: &'a CallerConfig,
    pub reference: &'a Path,
    pub bam: &'a Path,
    pub region_bed: &'a Path,
    pub sample_name: &'a str,
    pub output_vcf: &'a Path,
}

/// Single-quote a value for bash
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn quote_path(p: &Path) -> String {
    shell_quote(&p.to_string_lossy())
}

impl VardictCommand<'_> {
    /// Full shell pipeline. Tool paths stay unquoted so `~` expands.
    pub fn to_shell(&self) -> String {
        let c = self.config;
        let sample = shell_quote(self.sample_name);
        format!(
            "{vardict} -G {reference} -f {vaf} -r 4 -o 1.5 -th {threads} -L {sv} -x {ext} -N {sample} \
             -b {bam} -c 1 -S 2 -E 3 -g 4 {bed} | {tsb} | {var2vcf} -A -N {sample} -E -f {vaf} > {out}",
            vardict = c.vardict,
            reference = quote_path(self.reference),
            vaf = c.min_vaf,
            threads = c.threads,
            sv = c.min_sv_length,
            ext = c.extension_length,
            sample = sample,
            bam = quote_path(self.bam),
            bed = quote_path(self.region_bed),
            tsb = c.teststrandbias,
            var2vcf = c.var2vcf,
            out = quote_path(self.output_vcf),
        )
    }

    pub fn run(&self) -> Result<CallerReport> {
        run_shell(&self.to_shell(), self.config.failure_policy)
    }
}

/// Run `command` under `bash -o pipefail -c` and apply the failure policy.
///
/// Under `BestEffort` a failed command is logged and reported with
/// `success: false`; under `Abort` it becomes `ItdError::Caller`.
pub fn run_shell(command: &str, policy: CallerFailurePolicy) -> Result<CallerReport> {
    info!("Running: {}", command);
    let result = Command::new("bash")
        .args(["-o", "pipefail", "-c", command])
        .output();
    let (exit_code, success, output, status) = match result {
        Ok(out) => {
            let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&out.stderr));
            (out.status.code(), out.status.success(), text, out.status.to_string())
        }
        Err(e) => (None, false, e.to_string(), "could not start bash".to_string()),
    };

    let report = CallerReport {
        command: command.to_string(),
        exit_code,
        success,
    };

    if success {
        debug!("Caller output:\n{}", output);
        return Ok(report);
    }

    error!("Command failed: {}\n{}", status, output);
    match policy {
        CallerFailurePolicy::Abort => Err(ItdError::Caller { status, output }),
        CallerFailurePolicy::BestEffort => {
            warn!("Continuing with whatever the caller produced");
            Ok(report)
        }
    }
}
