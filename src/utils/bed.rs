use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::ItdFilterParams;
use crate::error::{ItdError, Result};

/// Closed genomic interval `[start, end]` covering one breakpoint exon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BreakpointWindow {
    pub start: u64,
    pub end: u64,
}

impl BreakpointWindow {
    /// Inclusive on both bounds
    pub fn contains(&self, pos: u64) -> bool {
        self.start <= pos && pos <= self.end
    }
}

/// The 5' and 3' breakpoint exon windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BreakpointWindows {
    pub five_prime: BreakpointWindow,
    pub three_prime: BreakpointWindow,
}

/// Bounds seen so far for one label
#[derive(Default)]
struct PartialWindow {
    start: Option<u64>,
    end: Option<u64>,
}

impl PartialWindow {
    fn finish(&self) -> Option<BreakpointWindow> {
        Some(BreakpointWindow {
            start: self.start?,
            end: self.end?,
        })
    }
}

pub fn load_breakpoint_windows(
    bed_path: &Path,
    params: &ItdFilterParams,
) -> Result<BreakpointWindows> {
    let file = File::open(bed_path).map_err(|e| ItdError::io(e, bed_path))?;
    let reader = BufReader::new(file);
    load_breakpoint_windows_from_reader(reader, params).map_err(|e| match e {
        ItdError::Io { source, .. } => ItdError::io(source, bed_path),
        other => other,
    })
}

/// Scan a breakpoint BED and pick out the windows for the configured exon labels.
///
/// The label is the third `;`-separated element of column 4. Lines with fewer
/// than four columns, a short annotation, or non-integer coordinates are skipped.
/// If a label appears more than once the last line wins. Bytes that are not
/// valid UTF-8 are replaced rather than rejected.
pub fn load_breakpoint_windows_from_reader<R: BufRead>(
    reader: R,
    params: &ItdFilterParams,
) -> Result<BreakpointWindows> {
    let mut five = PartialWindow::default();
    let mut three = PartialWindow::default();

    for (i, bytes) in reader.split(b'\n').enumerate() {
        let bytes = bytes?;
        let text = String::from_utf8_lossy(&bytes);
        let line = text.trim_end_matches('\r');
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 4 {
            debug!("Skipping BED line {} with {} columns", i + 1, parts.len());
            continue;
        }

        let Some(label) = parts[3].split(';').nth(2) else {
            debug!("Skipping BED line {} without an exon label", i + 1);
            continue;
        };
        let (Ok(start), Ok(end)) = (parts[1].parse::<u64>(), parts[2].parse::<u64>()) else {
            continue;
        };

        let slot = if label == params.five_prime_label {
            &mut five
        } else if label == params.three_prime_label {
            &mut three
        } else {
            continue;
        };
        if slot.start.is_some() {
            warn!("Exon label {} appears more than once; using line {}", label, i + 1);
        }
        slot.start = Some(start);
        slot.end = Some(end);
    }

    match (five.finish(), three.finish()) {
        (Some(five_prime), Some(three_prime)) => Ok(BreakpointWindows {
            five_prime,
            three_prime,
        }),
        (f, t) => {
            let mut labels = Vec::new();
            if f.is_none() {
                labels.push(params.five_prime_label.clone());
            }
            if t.is_none() {
                labels.push(params.three_prime_label.clone());
            }
            Err(ItdError::MissingCoordinates { labels })
        }
    }
}
