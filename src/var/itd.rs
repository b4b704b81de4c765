use log::{debug, info};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::config::ItdFilterParams;
use crate::error::{ItdError, Result};
use crate::output::{FilterStats, ItdCall};
use crate::utils::bed::BreakpointWindow;

/// How a single VCF line was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Header,
    /// Fewer than 5 columns or a non-integer POS
    Malformed,
    Itd,
    NotItd,
}

fn parse_pos(field: &[u8]) -> Option<u64> {
    std::str::from_utf8(field).ok()?.parse().ok()
}

/// Classify one VCF line against the 3' breakpoint window.
///
/// An ITD candidate has an ALT longer than REF, at least `min_alt_length`
/// bytes of ALT, and a POS inside the window. ALT is compared as one literal
/// string, so multi-allelic records are measured including commas. Lines are
/// handled as raw bytes; only POS has to be valid text.
pub fn classify_line(
    line: impl AsRef<[u8]>,
    window: &BreakpointWindow,
    min_alt_length: usize,
) -> LineClass {
    let line = line.as_ref();
    if line.starts_with(b"#") {
        return LineClass::Header;
    }
    let fields: Vec<&[u8]> = line.split(|&b| b == b'\t').collect();
    if fields.len() < 5 {
        return LineClass::Malformed;
    }
    let Some(pos) = parse_pos(fields[1]) else {
        return LineClass::Malformed;
    };
    let ref_len = fields[3].len();
    let alt_len = fields[4].len();

    if alt_len > ref_len && alt_len >= min_alt_length && window.contains(pos) {
        LineClass::Itd
    } else {
        LineClass::NotItd
    }
}

fn describe_call(line: &[u8]) -> ItdCall {
    let fields: Vec<&[u8]> = line.splitn(6, |&b| b == b'\t').collect();
    ItdCall {
        chrom: String::from_utf8_lossy(fields[0]).into_owned(),
        position: parse_pos(fields[1]).unwrap_or_default(),
        id: String::from_utf8_lossy(fields[2]).into_owned(),
        ref_length: fields[3].len(),
        alt_length: fields[4].len(),
    }
}

// Drop the line terminator, accepting both `\n` and `\r\n`
fn strip_eol(buf: &[u8]) -> &[u8] {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn write_line<W: Write>(writer: &mut W, line: &[u8], out_path: &Path) -> Result<()> {
    writer
        .write_all(line)
        .and_then(|_| writer.write_all(b"\n"))
        .map_err(|e| ItdError::io(e, out_path))
}

fn filter_stream<R: BufRead, W: Write>(
    mut reader: R,
    writer: &mut W,
    window: &BreakpointWindow,
    params: &ItdFilterParams,
    in_path: &Path,
    out_path: &Path,
) -> Result<FilterStats> {
    let mut stats = FilterStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| ItdError::io(e, in_path))?;
        if n == 0 {
            break;
        }
        let line = strip_eol(&buf);
        match classify_line(line, window, params.min_alt_length) {
            LineClass::Header => write_line(writer, line, out_path)?,
            LineClass::Malformed => {
                debug!(
                    "Skipping malformed VCF line: {}",
                    String::from_utf8_lossy(&line[..line.len().min(60)])
                );
            }
            LineClass::NotItd => stats.total_variants += 1,
            LineClass::Itd => {
                stats.total_variants += 1;
                stats.itd_variants += 1;
                write_line(writer, line, out_path)?;
                stats.calls.push(describe_call(line));
            }
        }
    }

    Ok(stats)
}

/// Copy headers and ITD records from `reader` to `writer`, in input order.
///
/// Lines are copied byte for byte, so non-UTF-8 content survives.
pub fn filter_vcf_for_itd<R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
    window: &BreakpointWindow,
    params: &ItdFilterParams,
) -> Result<FilterStats> {
    filter_stream(
        reader,
        writer,
        window,
        params,
        Path::new("<input>"),
        Path::new("<output>"),
    )
}

/// File-to-file wrapper around [`filter_vcf_for_itd`].
pub fn filter_vcf_file(
    input: &Path,
    output: &Path,
    window: &BreakpointWindow,
    params: &ItdFilterParams,
) -> Result<FilterStats> {
    let in_file = File::open(input).map_err(|e| ItdError::io(e, input))?;
    let out_file = File::create(output).map_err(|e| ItdError::io(e, output))?;
    let reader = BufReader::new(in_file);
    let mut writer = BufWriter::new(out_file);

    let stats = filter_stream(reader, &mut writer, window, params, input, output)?;
    writer.flush().map_err(|e| ItdError::io(e, output))?;

    info!("Total variants processed: {}", stats.total_variants);
    info!("FGFR1 ITD variants found: {}", stats.itd_variants);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const WINDOW: BreakpointWindow = BreakpointWindow { start: 5000, end: 5200 };

    fn record(pos: u64, ref_allele: &str, alt_len: usize) -> String {
        format!(
            "chr8\t{}\trs1\t{}\t{}\t50\tPASS\tSAMPLE=s1",
            pos,
            ref_allele,
            "A".repeat(alt_len)
        )
    }

    fn run(input: &str) -> (String, FilterStats) {
        let mut out = Vec::new();
        let stats = filter_vcf_for_itd(
            Cursor::new(input),
            &mut out,
            &WINDOW,
            &ItdFilterParams::default(),
        )
        .unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    #[test]
    fn test_scenario_lines() {
        assert_eq!(classify_line(&record(5100, "A", 4005), &WINDOW, 4000), LineClass::Itd);
        assert_eq!(classify_line(&record(4999, "A", 4005), &WINDOW, 4000), LineClass::NotItd);
        assert_eq!(classify_line(&record(5100, "A", 3999), &WINDOW, 4000), LineClass::NotItd);
    }

    #[test]
    fn test_alt_length_threshold() {
        assert_eq!(classify_line(&record(5100, "A", 4000), &WINDOW, 4000), LineClass::Itd);
        assert_eq!(classify_line(&record(5100, "A", 3999), &WINDOW, 4000), LineClass::NotItd);
        // configurable threshold
        assert_eq!(classify_line(&record(5100, "A", 3999), &WINDOW, 3000), LineClass::Itd);
    }

    #[test]
    fn test_equal_lengths_excluded() {
        let ref_allele = "C".repeat(4500);
        assert_eq!(
            classify_line(&record(5100, &ref_allele, 4500), &WINDOW, 4000),
            LineClass::NotItd
        );
        assert_eq!(
            classify_line(&record(5000, &ref_allele, 4500), &WINDOW, 1),
            LineClass::NotItd
        );
    }

    #[test]
    fn test_window_bounds_inclusive() {
        assert_eq!(classify_line(&record(5000, "A", 4001), &WINDOW, 4000), LineClass::Itd);
        assert_eq!(classify_line(&record(5200, "A", 4001), &WINDOW, 4000), LineClass::Itd);
        assert_eq!(classify_line(&record(4999, "A", 4001), &WINDOW, 4000), LineClass::NotItd);
        assert_eq!(classify_line(&record(5201, "A", 4001), &WINDOW, 4000), LineClass::NotItd);
    }

    #[test]
    fn test_malformed_lines() {
        assert_eq!(classify_line("chr8\t5100\trs1", &WINDOW, 4000), LineClass::Malformed);
        assert_eq!(classify_line("", &WINDOW, 4000), LineClass::Malformed);
        assert_eq!(
            classify_line("chr8\tpos\trs1\tA\tAAAA", &WINDOW, 4000),
            LineClass::Malformed
        );
        assert_eq!(classify_line("##fileformat=VCFv4.2", &WINDOW, 4000), LineClass::Header);
    }

    #[test]
    fn test_multiallelic_alt_is_literal() {
        let alt = format!("{},{}", "A".repeat(2000), "T".repeat(1999));
        let line = format!("chr8\t5100\t.\tA\t{}", alt);
        assert_eq!(alt.len(), 4000);
        assert_eq!(classify_line(&line, &WINDOW, 4000), LineClass::Itd);
    }

    #[test]
    fn test_filter_stream() {
        let keep = record(5100, "A", 4005);
        let input = format!(
            "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\n{}\n{}\nchr8\t5100\tbad\n{}\nchr8\tx\t.\tA\tAA\n",
            keep,
            record(4999, "A", 4005),
            record(5100, "A", 3999),
        );
        let (out, stats) = run(&input);

        assert_eq!(
            out,
            format!("##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\n{}\n", keep)
        );
        assert_eq!(stats.total_variants, 3);
        assert_eq!(stats.itd_variants, 1);
        assert_eq!(stats.calls.len(), 1);
        assert_eq!(stats.calls[0].chrom, "chr8");
        assert_eq!(stats.calls[0].position, 5100);
        assert_eq!(stats.calls[0].id, "rs1");
        assert_eq!(stats.calls[0].ref_length, 1);
        assert_eq!(stats.calls[0].alt_length, 4005);
    }

    #[test]
    fn test_output_is_ordered_subsequence() {
        let lines = vec![
            "#header".to_string(),
            record(5010, "A", 4100),
            record(100, "A", 4100),
            "#late header".to_string(),
            record(5150, "AC", 5000),
            "junk".to_string(),
            record(5199, "A", 4000),
        ];
        let input = lines.join("\n");
        let (out, _) = run(&input);

        let mut it = lines.iter();
        for out_line in out.lines() {
            assert!(it.any(|l| l == out_line), "{} out of order", out_line);
        }
        assert_eq!(out.lines().filter(|l| l.starts_with('#')).count(), 2);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let input = [
            "#h".to_string(),
            record(5010, "A", 4100),
            record(4000, "A", 4100),
            record(5150, "A", 100),
        ]
        .join("\n");
        let (once, first) = run(&input);
        let (twice, second) = run(&once);
        assert_eq!(once, twice);
        assert_eq!(first.itd_variants, second.itd_variants);
        assert_eq!(second.total_variants, second.itd_variants);
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let res = filter_vcf_file(
            Path::new("/nonexistent/in.vcf"),
            Path::new("/nonexistent/out.vcf"),
            &WINDOW,
            &ItdFilterParams::default(),
        );
        match res {
            Err(ItdError::Io { path, .. }) => assert_eq!(path, Path::new("/nonexistent/in.vcf")),
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_utf8_lines_pass_through() {
        let itd = record(5100, "A", 4005);
        let mut input = b"##source=caf\xe9\n".to_vec();
        input.extend_from_slice(itd.as_bytes());
        input.extend_from_slice(b"\tNOTE=\xff\r\n");
        input.extend_from_slice(record(4000, "A", 4005).as_bytes());
        input.push(b'\n');

        let mut out = Vec::new();
        let stats = filter_vcf_for_itd(
            Cursor::new(&input),
            &mut out,
            &WINDOW,
            &ItdFilterParams::default(),
        )
        .unwrap();

        let mut expected = b"##source=caf\xe9\n".to_vec();
        expected.extend_from_slice(itd.as_bytes());
        expected.extend_from_slice(b"\tNOTE=\xff\n");
        assert_eq!(out, expected);
        assert_eq!(stats.total_variants, 2);
        assert_eq!(stats.itd_variants, 1);
        assert_eq!(stats.calls[0].position, 5100);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_error_reports_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.vcf");
        let lines: Vec<String> = (0..8).map(|i| record(5000 + i, "A", 4005)).collect();
        std::fs::write(&input, lines.join("\n")).unwrap();

        let res = filter_vcf_file(
            &input,
            Path::new("/dev/full"),
            &WINDOW,
            &ItdFilterParams::default(),
        );
        match res {
            Err(ItdError::Io { path, .. }) => assert_eq!(path, Path::new("/dev/full")),
            other => panic!("expected Io error, got {:?}", other),
        }
    }
}
