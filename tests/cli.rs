/// End-to-end tests for the `filter`, `windows` and `schema` subcommands
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_breakpoints(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("FGFR1_ITD_breakpoint_exons.bed");
    fs::write(
        &path,
        "#chrom\tstart\tend\tname\n\
         chr8\t100\t200\tFGFR1;NM_023110;exon-9-10\n\
         chr8\t5000\t5200\tFGFR1;NM_023110;exon-18\n",
    )
    .unwrap();
    path
}

fn variant(pos: u64, alt_len: usize) -> String {
    format!("chr8\t{}\t.\tA\t{}\t60\tPASS\tDP=30", pos, "G".repeat(alt_len))
}

fn write_vcf(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("raw.vcf");
    let lines = [
        "##fileformat=VCFv4.2".to_string(),
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO".to_string(),
        variant(5100, 4005),
        variant(4999, 4005),
        variant(5100, 3999),
        "chr8\t5100\ttruncated".to_string(),
        variant(5200, 4000),
    ];
    fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

#[test]
fn test_filter_subcommand() {
    let tmpdir = TempDir::new().unwrap();
    let bed = write_breakpoints(&tmpdir);
    let vcf = write_vcf(&tmpdir);
    let out = tmpdir.path().join("results").join("itd.vcf");
    let summary = tmpdir.path().join("results").join("itd.summary.json");

    Command::cargo_bin("fgfr1-itd")
        .unwrap()
        .arg("filter")
        .arg("--vcf")
        .arg(&vcf)
        .arg("--breakpoints")
        .arg(&bed)
        .arg("--out-vcf")
        .arg(&out)
        .arg("--summary")
        .arg(&summary)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total variants processed: 4"))
        .stdout(predicate::str::contains("FGFR1 ITD variants found: 2"));

    let written = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("##fileformat"));
    assert_eq!(lines[2], variant(5100, 4005));
    assert_eq!(lines[3], variant(5200, 4000));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&summary).unwrap()).unwrap();
    assert_eq!(json["filter"]["itd_variants"], 2);
    assert_eq!(json["windows"]["three_prime"]["start"], 5000);
}

#[test]
fn test_filter_refuses_to_overwrite() {
    let tmpdir = TempDir::new().unwrap();
    let bed = write_breakpoints(&tmpdir);
    let vcf = write_vcf(&tmpdir);
    let out = tmpdir.path().join("itd.vcf");
    fs::write(&out, "keep me\n").unwrap();

    Command::cargo_bin("fgfr1-itd")
        .unwrap()
        .args(["filter", "--vcf"])
        .arg(&vcf)
        .arg("--breakpoints")
        .arg(&bed)
        .arg("--out-vcf")
        .arg(&out)
        .assert()
        .failure();
    assert_eq!(fs::read_to_string(&out).unwrap(), "keep me\n");

    Command::cargo_bin("fgfr1-itd")
        .unwrap()
        .args(["filter", "--force", "--vcf"])
        .arg(&vcf)
        .arg("--breakpoints")
        .arg(&bed)
        .arg("--out-vcf")
        .arg(&out)
        .assert()
        .success();
    assert!(fs::read_to_string(&out).unwrap().contains("##fileformat"));
}

#[test]
fn test_filter_min_alt_length_override() {
    let tmpdir = TempDir::new().unwrap();
    let bed = write_breakpoints(&tmpdir);
    let vcf = write_vcf(&tmpdir);
    let out = tmpdir.path().join("itd.vcf");

    Command::cargo_bin("fgfr1-itd")
        .unwrap()
        .arg("filter")
        .arg("--vcf")
        .arg(&vcf)
        .arg("--breakpoints")
        .arg(&bed)
        .arg("--out-vcf")
        .arg(&out)
        .arg("--min-alt-length")
        .arg("3000")
        .assert()
        .success()
        .stdout(predicate::str::contains("FGFR1 ITD variants found: 3"));
}

#[test]
fn test_missing_exon_label_fails() {
    let tmpdir = TempDir::new().unwrap();
    let bed = tmpdir.path().join("bp.bed");
    fs::write(&bed, "chr8\t100\t200\tFGFR1;NM_023110;exon-9-10\n").unwrap();
    let vcf = write_vcf(&tmpdir);
    let out = tmpdir.path().join("itd.vcf");

    Command::cargo_bin("fgfr1-itd")
        .unwrap()
        .arg("filter")
        .arg("--vcf")
        .arg(&vcf)
        .arg("--breakpoints")
        .arg(&bed)
        .arg("--out-vcf")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("exon-18"));
    assert!(!out.exists());
}

#[test]
fn test_windows_subcommand() {
    let tmpdir = TempDir::new().unwrap();
    let bed = write_breakpoints(&tmpdir);

    Command::cargo_bin("fgfr1-itd")
        .unwrap()
        .arg("windows")
        .arg("--breakpoints")
        .arg(&bed)
        .assert()
        .success()
        .stdout(predicate::str::contains("exon-9-10\t100\t200"))
        .stdout(predicate::str::contains("exon-18\t5000\t5200"));
}

#[test]
fn test_call_preflight_missing_reference() {
    let tmpdir = TempDir::new().unwrap();

    Command::cargo_bin("fgfr1-itd")
        .unwrap()
        .arg("call")
        .arg("--ref")
        .arg(tmpdir.path().join("missing.fa"))
        .arg("--bam")
        .arg(tmpdir.path().join("missing.bam"))
        .arg("--out-vcf")
        .arg(tmpdir.path().join("out.vcf"))
        .arg("--sample-name")
        .arg("S1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("reference genome does not exist"));
}

#[test]
fn test_schema_subcommand() {
    Command::cargo_bin("fgfr1-itd")
        .unwrap()
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("itd_variants"));
}
