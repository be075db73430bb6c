use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

use crate::models::RiskScore;
use crate::pipeline::PipelineOutput;

pub const STATE_RISK_FILE: &str = "state_risk.csv";
pub const DISTRICT_RISK_FILE: &str = "district_risk.csv";

// Fixed rounding keeps repeated runs byte-identical.
const SCORE_DECIMALS: i32 = 2;
const RATE_DECIMALS: i32 = 4;

// Must stay in sync with ExportRow's field order.
const HEADER: [&str; 6] = [
    "region_name",
    "score",
    "rank",
    "update_failure_rate",
    "biometric_mismatch_rate",
    "enrolment_delay_rate",
];

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    region_name: &'a str,
    score: f64,
    rank: usize,
    update_failure_rate: f64,
    biometric_mismatch_rate: f64,
    enrolment_delay_rate: f64,
}

/// Writes both risk tables under `out_dir`, returning their paths. Both
/// tables are fully staged before either final file is replaced, so a
/// failure midway leaves the prior output untouched.
pub fn write_tables(output: &PipelineOutput, out_dir: &Path) -> anyhow::Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output dir {}", out_dir.display()))?;

    let state_path = out_dir.join(STATE_RISK_FILE);
    let district_path = out_dir.join(DISTRICT_RISK_FILE);
    let state_tmp = stage_table(&output.state_table, out_dir)?;
    let district_tmp = stage_table(&output.district_table, out_dir)?;
    persist(state_tmp, &state_path)?;
    persist(district_tmp, &district_path)?;
    info!(
        states = output.state_table.len(),
        districts = output.district_table.len(),
        "wrote risk tables"
    );
    Ok((state_path, district_path))
}

/// Serializes one table. The file is written to a temp sibling and renamed
/// into place, so a concurrent reader never observes a partial table.
pub fn write_table(table: &[RiskScore], path: &Path) -> anyhow::Result<()> {
    let tmp = stage_table(table, parent_dir(path))?;
    persist(tmp, path)
}

fn stage_table(table: &[RiskScore], dir: &Path) -> anyhow::Result<NamedTempFile> {
    let tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to stage temp file in {}", dir.display()))?;

    let mut writer = csv::Writer::from_writer(tmp.as_file());
    // serialize emits the header from the first row; an empty table still
    // needs the schema line for downstream readers.
    if table.is_empty() {
        writer.write_record(HEADER)?;
    }
    for score in table {
        writer.serialize(ExportRow {
            region_name: &score.region,
            score: round(score.score, SCORE_DECIMALS),
            rank: score.rank,
            update_failure_rate: round(score.update_failure_rate, RATE_DECIMALS),
            biometric_mismatch_rate: round(score.biometric_mismatch_rate, RATE_DECIMALS),
            enrolment_delay_rate: round(score.enrolment_delay_rate, RATE_DECIMALS),
        })?;
    }
    writer.flush()?;
    drop(writer);
    Ok(tmp)
}

fn persist(tmp: NamedTempFile, path: &Path) -> anyhow::Result<()> {
    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

/// Atomic text write, same temp-and-rename discipline as the tables.
pub fn write_text(contents: &str, path: &Path) -> anyhow::Result<()> {
    let dir = parent_dir(path);
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to stage temp file in {}", dir.display()))?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    persist(tmp, path)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn round(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample_table() -> Vec<RiskScore> {
        vec![
            RiskScore {
                region: "Bihar".to_string(),
                score: 32.0,
                rank: 1,
                update_failure_rate: 0.5,
                biometric_mismatch_rate: 0.25,
                enrolment_delay_rate: 0.1,
                record_count: 40,
            },
            RiskScore {
                region: "Kerala".to_string(),
                score: 10.123456,
                rank: 2,
                update_failure_rate: 0.123456,
                biometric_mismatch_rate: 0.0,
                enrolment_delay_rate: 0.0,
                record_count: 12,
            },
        ]
    }

    #[test]
    fn writes_fixed_schema_rows() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("state_risk.csv");
        write_table(&sample_table(), &path)?;

        let contents = fs::read_to_string(&path)?;
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some(
                "region_name,score,rank,update_failure_rate,\
                 biometric_mismatch_rate,enrolment_delay_rate"
            )
        );
        assert_eq!(lines.next(), Some("Bihar,32.0,1,0.5,0.25,0.1"));
        assert_eq!(lines.next(), Some("Kerala,10.12,2,0.1235,0.0,0.0"));
        Ok(())
    }

    #[test]
    fn writes_both_tables_under_out_dir() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let output = PipelineOutput {
            records: Vec::new(),
            state_table: sample_table(),
            district_table: sample_table(),
            summaries: Vec::new(),
        };

        let out_dir = dir.path().join("processed");
        let (state_path, district_path) = write_tables(&output, &out_dir)?;
        assert_eq!(state_path, out_dir.join(STATE_RISK_FILE));
        assert!(state_path.is_file());
        assert!(district_path.is_file());
        Ok(())
    }

    #[test]
    fn empty_table_still_gets_the_schema_header() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("district_risk.csv");
        write_table(&[], &path)?;

        let contents = fs::read_to_string(&path)?;
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.starts_with("region_name,score,rank"));
        Ok(())
    }

    #[test]
    fn rewrites_are_byte_identical() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("state_risk.csv");

        write_table(&sample_table(), &path)?;
        let first = fs::read(&path)?;
        write_table(&sample_table(), &path)?;
        let second = fs::read(&path)?;

        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn replaces_prior_output_without_leftovers() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("state_risk.csv");
        fs::write(&path, "stale contents that are much longer than the new table\n")?;

        write_table(&sample_table()[..1], &path)?;
        let contents = fs::read_to_string(&path)?;
        assert!(!contents.contains("stale"));
        assert!(contents.ends_with("Bihar,32.0,1,0.5,0.25,0.1\n"));

        // No temp files left behind in the directory.
        let entries: Vec<_> = fs::read_dir(dir.path())?
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("state_risk.csv")]);
        Ok(())
    }
}
