use std::collections::HashMap;
use std::fmt::Write;

use crate::models::{CleanedRecord, EventStatus, EventType, EventTypeSummary};
use crate::pipeline::PipelineOutput;

const TOP_STATES: usize = 5;
const TOP_DISTRICTS: usize = 10;

pub fn summarize_by_event(records: &[CleanedRecord]) -> Vec<EventTypeSummary> {
    let mut map: HashMap<EventType, (usize, usize)> = HashMap::new();

    for record in records {
        let flagged = match (record.event_type, record.status) {
            (EventType::Enrolment, EventStatus::Pending) => true,
            (EventType::Update | EventType::Biometric, EventStatus::Failure) => true,
            _ => false,
        };
        let entry = map.entry(record.event_type).or_insert((0, 0));
        entry.0 += 1;
        if flagged {
            entry.1 += 1;
        }
    }

    let mut summaries: Vec<EventTypeSummary> = map
        .into_iter()
        .map(|(event_type, (count, flagged))| EventTypeSummary {
            event_type,
            count,
            flagged,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.event_type.label().cmp(b.event_type.label()))
    });
    summaries
}

pub fn build_report(output: &PipelineOutput) -> String {
    let summaries = summarize_by_event(&output.records);

    let mut report = String::new();
    let _ = writeln!(report, "# Aadhaar Risk Intelligence Report");
    let _ = writeln!(
        report,
        "Covering {} states/UTs and {} districts.",
        output.state_table.len(),
        output.district_table.len()
    );

    let _ = writeln!(report);
    let _ = writeln!(report, "## Data Quality");
    for summary in &output.summaries {
        let _ = writeln!(
            report,
            "- {}: kept {} rows, dropped {} (missing field {}, bad region {}, bad timestamp {})",
            summary.dataset,
            summary.kept,
            summary.dropped(),
            summary.missing_field,
            summary.bad_region,
            summary.bad_timestamp
        );
    }

    let _ = writeln!(report);
    let _ = writeln!(report, "## Event Mix");
    if summaries.is_empty() {
        let _ = writeln!(report, "No events in the cleaned input.");
    } else {
        for summary in &summaries {
            let _ = writeln!(
                report,
                "- {}: {} events ({:.1}% flagged)",
                summary.event_type,
                summary.count,
                summary.flagged_rate() * 100.0
            );
        }
    }

    let _ = writeln!(report);
    let _ = writeln!(report, "## Highest Risk States");
    if output.state_table.is_empty() {
        let _ = writeln!(report, "No states scored.");
    } else {
        for score in output.state_table.iter().take(TOP_STATES) {
            let _ = writeln!(
                report,
                "- {}. {} score {:.2} across {} records",
                score.rank, score.region, score.score, score.record_count
            );
        }
    }

    let _ = writeln!(report);
    let _ = writeln!(report, "## Highest Risk Districts");
    if output.district_table.is_empty() {
        let _ = writeln!(report, "No districts scored.");
    } else {
        for score in output.district_table.iter().take(TOP_DISTRICTS) {
            let _ = writeln!(
                report,
                "- {}. {} score {:.2} across {} records",
                score.rank, score.region, score.score, score.record_count
            );
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CleanSummary, Dataset, RiskScore};
    use chrono::NaiveDate;

    fn record(event_type: EventType, status: EventStatus) -> CleanedRecord {
        CleanedRecord {
            state: "Bihar".to_string(),
            district: Some("Patna".to_string()),
            event_type,
            status,
            occurred_at: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        }
    }

    fn score(region: &str, rank: usize, value: f64) -> RiskScore {
        RiskScore {
            region: region.to_string(),
            score: value,
            rank,
            update_failure_rate: 0.0,
            biometric_mismatch_rate: 0.0,
            enrolment_delay_rate: 0.0,
            record_count: 7,
        }
    }

    fn sample_output() -> PipelineOutput {
        let mut summary = CleanSummary::new(Dataset::Demographic);
        summary.kept = 3;
        summary.bad_region = 1;
        PipelineOutput {
            records: vec![
                record(EventType::Update, EventStatus::Failure),
                record(EventType::Update, EventStatus::Success),
                record(EventType::Enrolment, EventStatus::Pending),
            ],
            state_table: vec![score("Bihar", 1, 80.0), score("Kerala", 2, 5.0)],
            district_table: vec![score("Bihar / Patna", 1, 80.0)],
            summaries: vec![summary],
        }
    }

    #[test]
    fn event_mix_counts_flagged_events() {
        let output = sample_output();
        let summaries = summarize_by_event(&output.records);

        assert_eq!(summaries[0].event_type, EventType::Update);
        assert_eq!(summaries[0].count, 2);
        assert_eq!(summaries[0].flagged, 1);
        assert_eq!(summaries[1].event_type, EventType::Enrolment);
        assert!((summaries[1].flagged_rate() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn report_contains_all_sections() {
        let report = build_report(&sample_output());

        assert!(report.contains("## Data Quality"));
        assert!(report.contains("bad region 1"));
        assert!(report.contains("## Event Mix"));
        assert!(report.contains("- update: 2 events (50.0% flagged)"));
        assert!(report.contains("## Highest Risk States"));
        assert!(report.contains("- 1. Bihar score 80.00 across 7 records"));
        assert!(report.contains("## Highest Risk Districts"));
        assert!(report.contains("Bihar / Patna"));
    }
}
