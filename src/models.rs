use std::fmt;

use chrono::NaiveDate;
use serde::Deserialize;

/// Which input file a row came from. Drives empty-input detection and the
/// cleaning summary, never scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Demographic,
    Biometric,
    Enrolment,
}

impl Dataset {
    pub fn label(self) -> &'static str {
        match self {
            Self::Demographic => "demographic",
            Self::Biometric => "biometric",
            Self::Enrolment => "enrolment",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One CSV row as read from disk. Every field is optional so a malformed row
/// deserializes and reaches the cleaner instead of failing the whole read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    pub state: Option<String>,
    pub district: Option<String>,
    pub event_type: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Enrolment,
    Update,
    Biometric,
}

impl EventType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "enrolment" | "enrollment" => Some(Self::Enrolment),
            "update" | "demographic" => Some(Self::Update),
            "biometric" => Some(Self::Biometric),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Enrolment => "enrolment",
            Self::Update => "update",
            Self::Biometric => "biometric",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Success,
    Failure,
    Pending,
}

impl EventStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" => Some(Self::Success),
            "failure" | "failed" => Some(Self::Failure),
            "pending" | "delayed" => Some(Self::Pending),
            _ => None,
        }
    }
}

/// A validated row: canonical state name, title-cased district (absent on
/// state-only rows), typed event fields.
#[derive(Debug, Clone)]
pub struct CleanedRecord {
    pub state: String,
    pub district: Option<String>,
    pub event_type: EventType,
    pub status: EventStatus,
    pub occurred_at: NaiveDate,
}

/// Kept/dropped tallies for one dataset, reported on success.
#[derive(Debug, Clone)]
pub struct CleanSummary {
    pub dataset: Dataset,
    pub kept: usize,
    pub missing_field: usize,
    pub bad_region: usize,
    pub bad_timestamp: usize,
}

impl CleanSummary {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            kept: 0,
            missing_field: 0,
            bad_region: 0,
            bad_timestamp: 0,
        }
    }

    pub fn dropped(&self) -> usize {
        self.missing_field + self.bad_region + self.bad_timestamp
    }
}

/// Per-region event tallies at one granularity (state or district).
#[derive(Debug, Clone)]
pub struct RegionMetrics {
    pub region: String,
    pub updates_total: u64,
    pub updates_failed: u64,
    pub biometric_total: u64,
    pub biometric_failed: u64,
    pub enrolments_total: u64,
    pub enrolments_delayed: u64,
    pub record_count: u64,
}

impl RegionMetrics {
    pub fn new(region: String) -> Self {
        Self {
            region,
            updates_total: 0,
            updates_failed: 0,
            biometric_total: 0,
            biometric_failed: 0,
            enrolments_total: 0,
            enrolments_delayed: 0,
            record_count: 0,
        }
    }

    pub fn observe(&mut self, record: &CleanedRecord) {
        self.record_count += 1;
        match record.event_type {
            EventType::Update => {
                self.updates_total += 1;
                if record.status == EventStatus::Failure {
                    self.updates_failed += 1;
                }
            }
            EventType::Biometric => {
                self.biometric_total += 1;
                if record.status == EventStatus::Failure {
                    self.biometric_failed += 1;
                }
            }
            EventType::Enrolment => {
                self.enrolments_total += 1;
                if record.status == EventStatus::Pending {
                    self.enrolments_delayed += 1;
                }
            }
        }
    }

    pub fn update_failure_rate(&self) -> f64 {
        ratio(self.updates_failed, self.updates_total)
    }

    pub fn biometric_mismatch_rate(&self) -> f64 {
        ratio(self.biometric_failed, self.biometric_total)
    }

    pub fn enrolment_delay_rate(&self) -> f64 {
        ratio(self.enrolments_delayed, self.enrolments_total)
    }
}

// Zero denominator means no signal for that sub-indicator, not undefined.
fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[derive(Debug, Clone)]
pub struct RiskScore {
    pub region: String,
    pub score: f64,
    pub rank: usize,
    pub update_failure_rate: f64,
    pub biometric_mismatch_rate: f64,
    pub enrolment_delay_rate: f64,
    pub record_count: u64,
}

#[derive(Debug, Clone)]
pub struct EventTypeSummary {
    pub event_type: EventType,
    pub count: usize,
    pub flagged: usize,
}

impl EventTypeSummary {
    pub fn flagged_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.flagged as f64 / self.count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(event_type: EventType, status: EventStatus) -> CleanedRecord {
        CleanedRecord {
            state: "Kerala".to_string(),
            district: Some("Ernakulam".to_string()),
            event_type,
            status,
            occurred_at: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        }
    }

    #[test]
    fn event_type_parse_accepts_aliases() {
        assert_eq!(EventType::parse(" Enrollment "), Some(EventType::Enrolment));
        assert_eq!(EventType::parse("DEMOGRAPHIC"), Some(EventType::Update));
        assert_eq!(EventType::parse("biometric"), Some(EventType::Biometric));
        assert_eq!(EventType::parse("renewal"), None);
    }

    #[test]
    fn event_status_parse_accepts_aliases() {
        assert_eq!(EventStatus::parse("Failed"), Some(EventStatus::Failure));
        assert_eq!(EventStatus::parse("delayed"), Some(EventStatus::Pending));
        assert_eq!(EventStatus::parse("ok"), None);
    }

    #[test]
    fn metrics_tally_by_event_type() {
        let mut metrics = RegionMetrics::new("Kerala".to_string());
        metrics.observe(&record(EventType::Update, EventStatus::Failure));
        metrics.observe(&record(EventType::Update, EventStatus::Success));
        metrics.observe(&record(EventType::Biometric, EventStatus::Failure));
        metrics.observe(&record(EventType::Enrolment, EventStatus::Pending));
        metrics.observe(&record(EventType::Enrolment, EventStatus::Success));

        assert_eq!(metrics.record_count, 5);
        assert!((metrics.update_failure_rate() - 0.5).abs() < 1e-9);
        assert!((metrics.biometric_mismatch_rate() - 1.0).abs() < 1e-9);
        assert!((metrics.enrolment_delay_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn zero_denominator_yields_zero_rate() {
        let metrics = RegionMetrics::new("Goa".to_string());
        assert_eq!(metrics.update_failure_rate(), 0.0);
        assert_eq!(metrics.biometric_mismatch_rate(), 0.0);
        assert_eq!(metrics.enrolment_delay_rate(), 0.0);
    }
}
