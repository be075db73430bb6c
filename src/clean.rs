use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use crate::models::{CleanSummary, CleanedRecord, Dataset, EventStatus, EventType, RawRecord};
use crate::regions;

/// Fatal: a whole dataset produced no usable rows. Raised by the pipeline,
/// never by the cleaner itself.
#[derive(Debug, Error)]
#[error("no valid {dataset} rows survived cleaning")]
pub struct EmptyInputError {
    pub dataset: Dataset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DropReason {
    MissingField,
    BadRegion,
    BadTimestamp,
}

impl DropReason {
    fn label(self) -> &'static str {
        match self {
            Self::MissingField => "missing-field",
            Self::BadRegion => "bad-region",
            Self::BadTimestamp => "bad-timestamp",
        }
    }
}

// Day-first variants come from the upstream UIDAI extracts.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Validates and normalizes one dataset. Malformed rows are dropped and
/// counted, never retried and never an error.
pub fn clean_dataset(dataset: Dataset, raw: &[RawRecord]) -> (Vec<CleanedRecord>, CleanSummary) {
    let mut summary = CleanSummary::new(dataset);
    let mut cleaned = Vec::with_capacity(raw.len());

    for (row, record) in raw.iter().enumerate() {
        match clean_record(record) {
            Ok(record) => {
                summary.kept += 1;
                cleaned.push(record);
            }
            Err(reason) => {
                match reason {
                    DropReason::MissingField => summary.missing_field += 1,
                    DropReason::BadRegion => summary.bad_region += 1,
                    DropReason::BadTimestamp => summary.bad_timestamp += 1,
                }
                debug!(dataset = %dataset, row, reason = reason.label(), "dropped row");
            }
        }
    }

    (cleaned, summary)
}

fn clean_record(record: &RawRecord) -> Result<CleanedRecord, DropReason> {
    let state_raw = field(&record.state).ok_or(DropReason::MissingField)?;
    let event_raw = field(&record.event_type).ok_or(DropReason::MissingField)?;
    let status_raw = field(&record.status).ok_or(DropReason::MissingField)?;

    // An unrecognized value in a mandatory field carries no usable signal,
    // same as an absent one.
    let event_type = EventType::parse(event_raw).ok_or(DropReason::MissingField)?;
    let status = EventStatus::parse(status_raw).ok_or(DropReason::MissingField)?;

    let state = regions::canonical_state(state_raw).ok_or(DropReason::BadRegion)?;

    let date_raw = field(&record.date).ok_or(DropReason::BadTimestamp)?;
    let occurred_at = parse_date(date_raw).ok_or(DropReason::BadTimestamp)?;

    let district = field(&record.district).map(regions::title_case);

    Ok(CleanedRecord {
        state: state.to_string(),
        district,
        event_type,
        status,
        occurred_at,
    })
}

fn field(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}
