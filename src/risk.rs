use std::collections::HashMap;

use crate::config::{RiskConfig, RollupPolicy};
use crate::models::{CleanedRecord, RegionMetrics, RiskScore};

// Separator between state and district in a district region name. State
// names never contain "/", so the state half is always recoverable.
const REGION_SEPARATOR: &str = " / ";

pub fn district_region(state: &str, district: &str) -> String {
    format!("{state}{REGION_SEPARATOR}{district}")
}

/// Per-state tallies over every record, district-carrying or not.
pub fn state_metrics(records: &[CleanedRecord]) -> Vec<RegionMetrics> {
    group_metrics(records.iter().map(|record| (record.state.clone(), record)))
}

/// Per-district tallies; state-only rows carry no district and are skipped.
pub fn district_metrics(records: &[CleanedRecord]) -> Vec<RegionMetrics> {
    group_metrics(records.iter().filter_map(|record| {
        record
            .district
            .as_ref()
            .map(|district| (district_region(&record.state, district), record))
    }))
}

fn group_metrics<'a, I>(keyed: I) -> Vec<RegionMetrics>
where
    I: Iterator<Item = (String, &'a CleanedRecord)>,
{
    let mut groups: HashMap<String, RegionMetrics> = HashMap::new();
    for (region, record) in keyed {
        groups
            .entry(region.clone())
            .or_insert_with(|| RegionMetrics::new(region))
            .observe(record);
    }
    groups.into_values().collect()
}

/// Scores and ranks one granularity. Only observed regions are present, so
/// a region with no records never enters the table.
pub fn score_regions(metrics: &[RegionMetrics], config: &RiskConfig) -> Vec<RiskScore> {
    let mut scores: Vec<RiskScore> = metrics
        .iter()
        .map(|metrics| score_one(metrics, config))
        .collect();
    rank(&mut scores);
    scores
}

/// State table under the configured roll-up policy. Both policies fall back
/// to the other source for states visible only on one side.
pub fn state_scores(
    records: &[CleanedRecord],
    district_table: &[RiskScore],
    config: &RiskConfig,
) -> Vec<RiskScore> {
    let direct: HashMap<String, RegionMetrics> = state_metrics(records)
        .into_iter()
        .map(|metrics| (metrics.region.clone(), metrics))
        .collect();
    let rolled = rollup_from_districts(district_table, config);

    let mut scores = Vec::new();
    match config.rollup {
        RollupPolicy::Direct => {
            for metrics in direct.values() {
                scores.push(score_one(metrics, config));
            }
            for (state, score) in &rolled {
                if !direct.contains_key(state) {
                    scores.push(score.clone());
                }
            }
        }
        RollupPolicy::DistrictAverage => {
            for score in rolled.values() {
                scores.push(score.clone());
            }
            for (state, metrics) in &direct {
                if !rolled.contains_key(state) {
                    scores.push(score_one(metrics, config));
                }
            }
        }
    }

    rank(&mut scores);
    scores
}

pub fn composite(
    update_failure: f64,
    biometric_mismatch: f64,
    enrolment_delay: f64,
    config: &RiskConfig,
) -> f64 {
    (config.update_failure * update_failure
        + config.biometric_mismatch * biometric_mismatch
        + config.enrolment_delay * enrolment_delay)
        * 100.0
}

fn score_one(metrics: &RegionMetrics, config: &RiskConfig) -> RiskScore {
    let update_failure_rate = metrics.update_failure_rate();
    let biometric_mismatch_rate = metrics.biometric_mismatch_rate();
    let enrolment_delay_rate = metrics.enrolment_delay_rate();

    RiskScore {
        region: metrics.region.clone(),
        score: composite(
            update_failure_rate,
            biometric_mismatch_rate,
            enrolment_delay_rate,
            config,
        ),
        rank: 0,
        update_failure_rate,
        biometric_mismatch_rate,
        enrolment_delay_rate,
        record_count: metrics.record_count,
    }
}

// Score descending, ties by ascending region name; ranks are the resulting
// 1-based positions, so the ordering is a strict total order.
fn rank(scores: &mut [RiskScore]) {
    scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.region.cmp(&b.region))
    });
    for (index, score) in scores.iter_mut().enumerate() {
        score.rank = index + 1;
    }
}

// Record-count-weighted average of district rates per state. Stands in for
// population weighting; no population dataset is ingested.
fn rollup_from_districts(
    district_table: &[RiskScore],
    config: &RiskConfig,
) -> HashMap<String, RiskScore> {
    #[derive(Default)]
    struct Accumulator {
        records: u64,
        update_failure: f64,
        biometric_mismatch: f64,
        enrolment_delay: f64,
    }

    let mut states: HashMap<String, Accumulator> = HashMap::new();
    for district in district_table {
        let Some((state, _)) = district.region.split_once(REGION_SEPARATOR) else {
            continue;
        };
        let weight = district.record_count as f64;
        let entry = states.entry(state.to_string()).or_default();
        entry.records += district.record_count;
        entry.update_failure += district.update_failure_rate * weight;
        entry.biometric_mismatch += district.biometric_mismatch_rate * weight;
        entry.enrolment_delay += district.enrolment_delay_rate * weight;
    }

    states
        .into_iter()
        .filter(|(_, acc)| acc.records > 0)
        .map(|(state, acc)| {
            let total = acc.records as f64;
            let update_failure_rate = acc.update_failure / total;
            let biometric_mismatch_rate = acc.biometric_mismatch / total;
            let enrolment_delay_rate = acc.enrolment_delay / total;
            let score = RiskScore {
                region: state.clone(),
                score: composite(
                    update_failure_rate,
                    biometric_mismatch_rate,
                    enrolment_delay_rate,
                    config,
                ),
                rank: 0,
                update_failure_rate,
                biometric_mismatch_rate,
                enrolment_delay_rate,
                record_count: acc.records,
            };
            (state, score)
        })
        .collect()
}
