use std::path::{Path, PathBuf};

use tracing::info;

use crate::clean::{self, EmptyInputError};
use crate::config::RiskConfig;
use crate::ingest;
use crate::models::{CleanSummary, CleanedRecord, Dataset, RiskScore};
use crate::risk;

#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub demographic: PathBuf,
    pub biometric: PathBuf,
    pub enrolment: PathBuf,
}

impl PipelineInputs {
    fn datasets(&self) -> [(Dataset, &Path); 3] {
        [
            (Dataset::Demographic, &self.demographic),
            (Dataset::Biometric, &self.biometric),
            (Dataset::Enrolment, &self.enrolment),
        ]
    }
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub records: Vec<CleanedRecord>,
    pub state_table: Vec<RiskScore>,
    pub district_table: Vec<RiskScore>,
    pub summaries: Vec<CleanSummary>,
}

/// Runs clean → aggregate → score over the three datasets. All fatal checks
/// happen here, before the exporter ever touches the output files.
pub fn run(inputs: &PipelineInputs, config: &RiskConfig) -> anyhow::Result<PipelineOutput> {
    config.validate()?;

    let mut records = Vec::new();
    let mut summaries = Vec::new();
    for (dataset, path) in inputs.datasets() {
        let raw = ingest::read_records(dataset, path)?;
        let (cleaned, summary) = clean::clean_dataset(dataset, &raw);
        if cleaned.is_empty() {
            return Err(EmptyInputError { dataset }.into());
        }
        info!(
            dataset = %dataset,
            kept = summary.kept,
            dropped = summary.dropped(),
            "cleaned dataset"
        );
        records.extend(cleaned);
        summaries.push(summary);
    }

    let district_table = risk::score_regions(&risk::district_metrics(&records), config);
    let state_table = risk::state_scores(&records, &district_table, config);
    info!(
        states = state_table.len(),
        districts = district_table.len(),
        "scored regions"
    );

    Ok(PipelineOutput {
        records,
        state_table,
        district_table,
        summaries,
    })
}
