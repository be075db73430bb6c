use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming a weight config file, consulted when no
/// `--weights` flag is given.
pub const WEIGHTS_ENV: &str = "ARIS_WEIGHTS";

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read weight config {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid weight config {path}: {source}")]
    Invalid {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("risk weight `{name}` must be a finite non-negative number, got {value}")]
    BadWeight { name: &'static str, value: f64 },
    #[error("risk weights must sum to 1.0, got {0:.4}")]
    BadWeightSum(f64),
}

/// How state scores relate to district scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollupPolicy {
    /// State scores come from state-grouped records; a state with district
    /// scores but no direct records falls back to its district average.
    #[default]
    Direct,
    /// State rates are always the record-count-weighted average of district
    /// rates; a state with no district-carrying rows falls back to its
    /// direct metrics.
    DistrictAverage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    pub update_failure: f64,
    pub biometric_mismatch: f64,
    pub enrolment_delay: f64,
    #[serde(default)]
    pub rollup: RollupPolicy,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            update_failure: 0.4,
            biometric_mismatch: 0.4,
            enrolment_delay: 0.2,
            rollup: RollupPolicy::Direct,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("update_failure", self.update_failure),
            ("biometric_mismatch", self.biometric_mismatch),
            ("enrolment_delay", self.enrolment_delay),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::BadWeight { name, value });
            }
        }

        let sum = self.update_failure + self.biometric_mismatch + self.enrolment_delay;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::BadWeightSum(sum));
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Resolution order: explicit flag, then the `ARIS_WEIGHTS` file, then
    /// built-in defaults.
    pub fn resolve(flag: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = flag {
            return Self::from_file(path);
        }
        if let Ok(path) = std::env::var(WEIGHTS_ENV) {
            return Self::from_file(Path::new(&path));
        }
        Ok(Self::default())
    }
}
