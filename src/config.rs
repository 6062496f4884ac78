use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    core::Ticks,
    error::SimError,
    scheduler::{AgingParams, DEFAULT_LOTTERY_QUANTUM, DEFAULT_RR_QUANTUM, PolicyParams},
};

pub const DEFAULT_MAX_TICKS: Ticks = 100_000;
pub const DEFAULT_PROCESS_COUNT: usize = 5;

/// Simulation settings, loaded from an optional JSON file and then
/// overridden from the command line. Every field has a default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Seeds both workload generation and the lottery draw.
    pub seed: u64,
    pub process_count: usize,
    /// Bound on the simulated clock; a run still unfinished at this tick is
    /// reported as non-terminating.
    pub max_ticks: Ticks,
    pub rr_quantum: Ticks,
    pub lottery_quantum: Ticks,
    pub aging: AgingParams,
    /// Registry keys to run. `None` runs all of them.
    pub policies: Option<Vec<String>>,
    pub output_dir: PathBuf,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            process_count: DEFAULT_PROCESS_COUNT,
            max_ticks: DEFAULT_MAX_TICKS,
            rr_quantum: DEFAULT_RR_QUANTUM,
            lottery_quantum: DEFAULT_LOTTERY_QUANTUM,
            aging: AgingParams::default(),
            policies: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl SimConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, SimError> {
        let raw = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| SimError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let positive = [
            ("max_ticks", self.max_ticks),
            ("rr_quantum", self.rr_quantum),
            ("lottery_quantum", self.lottery_quantum),
            ("aging.base_quantum", self.aging.base_quantum),
            ("aging.max_quantum", self.aging.max_quantum),
            ("aging.age_boost_div", self.aging.age_boost_div),
        ];
        if let Some((field, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(SimError::InvalidConfig(format!("{field} must be at least 1")));
        }
        if self.aging.base_quantum > self.aging.max_quantum {
            return Err(SimError::InvalidConfig(
                "aging.base_quantum exceeds aging.max_quantum".into(),
            ));
        }
        if !self.aging.priority_weight.is_finite() || self.aging.priority_weight < 0.0 {
            return Err(SimError::InvalidConfig(
                "aging.priority_weight must be a finite, non-negative number".into(),
            ));
        }
        if self.process_count == 0 {
            return Err(SimError::InvalidConfig("process_count must be at least 1".into()));
        }
        Ok(())
    }

    pub fn policy_params(&self) -> PolicyParams {
        PolicyParams {
            rr_quantum: self.rr_quantum,
            lottery_quantum: self.lottery_quantum,
            seed: self.seed,
            aging: self.aging.clone(),
        }
    }
}
