use rand::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::{
    core::{ProcessTable, Ticks},
    error::SimError,
};

/// Static description of one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub name: String,
    pub priority: u32,
    pub simulated_arrival_time: Ticks,
    pub service_time: Ticks,
}

impl ProcessSpec {
    pub fn new(
        name: impl Into<String>,
        priority: u32,
        simulated_arrival_time: Ticks,
        service_time: Ticks,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            simulated_arrival_time,
            service_time,
        }
    }
}

/// An ordered, validated set of process descriptors shared by every policy
/// under evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Workload {
    specs: Vec<ProcessSpec>,
}

impl Workload {
    pub fn new(specs: Vec<ProcessSpec>) -> Result<Self, SimError> {
        Self::validate(&specs)?;
        Ok(Self { specs })
    }

    fn validate(specs: &[ProcessSpec]) -> Result<(), SimError> {
        if specs.is_empty() {
            return Err(SimError::InvalidWorkload("workload has no processes".into()));
        }

        let mut names = FxHashSet::default();
        for spec in specs {
            if spec.service_time == 0 {
                return Err(SimError::InvalidWorkload(format!(
                    "{} needs at least one tick of service",
                    spec.name
                )));
            }
            if spec.priority == 0 {
                return Err(SimError::InvalidWorkload(format!(
                    "{} has priority 0, priorities start at 1",
                    spec.name
                )));
            }
            if !names.insert(spec.name.as_str()) {
                return Err(SimError::InvalidWorkload(format!(
                    "duplicate process name {}",
                    spec.name
                )));
            }
        }
        Ok(())
    }

    /// `count` processes named `Process-1..=count` with priority in 1..=10,
    /// arrival in 0..=10 and service time in 1..=10.
    pub fn random(count: usize, seed: u64) -> Result<Self, SimError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let specs = (1..=count)
            .map(|i| ProcessSpec {
                name: format!("Process-{i}"),
                priority: rng.random_range(1..=10),
                simulated_arrival_time: rng.random_range(0..=10),
                service_time: rng.random_range(1..=10),
            })
            .collect();
        Self::new(specs)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SimError> {
        let raw = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let specs = serde_json::from_str(&raw).map_err(|source| SimError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(specs)
    }

    /// Writes the workload in the format [`Workload::from_json_file`] reads,
    /// so a generated workload can be replayed.
    pub fn to_json_file(&self, path: &Path) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| SimError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn specs(&self) -> &[ProcessSpec] {
        &self.specs
    }

    pub fn total_service_time(&self) -> Ticks {
        self.specs.iter().map(|s| s.service_time).sum()
    }

    /// A brand new process table in NEW state.
    pub fn instantiate(&self) -> ProcessTable {
        ProcessTable::from_specs(&self.specs)
    }
}
