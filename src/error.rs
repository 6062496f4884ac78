use std::path::PathBuf;
use thiserror::Error;

use crate::core::Ticks;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid workload: {0}")]
    InvalidWorkload(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown policy '{0}'")]
    UnknownPolicy(String),

    #[error("policy {policy} did not terminate within {limit} ticks ({} unfinished)", .unfinished.len())]
    DidNotTerminate {
        policy: String,
        limit: Ticks,
        unfinished: Vec<String>,
    },

    #[error("malformed results file {}:{line}: {reason}", .path.display())]
    MalformedCsv {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}
