pub mod config;
pub mod mail;
pub mod monitors;
pub mod report;
pub mod runner;
pub mod util;

use serde::{Deserialize, Serialize};

/// Capacity of the filesystem backing a single path, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageSample {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

impl UsageSample {
    /// Builds a sample from raw capacity figures, deriving the percentage with two
    /// decimal places. A filesystem reporting zero capacity is considered empty.
    pub fn from_capacity(total: u64, used: u64, free: u64) -> Self {
        Self {
            total,
            used,
            free,
            percent: util::percent_of(used, total, 2),
        }
    }
}

/// A sampled path whose usage reached the configured threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub path: String,
    #[serde(flatten)]
    pub usage: UsageSample,
}

impl AlertRecord {
    pub fn new(path: impl ToString, usage: UsageSample) -> Self {
        Self {
            path: path.to_string(),
            usage,
        }
    }
}
