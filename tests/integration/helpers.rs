//! Helper functions for integration tests

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use diskwatch::{UsageSample, monitors::disk::SampleError, monitors::disk::UsageSampler};
use tempfile::NamedTempFile;

/// Sampler answering from a fixed table of usage percentages. Paths missing from
/// the table fail like an unreadable path. Every sampled path is recorded.
pub struct TableSampler {
    usage: HashMap<String, f64>,
    pub sampled: RefCell<Vec<String>>,
}

impl TableSampler {
    pub fn new(usage: &[(&str, f64)]) -> Self {
        Self {
            usage: usage
                .iter()
                .map(|(path, percent)| (path.to_string(), *percent))
                .collect(),
            sampled: RefCell::new(vec![]),
        }
    }
}

impl UsageSampler for TableSampler {
    fn sample(&self, path: &str) -> Result<UsageSample, SampleError> {
        self.sampled.borrow_mut().push(path.to_string());
        match self.usage.get(path) {
            Some(&percent) => Ok(create_sample(percent)),
            None => Err(SampleError::PathUnreadable {
                path: PathBuf::from(path),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            }),
        }
    }
}

pub fn create_sample(percent: f64) -> UsageSample {
    let total = 500_000_000_000u64;
    let used = (total as f64 * percent / 100.0) as u64;
    UsageSample {
        total,
        used,
        free: total - used,
        percent,
    }
}

pub fn create_config_file(content: &serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{content}").unwrap();
    file
}
