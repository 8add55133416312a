use tracing::{debug, instrument, trace};

use super::disk::UsageSampler;
use crate::AlertRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageEvaluation {
    Ok,
    Exceeding,
}

impl UsageEvaluation {
    /// A path is in alert as soon as its usage reaches the threshold.
    pub fn evaluate(percent: f64, threshold: f64) -> UsageEvaluation {
        if percent >= threshold {
            return UsageEvaluation::Exceeding;
        }
        UsageEvaluation::Ok
    }
}

/// Samples every path in order and keeps those at or above `threshold`.
///
/// A path that cannot be sampled is reported on stderr and skipped; the remaining
/// alerts keep their configured order.
#[instrument(skip(sampler))]
pub fn evaluate<S>(paths: &[String], threshold: f64, sampler: &S) -> Vec<AlertRecord>
where
    S: UsageSampler + ?Sized,
{
    let mut alerts = vec![];

    for path in paths {
        let usage = match sampler.sample(path) {
            Ok(usage) => usage,
            Err(e) => {
                debug!("{path}: sampling failed: {e:?}");
                eprintln!("Failed to check {path}: {e}");
                continue;
            }
        };

        let evaluation_result = UsageEvaluation::evaluate(usage.percent, threshold);
        trace!(
            "{path}: {}% (max: {threshold}) -> {evaluation_result:?}",
            usage.percent
        );

        if evaluation_result == UsageEvaluation::Exceeding {
            debug!("{path}: usage exceeds threshold");
            alerts.push(AlertRecord::new(path, usage));
        }
    }

    alerts
}
