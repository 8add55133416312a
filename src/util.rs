use sysinfo::System;
use tracing::level_filters::LevelFilter;

const DISKWATCH_LOG: &str = "DISKWATCH_LOG";

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::WARN;

pub fn get_log_level() -> LevelFilter {
    let level_from_env = std::env::var(DISKWATCH_LOG);
    level_from_env.map_or(DEFAULT_LOG_LEVEL, |res| {
        res.parse().unwrap_or(DEFAULT_LOG_LEVEL)
    })
}

const UNKNOWN_HOST: &str = "unknown";

/// Name of the local machine, as reported by the operating system.
pub fn get_host_name() -> String {
    System::host_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_HOST.to_string())
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `part / whole` as a percentage rounded to `decimals` places; 0 when `whole` is 0.
pub fn percent_of(part: u64, whole: u64, decimals: i32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_to(part as f64 / whole as f64 * 100.0, decimals)
}

const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Formats a byte count with one decimal place in the largest unit that keeps the
/// value below 1024. Past the last unit the value is scaled once more and still
/// labelled PB.
pub fn bytes_to_human(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in UNITS {
        if value < 1024.0 {
            return format!("{value:.1} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.1} PB")
}

/// Renders a percentage with at least one decimal place (`60.0`, `60.25`).
pub fn format_percent(percent: f64) -> String {
    if percent.fract() == 0.0 {
        format!("{percent:.1}")
    } else {
        format!("{percent}")
    }
}
