//! One monitoring pass: load the configuration, sample and evaluate every path,
//! then either report that everything is fine or compose and deliver the alert.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use chrono::Local;
use tracing::{debug, instrument};

use crate::config::{Config, read_config_file};
use crate::mail::MailResult;
use crate::monitors::{disk::UsageSampler, usage::evaluate};
use crate::report::{OutgoingMessage, compose};
use crate::util::format_percent;

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    ConfigFailed,
    NoAlerts,
    DryRun,
    Sent,
    DispatchFailed,
}

impl Outcome {
    pub fn code(self) -> u8 {
        match self {
            Outcome::NoAlerts | Outcome::DryRun | Outcome::Sent => 0,
            Outcome::ConfigFailed => 2,
            Outcome::DispatchFailed => 3,
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        ExitCode::from(outcome.code())
    }
}

/// Loads the configuration at `config_path` and runs one pass with it.
///
/// `force_dry_run` can only enable dry-run mode on top of the configuration.
/// Status lines and the dry-run message are written to `out`; errors go to stderr.
pub fn execute<S, D, W>(
    config_path: &Path,
    force_dry_run: bool,
    sampler: &S,
    dispatcher: D,
    out: &mut W,
) -> Outcome
where
    S: UsageSampler + ?Sized,
    D: FnOnce(&OutgoingMessage, &Config) -> MailResult<()>,
    W: Write + ?Sized,
{
    let config = match read_config_file(config_path) {
        Ok(config) => config.with_dry_run(force_dry_run),
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            return Outcome::ConfigFailed;
        }
    };

    run(&config, sampler, dispatcher, out)
}

/// Runs one pass over an already resolved configuration.
#[instrument(skip_all, fields(paths = config.paths.len(), dry_run = config.dry_run))]
pub fn run<S, D, W>(config: &Config, sampler: &S, dispatcher: D, out: &mut W) -> Outcome
where
    S: UsageSampler + ?Sized,
    D: FnOnce(&OutgoingMessage, &Config) -> MailResult<()>,
    W: Write + ?Sized,
{
    let threshold = config.threshold_percent;

    let alerts = evaluate(&config.paths, threshold, sampler);

    if alerts.is_empty() {
        status(
            out,
            format_args!(
                "[{}] No alerts. Usage within threshold ({}%).",
                Local::now().to_rfc3339(),
                format_percent(threshold)
            ),
        );
        return Outcome::NoAlerts;
    }

    let hostname = config.resolved_hostname();
    let message = compose(&hostname, &alerts, config);
    status(
        out,
        format_args!(
            "[{}] {} alert(s) - preparing notification for: {:?}",
            Local::now().to_rfc3339(),
            alerts.len(),
            config.mail.to
        ),
    );

    if config.dry_run {
        debug!("dry run, skipping delivery");
        status(out, format_args!("=== DRY RUN: email content ===\n{message}"));
        return Outcome::DryRun;
    }

    match dispatcher(&message, config) {
        Ok(()) => {
            status(out, format_args!("Email sent successfully."));
            Outcome::Sent
        }
        Err(e) => {
            eprintln!("Failed to send email: {e}");
            Outcome::DispatchFailed
        }
    }
}

/// Console output is best effort; a closed stdout must not change the outcome.
fn status<W: Write + ?Sized>(out: &mut W, line: std::fmt::Arguments<'_>) {
    if let Err(e) = writeln!(out, "{line}") {
        debug!("could not write status line: {e}");
    }
}
