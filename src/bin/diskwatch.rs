use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use diskwatch::{mail, monitors::disk::SystemSampler, runner::execute, util::get_log_level};
use tracing::trace;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Disk usage monitor with email alerts
#[derive(Debug, Clone, Parser)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Do not send emails, only print what would be sent
    #[arg(long)]
    dry_run: bool,
}

fn init() {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_targets(vec![
        ("diskwatch", get_log_level()),
        ("lettre", get_log_level()),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let sampler = SystemSampler::new();
    let mut stdout = std::io::stdout().lock();
    execute(
        &args.config,
        args.dry_run,
        &sampler,
        |message, config| mail::send(message, &config.smtp),
        &mut stdout,
    )
    .into()
}
