use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::AlertRecord;
use crate::config::Config;
use crate::util::{bytes_to_human, format_percent};

const RULE_WIDTH: usize = 40;

/// The notification produced for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMessage {
    pub subject: String,
    pub from: String,
    pub to: Vec<String>,
    pub body: String,
}

impl fmt::Display for OutgoingMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Subject: {}", self.subject)?;
        writeln!(f, "From: {}", self.from)?;
        writeln!(f, "To: {}", self.to.join(", "))?;
        writeln!(f)?;
        write!(f, "{}", self.body)
    }
}

pub fn subject(prefix: &str, hostname: &str, alert_count: usize) -> String {
    format!("{prefix} {hostname} - {alert_count} alerta(s)")
}

/// Composes the notification for `alerts`, stamped with the current time.
pub fn compose(hostname: &str, alerts: &[AlertRecord], config: &Config) -> OutgoingMessage {
    compose_at(hostname, alerts, config, Utc::now())
}

#[instrument(skip(alerts, config))]
pub fn compose_at(
    hostname: &str,
    alerts: &[AlertRecord],
    config: &Config,
    now: DateTime<Utc>,
) -> OutgoingMessage {
    let mut lines = vec![
        format!("Relatório de uso de disco - {hostname}"),
        format!("Gerado em: {}", now.format("%Y-%m-%d %H:%M:%S UTC")),
        String::new(),
        String::from("Partições com alerta (uso acima do limite):"),
        String::new(),
    ];

    for alert in alerts {
        let usage = &alert.usage;
        lines.push(format!("Caminho: {}", alert.path));
        lines.push(format!("Uso: {}%", format_percent(usage.percent)));
        lines.push(format!(
            "Total: {} | Usado: {} | Livre: {}",
            bytes_to_human(usage.total),
            bytes_to_human(usage.used),
            bytes_to_human(usage.free)
        ));
        lines.push("-".repeat(RULE_WIDTH));
    }

    OutgoingMessage {
        subject: subject(&config.mail.subject_prefix, hostname, alerts.len()),
        from: config.mail.from.clone(),
        to: config.mail.to.clone(),
        body: lines.join("\n"),
    }
}
