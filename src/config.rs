use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use tracing::trace;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading the configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fully resolved configuration. Every field is populated, either from the
/// configuration file or from [`Config::default`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub paths: Vec<String>,
    pub threshold_percent: f64,
    /// Accepted for compatibility; runs are single-shot.
    pub check_interval_minutes: f64,
    pub smtp: SmtpConfig,
    pub mail: MailConfig,
    pub hostname: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MailConfig {
    pub from: String,
    pub to: Vec<String>,
    pub subject_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: vec![String::from("/")],
            threshold_percent: 85.0,
            check_interval_minutes: 10.0,
            smtp: SmtpConfig::default(),
            mail: MailConfig::default(),
            hostname: None,
            dry_run: false,
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::from("smtp.example.com"),
            port: 587,
            use_tls: true,
            username: Some(String::from("monitor@example.com")),
            password: Some(String::from("SUA_SENHA_AQUI")),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: String::from("monitor@example.com"),
            to: vec![String::from("admin@example.com")],
            subject_prefix: String::from("[ALERTA DISCO]"),
        }
    }
}

impl Config {
    /// Forces dry-run mode on. Never turns it off.
    pub fn with_dry_run(mut self, force: bool) -> Self {
        self.dry_run |= force;
        self
    }

    /// Hostname to report, falling back to the name of the local machine.
    pub fn resolved_hostname(&self) -> String {
        self.hostname
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(crate::util::get_host_name)
    }
}

/// The configuration exactly as stated in the file. Absent keys are `None`.
///
/// Fields that may legitimately be `null` (`hostname`, `smtp.username`,
/// `smtp.password`) are double options: `Some(None)` means the file cleared the
/// value explicitly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfig {
    pub paths: Option<Vec<String>>,
    pub threshold_percent: Option<f64>,
    pub check_interval_minutes: Option<f64>,
    #[serde(default, deserialize_with = "section")]
    pub smtp: Option<RawSmtpConfig>,
    #[serde(default, deserialize_with = "section")]
    pub mail: Option<RawMailConfig>,
    #[serde(default, deserialize_with = "explicit")]
    pub hostname: Option<Option<String>>,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSmtpConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub use_tls: Option<bool>,
    #[serde(default, deserialize_with = "explicit")]
    pub username: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub password: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMailConfig {
    pub from: Option<String>,
    pub to: Option<Vec<String>>,
    pub subject_prefix: Option<String>,
}

/// Keeps a present-but-null field distinguishable from an absent one.
fn explicit<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Nested sections may be left out, but a section given as `null` is rejected.
fn section<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Overlays `raw` on top of `defaults`. Nested `smtp` and `mail` sections are
/// merged field by field, so a partial section keeps the remaining defaults.
pub fn merge(defaults: Config, raw: RawConfig) -> Config {
    let smtp = match raw.smtp {
        Some(smtp) => merge_smtp(defaults.smtp, smtp),
        None => defaults.smtp,
    };
    let mail = match raw.mail {
        Some(mail) => merge_mail(defaults.mail, mail),
        None => defaults.mail,
    };

    Config {
        paths: raw.paths.unwrap_or(defaults.paths),
        threshold_percent: raw.threshold_percent.unwrap_or(defaults.threshold_percent),
        check_interval_minutes: raw
            .check_interval_minutes
            .unwrap_or(defaults.check_interval_minutes),
        smtp,
        mail,
        hostname: raw.hostname.unwrap_or(defaults.hostname),
        dry_run: raw.dry_run.unwrap_or(defaults.dry_run),
    }
}

fn merge_smtp(defaults: SmtpConfig, raw: RawSmtpConfig) -> SmtpConfig {
    SmtpConfig {
        host: raw.host.unwrap_or(defaults.host),
        port: raw.port.unwrap_or(defaults.port),
        use_tls: raw.use_tls.unwrap_or(defaults.use_tls),
        username: raw.username.unwrap_or(defaults.username),
        password: raw.password.unwrap_or(defaults.password),
    }
}

fn merge_mail(defaults: MailConfig, raw: RawMailConfig) -> MailConfig {
    MailConfig {
        from: raw.from.unwrap_or(defaults.from),
        to: raw.to.unwrap_or(defaults.to),
        subject_prefix: raw.subject_prefix.unwrap_or(defaults.subject_prefix),
    }
}

pub fn parse_config(path: &Path, content: &str) -> ConfigResult<Config> {
    let raw = serde_json::from_str::<RawConfig>(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    trace!("raw config: {raw:?}");
    Ok(merge(Config::default(), raw))
}

/// Reads the configuration file at `path` and resolves it against the defaults.
pub fn read_config_file(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config(path, &content).inspect(|config| trace!("loaded config: {config:?}"))
}
