//! Email delivery over SMTP
//!
//! Each send opens its own session (the transport is built without a connection
//! pool), so the connection is closed with `QUIT` once the message went out or the
//! exchange failed.

use std::time::Duration;

use lettre::{
    Message, SmtpTransport, Transport,
    address::AddressError,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::{debug, instrument};

use crate::config::SmtpConfig;
use crate::report::OutgoingMessage;

pub const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

pub type MailResult<T> = Result<T, MailError>;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: AddressError,
    },

    #[error("could not build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(String),
}

fn mailbox(address: &str) -> MailResult<Mailbox> {
    address.parse().map_err(|source| MailError::Address {
        address: address.to_string(),
        source,
    })
}

impl OutgoingMessage {
    /// Builds the plain-text email addressed to every recipient at once.
    pub fn to_email(&self) -> MailResult<Message> {
        let mut builder = Message::builder()
            .from(mailbox(&self.from)?)
            .subject(self.subject.clone())
            .header(ContentType::TEXT_PLAIN);

        for recipient in &self.to {
            builder = builder.to(mailbox(recipient)?);
        }

        Ok(builder.body(self.body.clone())?)
    }
}

/// Builds the SMTP transport described by `config`.
///
/// With `use_tls` the session is upgraded through STARTTLS before authenticating;
/// the client repeats `EHLO` after the upgrade. Credentials are only used when a
/// non-empty username is configured.
pub fn smtp_transport(config: &SmtpConfig) -> MailResult<SmtpTransport> {
    let builder = if config.use_tls {
        SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
    } else {
        SmtpTransport::builder_dangerous(&config.host)
    };

    let mut builder = builder.port(config.port).timeout(Some(SMTP_TIMEOUT));

    if let Some(username) = &config.username
        && !username.is_empty()
    {
        let password = config.password.clone().unwrap_or_default();
        builder = builder.credentials(Credentials::new(username.clone(), password));
    }

    Ok(builder.build())
}

/// Delivers `message` through an arbitrary transport.
#[instrument(skip_all, fields(subject = %message.subject))]
pub fn dispatch<T>(transport: &T, message: &OutgoingMessage) -> MailResult<()>
where
    T: Transport,
    T::Error: std::fmt::Display,
{
    let email = message.to_email()?;
    transport
        .send(&email)
        .map_err(|e| MailError::Transport(e.to_string()))?;
    debug!("delivered message to {} recipient(s)", message.to.len());
    Ok(())
}

/// Sends `message` over a fresh SMTP session to the configured server.
pub fn send(message: &OutgoingMessage, config: &SmtpConfig) -> MailResult<()> {
    debug!(
        "opening SMTP session to {}:{} (starttls: {})",
        config.host, config.port, config.use_tls
    );
    let transport = smtp_transport(config)?;
    dispatch(&transport, message)
}
