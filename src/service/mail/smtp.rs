//! SMTP mail delivery through lettre.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor, address::Envelope, transport::smtp::authentication::Credentials};
use tracing::{debug, instrument};

use super::{GenericMailClient, MailClient};
use crate::base::{
    config::Config,
    types::{Res, Void},
};

// Extra methods on `MailClient` applied by the smtp implementation.

impl MailClient {
    /// Creates a new SMTP mail client.
    pub fn smtp(config: &Config) -> Res<Self> {
        let client = SmtpMailClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

/// SMTP client implementation.
///
/// Connects to the relay with STARTTLS and authenticates with the configured credentials.
pub struct SmtpMailClient {
    from_address: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailClient {
    #[instrument(name = "SmtpMailClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
            .with_context(|| format!("Invalid SMTP relay `{}`.", config.smtp_server))?
            .port(config.smtp_port)
            .credentials(Credentials::new(config.smtp_username.clone(), config.smtp_password.clone()))
            .build();

        Ok(Self {
            from_address: config.mail_from_address.clone(),
            transport,
        })
    }
}

#[async_trait]
impl GenericMailClient for SmtpMailClient {
    fn from_address(&self) -> &str {
        &self.from_address
    }

    #[instrument(skip(self, message))]
    async fn send_plaintext(&self, message: &str, recipient: &str) -> Void {
        let from = self.from_address.parse::<Address>().with_context(|| format!("Invalid sender address `{}`.", self.from_address))?;
        let to = recipient.parse::<Address>().with_context(|| format!("Invalid recipient address `{recipient}`."))?;
        let envelope = Envelope::new(Some(from), vec![to])?;

        let response = self.transport.send_raw(&envelope, message.as_bytes()).await.context("Failed to send email.")?;

        debug!("SMTP relay answered with code {}.", response.code());

        Ok(())
    }
}
