use std::collections::HashMap;
use std::sync::Arc;

use crate::configuration::EmailClientSettings;
use crate::domain::EmailObject;
use crate::schemas::CommunicationType;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use lettre::message::{header::ContentType, SinglePart};
use lettre::transport::smtp::{authentication::Credentials, PoolConfig};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use std::time::Duration;

pub type EmailServicePool = HashMap<CommunicationType, Arc<dyn GenericEmailService>>;

#[async_trait]
pub trait GenericEmailService: Send + Sync {
    async fn send_text_email(
        &self,
        to: &str,
        subject: &str,
        body: String,
    ) -> Result<(), anyhow::Error>;

    async fn send_html_email(
        &self,
        to: &str,
        subject: &str,
        body: String,
    ) -> Result<(), anyhow::Error>;
}

pub struct SmtpEmailClient {
    pub sender: EmailObject,
    pub mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailClient {
    #[tracing::instrument(skip(email_config))]
    pub fn new(email_config: &EmailClientSettings) -> Result<Self, anyhow::Error> {
        let sender = email_config
            .sender()
            .map_err(|e| anyhow!("Invalid sender email address: {}", e))?;
        let smtp_credentials = Credentials::new(
            email_config.username.to_string(),
            email_config.password.expose_secret().to_string(),
        );
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&email_config.base_url)
            .context("Failed to build SMTP relay")?
            .credentials(smtp_credentials)
            .timeout(Some(email_config.timeout()))
            .pool_config(
                PoolConfig::new()
                    .min_idle(1)
                    .max_size(10)
                    .idle_timeout(Duration::new(300, 0)),
            )
            .build();

        tracing::info!("SMTP transport configured for {}", &email_config.base_url);
        Ok(Self { sender, mailer })
    }

    fn message_builder(&self, to: &str, subject: &str) -> Result<lettre::message::MessageBuilder, anyhow::Error> {
        Ok(Message::builder()
            .from(self.sender.as_ref().parse().context("Invalid sender mailbox")?)
            .to(to.parse().context("Invalid recipient mailbox")?)
            .subject(subject))
    }
}

#[async_trait]
impl GenericEmailService for SmtpEmailClient {
    #[tracing::instrument(name = "Send text email", skip(self, body))]
    async fn send_text_email(
        &self,
        to: &str,
        subject: &str,
        body: String,
    ) -> Result<(), anyhow::Error> {
        let email = self
            .message_builder(to, subject)?
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .context("Failed to build email")?;
        self.mailer
            .send(email)
            .await
            .context("Failed to send email")?;
        tracing::info!("Mail Send Successfully");
        Ok(())
    }

    #[tracing::instrument(name = "Send html email", skip(self, body))]
    async fn send_html_email(
        &self,
        to: &str,
        subject: &str,
        body: String,
    ) -> Result<(), anyhow::Error> {
        let email = self
            .message_builder(to, subject)?
            .singlepart(SinglePart::html(body))
            .context("Failed to build email")?;
        self.mailer
            .send(email)
            .await
            .context("Failed to send email")?;
        tracing::info!("HTML Email Sent Successfully");
        Ok(())
    }
}

/// Logs instead of sending. Used in local runs and tests.
pub struct DummyEmailClient {}

impl DummyEmailClient {
    pub fn new() -> Self {
        tracing::info!("Using dummy email client, no mail will leave the process");
        Self {}
    }
}

impl Default for DummyEmailClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenericEmailService for DummyEmailClient {
    async fn send_text_email(
        &self,
        to: &str,
        subject: &str,
        _body: String,
    ) -> Result<(), anyhow::Error> {
        tracing::info!(to, subject, "Dummy text email");
        Ok(())
    }

    async fn send_html_email(
        &self,
        to: &str,
        subject: &str,
        _body: String,
    ) -> Result<(), anyhow::Error> {
        tracing::info!(to, subject, "Dummy html email");
        Ok(())
    }
}
