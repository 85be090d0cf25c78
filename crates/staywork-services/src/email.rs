//! Email delivery via SMTP.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use staywork_core::{AppError, AppResult, SmtpConfig};
use std::sync::Arc;

/// Outbound email seam. Notification delivery degrades to in-app only when no
/// sender is configured.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()>;
}

#[derive(Clone)]
pub struct SmtpEmailSender {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl SmtpEmailSender {
    pub fn from_config(config: &SmtpConfig) -> AppResult<Self> {
        let builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::ExternalService(format!("Invalid SMTP host: {}", e)))?
            .port(config.port);

        let builder = match (&config.username, &config.password) {
            (Some(user), Some(password)) => {
                builder.credentials(Credentials::new(user.clone(), password.clone()))
            }
            _ => builder,
        };

        tracing::info!(
            host = %config.host,
            port = config.port,
            "Email sender initialized (SMTP with STARTTLS)"
        );

        Ok(Self {
            mailer: Arc::new(builder.build()),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let to_addr: Mailbox = to
            .parse()
            .map_err(|e| AppError::Validation(format!("Invalid recipient address: {}", e)))?;
        let from_addr: Mailbox = self
            .from
            .parse()
            .map_err(|e| AppError::ExternalService(format!("Invalid SMTP_FROM: {}", e)))?;

        let email = Message::builder()
            .from(from_addr)
            .to(to_addr)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| AppError::ExternalService(format!("SMTP send failed: {}", e)))?;

        tracing::info!(to = %to, "Notification email sent");
        Ok(())
    }
}
