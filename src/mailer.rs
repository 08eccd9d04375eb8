use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, warn};

use crate::config::MailConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub reply_to: Option<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        credentials: Option<(String, String)>,
        from: &str,
    ) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .context("smtp relay")?
            .port(port);
        if let Some((user, pass)) = credentials {
            builder = builder.credentials(Credentials::new(user, pass));
        }
        Ok(Self {
            transport: builder.build(),
            from: from.parse().context("parse MAIL_FROM")?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(email.to.parse().context("parse recipient")?)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN);
        if let Some(reply_to) = &email.reply_to {
            builder = builder.reply_to(reply_to.parse().context("parse reply-to")?);
        }
        let message = builder.body(email.body).context("build message")?;
        self.transport
            .send(message)
            .await
            .context("smtp send")?;
        info!(to = %email.to, subject = %email.subject, "email sent");
        Ok(())
    }
}

/// Used when no SMTP relay is configured: the message is only logged.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "smtp not configured; email logged instead of sent"
        );
        Ok(())
    }
}

pub fn from_config(cfg: &MailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    match &cfg.smtp {
        Some(smtp) => {
            let creds = match (&smtp.username, &smtp.password) {
                (Some(u), Some(p)) => Some((u.clone(), p.clone())),
                _ => None,
            };
            Ok(Arc::new(SmtpMailer::new(&smtp.host, smtp.port, creds, &cfg.from)?))
        }
        None => {
            warn!("SMTP_HOST not set; outgoing email will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Sends in the background; failures are logged and never reach the caller.
pub fn send_detached(mailer: Arc<dyn Mailer>, email: OutgoingEmail) {
    tokio::spawn(async move {
        let to = email.to.clone();
        if let Err(e) = mailer.send(email).await {
            warn!(error = ?e, %to, "background email failed");
        }
    });
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingMailer;
    use super::*;

    #[tokio::test]
    async fn log_mailer_accepts_everything() {
        let m = LogMailer;
        m.send(OutgoingEmail {
            to: "ops@example.com".into(),
            subject: "hi".into(),
            body: "body".into(),
            reply_to: None,
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn from_config_without_smtp_is_log_mailer() {
        let cfg = MailConfig {
            smtp: None,
            from: "AeroCharter <no-reply@example.com>".into(),
            contact_inbox: "ops@example.com".into(),
        };
        assert!(from_config(&cfg).is_ok());
    }

    #[tokio::test]
    async fn detached_send_swallows_failures() {
        let failing = Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        });
        send_detached(
            failing.clone(),
            OutgoingEmail {
                to: "x@example.com".into(),
                subject: "s".into(),
                body: "b".into(),
                reply_to: None,
            },
        );
        tokio::task::yield_now().await;
        assert!(failing.sent.lock().unwrap().is_empty());
    }
}
