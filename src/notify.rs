use anyhow::{Context, Result};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::{MailConfig, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub subject: String,
    pub body: String,
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, email: &Email) -> Result<()>;
}

pub fn create_notifier(config: &MailConfig) -> Result<Box<dyn Notifier>> {
    match config.transport {
        Transport::Smtp => Ok(Box::new(SmtpNotifier::new(config)?)),
        Transport::Stdout => Ok(Box::new(StdoutNotifier)),
    }
}

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl SmtpNotifier {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let from = config
            .from
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("[mail] from is not set"))?
            .parse::<Mailbox>()
            .context("Invalid [mail] from address")?;
        let to = config
            .to
            .iter()
            .map(|addr| {
                addr.parse::<Mailbox>()
                    .with_context(|| format!("Invalid recipient '{addr}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        if to.is_empty() {
            anyhow::bail!("No email recipients configured");
        }

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .with_context(|| format!("Invalid SMTP host '{}'", config.smtp_host))?
            .port(config.smtp_port);
        match (&config.username, &config.password) {
            (Some(user), Some(pass)) => {
                builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
            }
            (Some(_), None) => {
                tracing::warn!("SMTP username set without a password; sending unauthenticated")
            }
            _ => {}
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    fn build_message(&self, email: &Email) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        for rcpt in &self.to {
            builder = builder.to(rcpt.clone());
        }
        builder
            .body(email.body.clone())
            .context("Failed to build email")
    }
}

#[async_trait::async_trait]
impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, email: &Email) -> Result<()> {
        let message = self.build_message(email)?;
        let response = self
            .transport
            .send(message)
            .await
            .context("SMTP send failed")?;
        tracing::info!(
            "Email sent to {} recipient(s): {}",
            self.to.len(),
            response.code()
        );
        Ok(())
    }
}

/// Dry-run notifier.
pub struct StdoutNotifier;

#[async_trait::async_trait]
impl Notifier for StdoutNotifier {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn send(&self, email: &Email) -> Result<()> {
        println!("\n📧 {}\n\n{}\n", email.subject, email.body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail() -> MailConfig {
        MailConfig {
            from: Some("Nudge <nudge@example.com>".into()),
            to: vec!["a@example.com".into(), "b@example.com".into()],
            ..MailConfig::default()
        }
    }

    #[tokio::test]
    async fn test_smtp_message_has_all_recipients() {
        let notifier = SmtpNotifier::new(&mail()).unwrap();
        let message = notifier
            .build_message(&Email {
                subject: "Hello".into(),
                body: "Body".into(),
            })
            .unwrap();
        let rcpts: Vec<String> = message.envelope().to().iter().map(|a| a.to_string()).collect();
        assert_eq!(rcpts, vec!["a@example.com", "b@example.com"]);
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Hello"));
    }

    #[tokio::test]
    async fn test_smtp_rejects_bad_address() {
        let mut cfg = mail();
        cfg.to.push("not an address".into());
        assert!(SmtpNotifier::new(&cfg).is_err());
    }

    #[test]
    fn test_factory_picks_transport() {
        let mut cfg = mail();
        cfg.transport = Transport::Stdout;
        assert_eq!(create_notifier(&cfg).unwrap().name(), "stdout");
    }
}
