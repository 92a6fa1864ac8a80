use std::time::Duration;

use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error as ThisError;

use crate::config::email::EmailSettings;
use crate::db::notifications::{pending_emails, record_email_result};
use crate::models::notification::{NotificationType, PendingEmail};

const SMTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, ThisError)]
pub enum EmailError {
    #[error("Invalid email address: {0}")]
    InvalidAddress(#[from] lettre::address::AddressError),
    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailOutcome {
    Sent,
    Skipped,
}

#[derive(Debug, Default, Clone, PartialEq, serde::Serialize)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
}

/// Outgoing SMTP mail. Without a transport every message is logged and skipped.
#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl EmailService {
    pub fn new(settings: &EmailSettings) -> Result<Self, EmailError> {
        let from: Mailbox = settings.from_address.parse()?;

        if !settings.enabled {
            tracing::info!("Email delivery disabled, notifications will not be emailed");
            return Ok(Self { transport: None, from });
        }

        let builder = if settings.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.smtp_host)
        };
        let mut builder = builder
            .port(settings.smtp_port)
            .timeout(Some(Duration::from_secs(SMTP_TIMEOUT_SECS)));
        if settings.has_credentials() {
            builder = builder.credentials(Credentials::new(
                settings.username.clone(),
                settings.password.expose_secret().to_string(),
            ));
        }

        tracing::info!("SMTP relay configured at {}:{}", settings.smtp_host, settings.smtp_port);
        Ok(Self {
            transport: Some(builder.build()),
            from,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    #[tracing::instrument(name = "Send email", skip(self, body), fields(to = %to, subject = %subject))]
    pub async fn send(&self, to: &str, subject: &str, body: String) -> Result<EmailOutcome, EmailError> {
        let Some(transport) = &self.transport else {
            tracing::info!("Email disabled - skipping delivery");
            return Ok(EmailOutcome::Skipped);
        };

        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse::<Mailbox>()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        transport.send(message).await?;
        tracing::info!("Email delivered");
        Ok(EmailOutcome::Sent)
    }
}

/// Subject and plain-text body for a notification email.
pub fn render_notification_email(pending: &PendingEmail) -> (String, String) {
    let prefix = match pending.notification_type {
        NotificationType::RiskAlert => "[Pulsewise alert]",
        NotificationType::WeeklySummary => "[Pulsewise weekly]",
        NotificationType::ImportReport | NotificationType::System => "[Pulsewise]",
    };
    let subject = format!("{} {}", prefix, pending.title);
    let body = format!(
        "Hi {},\n\n{}\n\nYou can turn these emails off in your profile settings.\n\n- Pulsewise",
        pending.username, pending.message
    );
    (subject, body)
}

/// Email up to `limit` pending notifications and record each result.
///
/// Failed deliveries stay pending until they run out of attempts.
pub async fn dispatch_pending(
    pool: &PgPool,
    email: &EmailService,
    limit: i64,
) -> Result<DispatchReport, sqlx::Error> {
    let mut report = DispatchReport::default();
    if !email.is_enabled() {
        return Ok(report);
    }

    for pending in pending_emails(pool, limit).await? {
        let (subject, body) = render_notification_email(&pending);
        let delivered = match email.send(&pending.email, &subject, body).await {
            Ok(EmailOutcome::Sent) => true,
            Ok(EmailOutcome::Skipped) => continue,
            Err(e) => {
                tracing::error!(
                    "Failed to email notification {} (attempt {}): {}",
                    pending.id,
                    pending.email_attempts + 1,
                    e
                );
                false
            }
        };

        record_email_result(pool, pending.id, delivered).await?;
        if delivered {
            report.sent += 1;
        } else {
            report.failed += 1;
        }
    }

    if report.sent + report.failed > 0 {
        tracing::info!("Email dispatch: {} sent, {} failed", report.sent, report.failed);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn pending(notification_type: NotificationType) -> PendingEmail {
        PendingEmail {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            notification_type,
            title: "Health alert".to_string(),
            message: "Heart rate of 130 bpm is high.".to_string(),
            email_attempts: 0,
        }
    }

    #[test]
    fn alert_email_is_prefixed_and_greets_user() {
        let (subject, body) = render_notification_email(&pending(NotificationType::RiskAlert));
        assert_eq!(subject, "[Pulsewise alert] Health alert");
        assert!(body.starts_with("Hi ada,"));
        assert!(body.contains("Heart rate of 130 bpm is high."));
    }

    #[tokio::test]
    async fn disabled_service_skips_delivery() {
        let service = EmailService::new(&EmailSettings::disabled()).expect("valid settings");
        assert!(!service.is_enabled());

        let outcome = service
            .send("ada@example.com", "subject", "body".to_string())
            .await
            .expect("skipping never fails");
        assert_eq!(outcome, EmailOutcome::Skipped);
    }

    #[test]
    fn invalid_sender_is_rejected() {
        let mut settings = EmailSettings::disabled();
        settings.from_address = "not an address".to_string();
        assert!(matches!(EmailService::new(&settings), Err(EmailError::InvalidAddress(_))));
    }
}
