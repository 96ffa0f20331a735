use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};

use crate::{config::SmtpConfig, service::notification_service::NotificationError};

fn build_message(
    smtp: &SmtpConfig,
    to_email: &str,
    subject: &str,
    text_body: &str,
    html_body: &str,
) -> Result<Message, NotificationError> {
    if to_email.is_empty() || !to_email.contains('@') {
        return Err(NotificationError::Address(to_email.to_string()));
    }

    let from = smtp
        .from_email
        .parse()
        .map_err(|_| NotificationError::Address(smtp.from_email.clone()))?;
    let to = to_email
        .parse()
        .map_err(|_| NotificationError::Address(to_email.to_string()))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(text_body.to_string()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html_body.to_string()),
                ),
        )
        .map_err(|e| NotificationError::Smtp(e.to_string()))
}

/// Sends one message over SMTP. The blocking transport runs on the
/// blocking pool so the runtime workers stay free.
pub async fn send_email(
    smtp: &SmtpConfig,
    to_email: &str,
    subject: &str,
    text_body: &str,
    html_body: &str,
) -> Result<(), NotificationError> {
    let email = build_message(smtp, to_email, subject, text_body, html_body)?;

    let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());
    let mailer = SmtpTransport::relay(&smtp.host)
        .map_err(|e| NotificationError::Smtp(e.to_string()))?
        .port(smtp.port)
        .credentials(creds)
        .build();

    tokio::task::spawn_blocking(move || mailer.send(&email))
        .await
        .map_err(|e| NotificationError::Smtp(e.to_string()))?
        .map_err(|e| NotificationError::Smtp(e.to_string()))?;

    tracing::info!("Email sent via SMTP to {}", to_email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "mailer".to_string(),
            password: "secret".to_string(),
            from_email: "PropertyVerify <noreply@propertyverify.ng>".to_string(),
        }
    }

    #[test]
    fn test_message_builds_for_valid_address() {
        let message = build_message(&smtp(), "ada@example.com", "Hello", "text", "<p>html</p>");
        assert!(message.is_ok());
    }

    #[test]
    fn test_invalid_recipient_is_rejected() {
        let err = build_message(&smtp(), "not-an-email", "Hello", "text", "<p>html</p>")
            .unwrap_err();
        assert!(matches!(err, NotificationError::Address(_)));
    }
}
