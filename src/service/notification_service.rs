// service/notification_service.rs
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::{
    config::{Config, SmsConfig, SmtpConfig},
    mail::sendmail,
};

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("invalid address: {0}")]
    Address(String),

    #[error("smtp error: {0}")]
    Smtp(String),

    #[error("sms gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sms gateway rejected the message: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub destination: String,
    pub subject: Option<String>,
    pub body: String,
    pub html: Option<String>,
}

impl Notification {
    pub fn sms(phone: impl Into<String>, body: impl Into<String>) -> Self {
        Notification {
            destination: phone.into(),
            subject: None,
            body: body.into(),
            html: None,
        }
    }

    pub fn email(
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        html: impl Into<String>,
    ) -> Self {
        Notification {
            destination: to.into(),
            subject: Some(subject.into()),
            body: body.into(),
            html: Some(html.into()),
        }
    }
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Used when no SMS provider is configured: the message only reaches the log.
pub struct LogSmsChannel;

#[async_trait]
impl NotificationChannel for LogSmsChannel {
    fn name(&self) -> &'static str {
        "sms-log"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        tracing::info!("SMS to {}: {}", notification.destination, notification.body);
        Ok(())
    }
}

pub struct TermiiSmsChannel {
    client: reqwest::Client,
    config: SmsConfig,
}

impl TermiiSmsChannel {
    pub fn new(config: SmsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl NotificationChannel for TermiiSmsChannel {
    fn name(&self) -> &'static str {
        "sms-termii"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let url = format!("{}/api/sms/send", self.config.base_url.trim_end_matches('/'));
        let payload = json!({
            "to": notification.destination.trim_start_matches('+'),
            "from": self.config.sender_id,
            "sms": notification.body,
            "type": "plain",
            "channel": "generic",
            "api_key": self.config.api_key,
        });

        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "No response body".to_string());
            Err(NotificationError::Rejected(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )))
        }
    }
}

pub struct SmtpEmailChannel {
    config: SmtpConfig,
}

impl SmtpEmailChannel {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl NotificationChannel for SmtpEmailChannel {
    fn name(&self) -> &'static str {
        "email-smtp"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let subject = notification.subject.as_deref().unwrap_or("PropertyVerify");
        let html = notification
            .html
            .clone()
            .unwrap_or_else(|| format!("<p>{}</p>", notification.body));

        sendmail::send_email(
            &self.config,
            &notification.destination,
            subject,
            &notification.body,
            &html,
        )
        .await
    }
}

/// Best-effort outbound messages. Every send runs on its own task; the
/// caller never waits for delivery and never sees a delivery failure.
#[derive(Clone)]
pub struct NotificationService {
    sms: Arc<dyn NotificationChannel>,
    email: Option<Arc<dyn NotificationChannel>>,
}

impl NotificationService {
    pub fn new(
        sms: Arc<dyn NotificationChannel>,
        email: Option<Arc<dyn NotificationChannel>>,
    ) -> Self {
        Self { sms, email }
    }

    pub fn from_config(config: &Config) -> Self {
        let sms: Arc<dyn NotificationChannel> = match config.sms.clone() {
            Some(sms) => Arc::new(TermiiSmsChannel::new(sms)),
            None => Arc::new(LogSmsChannel),
        };
        let email = config
            .smtp
            .clone()
            .map(|smtp| Arc::new(SmtpEmailChannel::new(smtp)) as Arc<dyn NotificationChannel>);

        Self::new(sms, email)
    }

    pub fn send_sms(&self, notification: Notification) -> JoinHandle<()> {
        dispatch(self.sms.clone(), notification)
    }

    /// Returns `None` when email is not configured.
    pub fn send_email(&self, notification: Notification) -> Option<JoinHandle<()>> {
        match &self.email {
            Some(channel) => Some(dispatch(channel.clone(), notification)),
            None => {
                tracing::debug!(
                    "Email disabled, dropping message to {}",
                    notification.destination
                );
                None
            }
        }
    }
}

fn dispatch(channel: Arc<dyn NotificationChannel>, notification: Notification) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = channel.send(&notification).await {
            tracing::warn!(
                "Notification via {} to {} failed: {}",
                channel.name(),
                notification.destination,
                e
            );
        }
    })
}
