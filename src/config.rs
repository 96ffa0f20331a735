// config.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
}

#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub api_key: String,
    pub sender_id: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    /// Token lifetime in minutes.
    pub jwt_maxage: i64,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub frontend_url: String,

    // Payment gateway
    pub paystack_secret_key: String,
    pub paystack_base_url: String,

    // Workflow
    pub admin_phone: Option<String>,
    pub require_payment_before_assignment: bool,

    // Notification channels; disabled when not configured
    pub smtp: Option<SmtpConfig>,
    pub sms: Option<SmsConfig>,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET_KEY")?;
        let jwt_maxage = parsed("JWT_MAXAGE", 60 * 24 * 7)?;
        let port = parsed("PORT", 8000)?;
        let database_max_connections = parsed("DATABASE_MAX_CONNECTIONS", 10)?;

        let allowed_origins = optional("ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["http://localhost:5173".to_string()]);

        let frontend_url =
            optional("FRONTEND_URL").unwrap_or_else(|| "http://localhost:5173".to_string());

        let paystack_secret_key = optional("PAYSTACK_SECRET_KEY").unwrap_or_default();
        let paystack_base_url = optional("PAYSTACK_BASE_URL")
            .unwrap_or_else(|| "https://api.paystack.co".to_string());

        let admin_phone = optional("ADMIN_PHONE");
        let require_payment_before_assignment =
            parsed("REQUIRE_PAYMENT_BEFORE_ASSIGNMENT", false)?;

        let smtp = match optional("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: parsed("SMTP_PORT", 587)?,
                username: optional("SMTP_USERNAME").unwrap_or_default(),
                password: optional("SMTP_PASSWORD").unwrap_or_default(),
                from_email: optional("FROM_EMAIL")
                    .unwrap_or_else(|| "PropertyVerify <noreply@propertyverify.ng>".to_string()),
            }),
            None => None,
        };

        let sms = optional("TERMII_API_KEY").map(|api_key| SmsConfig {
            api_key,
            sender_id: optional("TERMII_SENDER_ID").unwrap_or_else(|| "PropVerify".to_string()),
            base_url: optional("TERMII_BASE_URL")
                .unwrap_or_else(|| "https://api.ng.termii.com".to_string()),
        });

        Ok(Config {
            database_url,
            database_max_connections,
            jwt_secret,
            jwt_maxage,
            port,
            allowed_origins,
            frontend_url,
            paystack_secret_key,
            paystack_base_url,
            admin_phone,
            require_payment_before_assignment,
            smtp,
            sms,
        })
    }
}
