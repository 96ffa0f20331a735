// service/payment_provider.rs
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::Config, utils::currency::naira_to_kobo};

/// What the gateway reports for a transaction. `amount` is in kobo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayTransaction {
    pub status: String,
    pub amount: i64,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway rejected the lookup: {0}")]
    Rejected(String),

    #[error("invalid gateway url: {0}")]
    InvalidUrl(String),

    #[error("transaction status is {0}")]
    NotSuccessful(String),

    #[error("amount mismatch: expected {expected} kobo, gateway reported {actual}")]
    AmountMismatch { expected: i64, actual: i64 },

    #[error("expected amount {0} cannot be converted to kobo")]
    AmountOverflow(i64),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn verify_transaction(&self, reference: &str)
        -> Result<GatewayTransaction, GatewayError>;
}

/// Confirms that `reference` is a successful transaction for exactly
/// `expected_naira`. No retries; the payer can resubmit the same reference.
pub async fn reconcile_payment(
    gateway: &dyn PaymentGateway,
    reference: &str,
    expected_naira: i64,
) -> Result<GatewayTransaction, GatewayError> {
    let expected = naira_to_kobo(expected_naira).ok_or(GatewayError::AmountOverflow(expected_naira))?;
    let transaction = gateway.verify_transaction(reference).await?;

    if transaction.status != "success" {
        return Err(GatewayError::NotSuccessful(transaction.status));
    }
    if transaction.amount != expected {
        return Err(GatewayError::AmountMismatch {
            expected,
            actual: transaction.amount,
        });
    }

    Ok(transaction)
}

#[derive(Debug, Deserialize)]
struct PaystackEnvelope {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<PaystackTransaction>,
}

#[derive(Debug, Deserialize)]
struct PaystackTransaction {
    status: String,
    amount: i64,
}

#[derive(Clone)]
pub struct PaystackGateway {
    client: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl PaystackGateway {
    pub fn new(secret_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.into(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.paystack_secret_key, &config.paystack_base_url)
    }

    fn verify_url(&self, reference: &str) -> Result<Url, GatewayError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| GatewayError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["transaction", "verify", reference]);
        Ok(url)
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<GatewayTransaction, GatewayError> {
        let url = self.verify_url(reference)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        let http_status = response.status();
        let body: PaystackEnvelope = response.json().await?;

        match body.data {
            Some(data) if body.status && http_status.is_success() => Ok(GatewayTransaction {
                status: data.status,
                amount: data.amount,
            }),
            _ => Err(GatewayError::Rejected(
                body.message
                    .unwrap_or_else(|| format!("HTTP {}", http_status)),
            )),
        }
    }
}
