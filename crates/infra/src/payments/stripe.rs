//! Stripe PaymentIntents over HTTPS.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use super::{PaymentError, PaymentGateway, PaymentIntent};

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl core::fmt::Debug for StripeGateway {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StripeGateway")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        }
    }

    fn intents_url(&self) -> String {
        format!("{}/v1/payment_intents", self.api_base)
    }
}

/// Best-effort extraction of Stripe's `error.message`.
fn rejection_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self), err)]
    async fn create_intent(&self, amount: u64, currency: &str) -> Result<PaymentIntent, PaymentError> {
        if amount == 0 {
            return Err(PaymentError::InvalidAmount);
        }

        let amount = amount.to_string();
        let res = self
            .client
            .post(self.intents_url())
            .bearer_auth(&self.secret_key)
            .form(&[("amount", amount.as_str()), ("currency", currency)])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&body),
            });
        }

        let intent: IntentResponse = res.json().await?;
        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }
}
