//! Payment-intent provider used when Admin settles payroll.

pub mod in_memory;
pub mod stripe;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use in_memory::InMemoryPaymentGateway;
pub use stripe::StripeGateway;

pub const DEFAULT_CURRENCY: &str = "usd";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("payment provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("payment provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an intent for `amount` in the currency's smallest unit.
    async fn create_intent(&self, amount: u64, currency: &str) -> Result<PaymentIntent, PaymentError>;
}
