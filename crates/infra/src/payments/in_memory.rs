use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use super::{PaymentError, PaymentGateway, PaymentIntent};

/// A created intent, kept for inspection in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedIntent {
    pub intent: PaymentIntent,
    pub amount: u64,
    pub currency: String,
}

/// Deterministic provider for dev/test: ids are `pi_1`, `pi_2`, ...
#[derive(Debug, Default)]
pub struct InMemoryPaymentGateway {
    next: AtomicU64,
    created: Mutex<Vec<RecordedIntent>>,
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<RecordedIntent> {
        self.created.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_intent(&self, amount: u64, currency: &str) -> Result<PaymentIntent, PaymentError> {
        if amount == 0 {
            return Err(PaymentError::InvalidAmount);
        }

        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        let intent = PaymentIntent {
            id: format!("pi_{n}"),
            client_secret: format!("pi_{n}_secret_local"),
        };

        if let Ok(mut created) = self.created.lock() {
            created.push(RecordedIntent {
                intent: intent.clone(),
                amount,
                currency: currency.to_string(),
            });
        }
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_are_sequential() {
        let gateway = InMemoryPaymentGateway::new();
        let a = gateway.create_intent(5000, "usd").await.unwrap();
        let b = gateway.create_intent(7000, "usd").await.unwrap();
        assert_eq!(a.id, "pi_1");
        assert_eq!(b.id, "pi_2");
        assert_eq!(gateway.created()[1].amount, 7000);
    }

    #[tokio::test]
    async fn zero_amount_is_rejected() {
        let gateway = InMemoryPaymentGateway::new();
        assert!(matches!(
            gateway.create_intent(0, "usd").await,
            Err(PaymentError::InvalidAmount)
        ));
        assert!(gateway.created().is_empty());
    }
}
