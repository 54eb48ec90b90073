//! Payroll records. Paying is a one-way transition.

use serde::{Deserialize, Serialize};

use workify_core::{DomainError, DomainResult, EpochMillis, RecordId};

use crate::document::{Fields, ID_KEY, require_email, strip_keys};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// Employee being paid.
    pub email: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<EpochMillis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub created: EpochMillis,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Payment {
    pub fn owner(&self) -> &str {
        &self.email
    }

    pub fn is_paid(&self) -> bool {
        self.payment_date.is_some()
    }

    /// Record the payout. Returns `false` (and changes nothing) if the record
    /// was already paid.
    pub fn mark_paid(&mut self, transaction_id: impl Into<String>, at: EpochMillis) -> bool {
        if self.is_paid() {
            return false;
        }
        self.payment_date = Some(at);
        self.transaction_id = Some(transaction_id.into());
        true
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPayment {
    pub email: String,
    pub amount: f64,
    #[serde(default)]
    pub created: Option<EpochMillis>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl NewPayment {
    /// Payment records are always created unpaid.
    pub fn into_payment(self, id: RecordId, now: EpochMillis) -> DomainResult<Payment> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(DomainError::validation("amount must be a positive number"));
        }
        Ok(Payment {
            id,
            email: require_email(&self.email)?,
            amount: self.amount,
            payment_date: None,
            transaction_id: None,
            created: self.created.unwrap_or(now),
            fields: strip_keys(self.fields, &[ID_KEY, "paymentDate", "transactionId"]),
        })
    }
}
