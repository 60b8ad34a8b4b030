use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{ListingId, PaymentReference, SessionId, UserId};

/// reason recorded when the payment window closes without an outcome
pub const TIMEOUT_REASON: &str = "timeout";

/// reason recorded when the payment gateway could not be opened
pub const GATEWAY_UNAVAILABLE_REASON: &str = "gateway_unavailable";

/// what the payment gateway is asked to collect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub session_id: SessionId,
    pub amount: Money,
    /// amount in the currency's minor unit (paise for INR)
    pub amount_minor: i64,
    pub currency: String,
    pub merchant_name: String,
    pub description: String,
    pub metadata: PaymentMetadata,
    pub prefill: PayerPrefill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    pub listing_id: ListingId,
    pub caller: UserId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: u32,
}

/// payer details pre-filled on the payment sheet
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PayerPrefill {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// outcome reported back by the payment gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentOutcome {
    Succeeded { payment_reference: PaymentReference },
    Failed { reason: String },
}

impl PaymentOutcome {
    pub fn succeeded(reference: impl Into<String>) -> Self {
        PaymentOutcome::Succeeded {
            payment_reference: PaymentReference::new(reference),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        PaymentOutcome::Failed {
            reason: reason.into(),
        }
    }
}
