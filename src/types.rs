use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// unique identifier for a checkout session
pub type SessionId = Uuid;

/// listing document id as issued by the listing store
pub type ListingId = String;

/// stable user id as issued by the identity provider
pub type UserId = String;

/// opaque payment reference reported by the payment gateway
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentReference(String);

impl PaymentReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PaymentReference {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// checkout session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutState {
    /// dates being chosen, quote recomputed on every change
    Quoting,
    /// handed off to the payment gateway, waiting for its outcome
    AwaitingPayment,
    /// payment succeeded
    Confirmed,
    /// provider reported failure, or the payment window expired
    Failed,
    /// user abandoned the payment
    Cancelled,
}

impl CheckoutState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckoutState::Confirmed | CheckoutState::Failed | CheckoutState::Cancelled
        )
    }
}

/// rental status shown on the renter dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentalStatus {
    Upcoming,
    Active,
    Completed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!CheckoutState::Quoting.is_terminal());
        assert!(!CheckoutState::AwaitingPayment.is_terminal());
        assert!(CheckoutState::Confirmed.is_terminal());
        assert!(CheckoutState::Failed.is_terminal());
        assert!(CheckoutState::Cancelled.is_terminal());
    }

    #[test]
    fn test_payment_reference_serializes_as_plain_string() {
        let reference = PaymentReference::new("pay_123");
        assert_eq!(serde_json::to_string(&reference).unwrap(), "\"pay_123\"");
        assert_eq!(reference.to_string(), "pay_123");
    }
}
