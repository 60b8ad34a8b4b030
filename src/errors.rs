use thiserror::Error;

use crate::decimal::Money;
use crate::types::{CheckoutState, ListingId, PaymentReference};

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("quote incomplete: both start and end dates are required")]
    IncompleteQuote,

    #[error("quote rejected: {reason}")]
    QuoteRejected {
        reason: String,
    },

    #[error("unauthenticated: sign in before confirming a booking")]
    Unauthenticated,

    #[error("invalid transition: cannot {action} while {current:?}")]
    InvalidTransition {
        current: CheckoutState,
        action: String,
    },

    #[error("payment reference mismatch: confirmed with {confirmed}, received {received}")]
    PaymentReferenceMismatch {
        confirmed: PaymentReference,
        received: PaymentReference,
    },

    #[error("invalid rate card: price per day {price} must not be negative")]
    InvalidRateCard {
        price: Money,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("calculation error: {message}")]
    CalculationError {
        message: String,
    },

    #[error("listing not found: {id}")]
    ListingNotFound {
        id: ListingId,
    },

    #[error("payment gateway error: {message}")]
    Gateway {
        message: String,
    },

    #[error("booking record store error: {message}")]
    Store {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BookingError>;
