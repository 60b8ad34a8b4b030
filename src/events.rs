use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{CheckoutState, ListingId, PaymentReference, SessionId};

/// notifications emitted by a checkout session for the UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    CheckoutOpened {
        session_id: SessionId,
        listing_id: ListingId,
        timestamp: DateTime<Utc>,
    },
    ConfirmRefused {
        session_id: SessionId,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    PaymentRequested {
        session_id: SessionId,
        amount: Money,
        currency: String,
        deadline: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
    PaymentSucceeded {
        session_id: SessionId,
        payment_reference: PaymentReference,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentFailed {
        session_id: SessionId,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    PaymentTimedOut {
        session_id: SessionId,
        deadline: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
    CheckoutCancelled {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
    },
    /// payment success that arrived after the session had been cancelled or timed out
    LatePaymentReconciled {
        session_id: SessionId,
        payment_reference: PaymentReference,
        previous_state: CheckoutState,
        timestamp: DateTime<Utc>,
    },
    BookingRecorded {
        session_id: SessionId,
        booking_reference: String,
        timestamp: DateTime<Utc>,
    },
    /// the booking record write failed and was queued for retry
    BookingRecordDeferred {
        session_id: SessionId,
        booking_reference: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
    StateChanged {
        session_id: SessionId,
        old_state: CheckoutState,
        new_state: CheckoutState,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
