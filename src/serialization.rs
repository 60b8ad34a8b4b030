/// serializable views of checkout sessions for the ui layer
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checkout::CheckoutSession;
use crate::decimal::Money;
use crate::pricing::{Quote, QuoteResult};
use crate::types::{CheckoutState, ListingId, SessionId};

/// price breakdown as displayed next to the booking form
#[derive(Debug, Serialize, Deserialize)]
pub struct QuoteView {
    pub days: u32,
    pub price_per_day: Money,
    pub subtotal: Money,
    pub service_fee: Money,
    pub security_deposit: Money,
    pub total: Money,
    pub currency: String,
}

impl QuoteView {
    pub fn from_quote(quote: &Quote) -> Self {
        QuoteView {
            days: quote.days,
            price_per_day: quote.price_per_day,
            subtotal: quote.subtotal,
            service_fee: quote.service_fee,
            security_deposit: quote.security_deposit,
            total: quote.total,
            currency: quote.currency.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListingView {
    pub id: ListingId,
    pub title: String,
    pub category: String,
    pub location: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutView {
    pub session_id: SessionId,
    pub state: CheckoutState,
    pub listing: ListingView,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// absent while a date is missing or the range is rejected
    pub quote: Option<QuoteView>,
    pub quote_status: String,
    pub can_confirm: bool,
    pub payment_deadline: Option<DateTime<Utc>>,
    pub payment_reference: Option<String>,
    pub booking_reference: Option<String>,
    pub failure_reason: Option<String>,
    pub guard_failure: Option<String>,
    pub reconciliation_pending: bool,
}

impl CheckoutView {
    pub fn from_session(session: &CheckoutSession) -> Self {
        let draft = session.draft();
        let range = draft.range();
        let times = draft.times();
        let listing = session.listing();

        let quote_status = match (session.state(), session.quote_result()) {
            (CheckoutState::Quoting, QuoteResult::Quoted(_)) => "quoted".to_string(),
            (CheckoutState::Quoting, QuoteResult::Incomplete) => "incomplete".to_string(),
            (CheckoutState::Quoting, QuoteResult::Rejected(reason)) => format!("rejected: {}", reason),
            _ => "charged".to_string(),
        };

        CheckoutView {
            session_id: session.id(),
            state: session.state(),
            listing: ListingView {
                id: listing.id.clone(),
                title: listing.title.clone(),
                category: listing.category.clone(),
                location: listing.location.clone(),
                image: listing.primary_image().map(str::to_string),
            },
            start_date: range.start_date,
            end_date: range.end_date,
            start_time: times.start_time,
            end_time: times.end_time,
            quote: session.quote().map(QuoteView::from_quote),
            quote_status,
            can_confirm: session.state() == CheckoutState::Quoting && draft.can_confirm(),
            payment_deadline: session.payment_deadline(),
            payment_reference: session.payment_reference().map(|r| r.to_string()),
            booking_reference: session.booking_reference().map(str::to_string),
            failure_reason: session.failure_reason().map(str::to_string),
            guard_failure: session.guard_failure().map(str::to_string),
            reconciliation_pending: session.is_reconciliation_pending(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
