use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use uuid::Uuid;

use crate::checkout::request::{
    PayerPrefill, PaymentMetadata, PaymentOutcome, PaymentRequest, TIMEOUT_REASON,
};
use crate::config::CheckoutConfig;
use crate::errors::{BookingError, Result};
use crate::events::{Event, EventStore};
use crate::identity::Identity;
use crate::listing::Listing;
use crate::pricing::{BookingCalculator, BookingDraft, DateRange, Quote, QuoteResult, TimeWindow};
use crate::records::{BookingKey, BookingRecord};
use crate::types::{CheckoutState, PaymentReference, SessionId};

/// one attempt to pay for and confirm a booking
///
/// Lifecycle: `Quoting -> AwaitingPayment -> Confirmed`, with `Cancelled`
/// and `Failed` as the other exits from `AwaitingPayment`. A payment success
/// reported after the session was cancelled or failed is still honoured and
/// moves it to `Confirmed`; nothing else leaves a terminal state.
#[derive(Debug)]
pub struct CheckoutSession {
    id: SessionId,
    listing: Listing,
    config: CheckoutConfig,
    draft: BookingDraft,
    state: CheckoutState,
    quote: Option<Quote>,
    payer: Option<Identity>,
    payment_request: Option<PaymentRequest>,
    payment_deadline: Option<DateTime<Utc>>,
    payment_reference: Option<PaymentReference>,
    booking_reference: Option<String>,
    failure_reason: Option<String>,
    guard_failure: Option<String>,
    reconciliation_pending: bool,
    opened_at: DateTime<Utc>,
    pub events: EventStore,
}

impl CheckoutSession {
    /// open a fresh session for a listing
    pub fn open(
        listing: Listing,
        calculator: BookingCalculator,
        config: CheckoutConfig,
        time_provider: &SafeTimeProvider,
    ) -> Self {
        let now = time_provider.now();
        let id = Uuid::new_v4();
        let times = TimeWindow::new(config.default_start_time, config.default_end_time);
        let draft = BookingDraft::new(calculator, listing.rate_card, times);

        let mut events = EventStore::new();
        events.emit(Event::CheckoutOpened {
            session_id: id,
            listing_id: listing.id.clone(),
            timestamp: now,
        });

        Self {
            id,
            listing,
            config,
            draft,
            state: CheckoutState::Quoting,
            quote: None,
            payer: None,
            payment_request: None,
            payment_deadline: None,
            payment_reference: None,
            booking_reference: None,
            failure_reason: None,
            guard_failure: None,
            reconciliation_pending: false,
            opened_at: now,
            events,
        }
    }

    /// carry over dates picked on a previous screen
    pub fn with_range(mut self, range: DateRange) -> Self {
        self.draft.set_range(range);
        self
    }

    pub fn set_start_date(&mut self, input: &str) -> Result<&QuoteResult> {
        self.ensure_state(CheckoutState::Quoting, "change dates")?;
        Ok(self.draft.set_start_date(input))
    }

    pub fn set_end_date(&mut self, input: &str) -> Result<&QuoteResult> {
        self.ensure_state(CheckoutState::Quoting, "change dates")?;
        Ok(self.draft.set_end_date(input))
    }

    pub fn set_start_time(&mut self, input: &str) -> Result<()> {
        self.ensure_state(CheckoutState::Quoting, "change times")?;
        self.draft.set_start_time(input)
    }

    pub fn set_end_time(&mut self, input: &str) -> Result<()> {
        self.ensure_state(CheckoutState::Quoting, "change times")?;
        self.draft.set_end_time(input)
    }

    /// hand the booking to the payment gateway
    ///
    /// Refused, leaving the session in `Quoting`, when the current inputs do
    /// not produce a quote or when nobody is signed in.
    pub fn confirm(
        &mut self,
        identity: Option<&Identity>,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentRequest> {
        self.ensure_state(CheckoutState::Quoting, "confirm")?;
        let now = time_provider.now();

        let quote = match self.draft.fresh_quote() {
            Ok(quote) => quote,
            Err(e) => {
                self.refuse(e.to_string(), now);
                return Err(e);
            }
        };

        let Some(payer) = identity.cloned() else {
            self.refuse("unauthenticated".to_string(), now);
            return Err(BookingError::Unauthenticated);
        };

        let (start_date, end_date) = self
            .draft
            .range()
            .bounds()
            .ok_or(BookingError::IncompleteQuote)?;
        let currency = &self.draft.calculator().config().currency;

        let request = PaymentRequest {
            session_id: self.id,
            amount: quote.total,
            amount_minor: quote.total_in_minor_units(currency.minor_unit_scale)?,
            currency: currency.code.clone(),
            merchant_name: self.config.merchant_name.clone(),
            description: format!("Booking for {}", self.listing.title),
            metadata: PaymentMetadata {
                listing_id: self.listing.id.clone(),
                caller: payer.uid.clone(),
                start_date,
                end_date,
                days: quote.days,
            },
            prefill: PayerPrefill {
                name: payer.display_name.clone(),
                email: payer.email.clone(),
            },
        };

        let deadline = now + self.config.payment_timeout();
        self.events.emit(Event::PaymentRequested {
            session_id: self.id,
            amount: quote.total,
            currency: request.currency.clone(),
            deadline,
            timestamp: now,
        });

        self.guard_failure = None;
        self.quote = Some(quote);
        self.payer = Some(payer);
        self.payment_request = Some(request.clone());
        self.payment_deadline = Some(deadline);
        self.transition(CheckoutState::AwaitingPayment, now);

        Ok(request)
    }

    /// apply the gateway's reported outcome
    ///
    /// Returns the booking record to persist when a payment success confirms
    /// the session for the first time.
    pub fn apply_outcome(
        &mut self,
        outcome: PaymentOutcome,
        time_provider: &SafeTimeProvider,
    ) -> Result<Option<BookingRecord>> {
        match outcome {
            PaymentOutcome::Succeeded { payment_reference } => {
                self.payment_succeeded(payment_reference, time_provider)
            }
            PaymentOutcome::Failed { reason } => {
                self.payment_failed(reason, time_provider)?;
                Ok(None)
            }
        }
    }

    pub fn payment_succeeded(
        &mut self,
        reference: PaymentReference,
        time_provider: &SafeTimeProvider,
    ) -> Result<Option<BookingRecord>> {
        let now = time_provider.now();

        match self.state {
            CheckoutState::AwaitingPayment => {}
            CheckoutState::Cancelled | CheckoutState::Failed => {
                // late success reconciles into Confirmed
                log::warn!(
                    "session {}: payment {} reported after {:?}, reconciling",
                    self.id,
                    reference,
                    self.state
                );
                self.events.emit(Event::LatePaymentReconciled {
                    session_id: self.id,
                    payment_reference: reference.clone(),
                    previous_state: self.state,
                    timestamp: now,
                });
                self.failure_reason = None;
            }
            CheckoutState::Confirmed => {
                return match &self.payment_reference {
                    Some(existing) if *existing == reference => {
                        log::debug!("session {}: duplicate success for {}", self.id, reference);
                        Ok(None)
                    }
                    Some(existing) => {
                        log::warn!(
                            "session {}: second payment {} after confirmed {}",
                            self.id,
                            reference,
                            existing
                        );
                        Err(BookingError::PaymentReferenceMismatch {
                            confirmed: existing.clone(),
                            received: reference,
                        })
                    }
                    None => Err(self.invalid("record payment success")),
                };
            }
            CheckoutState::Quoting => return Err(self.invalid("record payment success")),
        }

        let record = self.booking_record(&reference, now)?;

        self.events.emit(Event::PaymentSucceeded {
            session_id: self.id,
            payment_reference: reference.clone(),
            amount: record.quote.total,
            timestamp: now,
        });
        self.payment_reference = Some(reference);
        self.transition(CheckoutState::Confirmed, now);

        Ok(Some(record))
    }

    pub fn payment_failed(
        &mut self,
        reason: String,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time_provider.now();

        match self.state {
            CheckoutState::AwaitingPayment => {
                self.events.emit(Event::PaymentFailed {
                    session_id: self.id,
                    reason: reason.clone(),
                    timestamp: now,
                });
                self.failure_reason = Some(reason);
                self.transition(CheckoutState::Failed, now);
                Ok(())
            }
            CheckoutState::Cancelled | CheckoutState::Failed => {
                log::debug!(
                    "session {}: ignoring failure {:?} while {:?}",
                    self.id,
                    reason,
                    self.state
                );
                Ok(())
            }
            CheckoutState::Confirmed => {
                log::warn!(
                    "session {}: failure {:?} reported after confirmation, keeping confirmed",
                    self.id,
                    reason
                );
                Err(self.invalid("record payment failure"))
            }
            CheckoutState::Quoting => Err(self.invalid("record payment failure")),
        }
    }

    /// user abandoned the payment sheet; the gateway is not contacted
    pub fn cancel(&mut self, time_provider: &SafeTimeProvider) -> Result<()> {
        self.ensure_state(CheckoutState::AwaitingPayment, "cancel")?;
        let now = time_provider.now();

        self.events.emit(Event::CheckoutCancelled {
            session_id: self.id,
            timestamp: now,
        });
        self.transition(CheckoutState::Cancelled, now);
        Ok(())
    }

    /// fail the session if the payment window has closed; true when it did
    pub fn check_deadline(&mut self, time_provider: &SafeTimeProvider) -> bool {
        if self.state != CheckoutState::AwaitingPayment {
            return false;
        }
        let Some(deadline) = self.payment_deadline else {
            return false;
        };

        let now = time_provider.now();
        if now <= deadline {
            return false;
        }

        self.events.emit(Event::PaymentTimedOut {
            session_id: self.id,
            deadline,
            timestamp: now,
        });
        self.failure_reason = Some(TIMEOUT_REASON.to_string());
        self.transition(CheckoutState::Failed, now);
        true
    }

    /// note that the booking record is stored
    pub fn record_written(&mut self, key: &BookingKey, time_provider: &SafeTimeProvider) {
        let booking_reference = key.to_string();
        self.events.emit(Event::BookingRecorded {
            session_id: self.id,
            booking_reference: booking_reference.clone(),
            timestamp: time_provider.now(),
        });
        self.booking_reference = Some(booking_reference);
        self.reconciliation_pending = false;
    }

    /// note that the booking record write failed and was queued for retry
    pub fn record_deferred(&mut self, key: &BookingKey, error: &str, time_provider: &SafeTimeProvider) {
        self.events.emit(Event::BookingRecordDeferred {
            session_id: self.id,
            booking_reference: key.to_string(),
            error: error.to_string(),
            timestamp: time_provider.now(),
        });
        self.reconciliation_pending = true;
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    /// live quote while quoting, the charged quote afterwards
    pub fn quote(&self) -> Option<&Quote> {
        match self.state {
            CheckoutState::Quoting => self.draft.quote().as_quote(),
            _ => self.quote.as_ref(),
        }
    }

    pub fn quote_result(&self) -> &QuoteResult {
        self.draft.quote()
    }

    pub fn payer(&self) -> Option<&Identity> {
        self.payer.as_ref()
    }

    pub fn payment_request(&self) -> Option<&PaymentRequest> {
        self.payment_request.as_ref()
    }

    pub fn payment_deadline(&self) -> Option<DateTime<Utc>> {
        self.payment_deadline
    }

    pub fn payment_reference(&self) -> Option<&PaymentReference> {
        self.payment_reference.as_ref()
    }

    pub fn booking_reference(&self) -> Option<&str> {
        self.booking_reference.as_deref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// why the last confirm was refused, if it was
    pub fn guard_failure(&self) -> Option<&str> {
        self.guard_failure.as_deref()
    }

    pub fn is_reconciliation_pending(&self) -> bool {
        self.reconciliation_pending
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    fn booking_record(&self, reference: &PaymentReference, now: DateTime<Utc>) -> Result<BookingRecord> {
        let (Some(payer), Some(quote)) = (&self.payer, &self.quote) else {
            return Err(self.invalid("record payment success"));
        };
        let (start_date, end_date) = self
            .draft
            .range()
            .bounds()
            .ok_or(BookingError::IncompleteQuote)?;

        Ok(BookingRecord {
            key: BookingKey {
                caller: payer.uid.clone(),
                payment_reference: reference.clone(),
            },
            session_id: self.id,
            listing_id: self.listing.id.clone(),
            listing_title: self.listing.title.clone(),
            listing_image: self.listing.primary_image().map(str::to_string),
            start_date,
            end_date,
            times: self.draft.times(),
            quote: quote.clone(),
            recorded_at: now,
        })
    }

    fn refuse(&mut self, reason: String, now: DateTime<Utc>) {
        log::debug!("session {}: confirm refused: {}", self.id, reason);
        self.events.emit(Event::ConfirmRefused {
            session_id: self.id,
            reason: reason.clone(),
            timestamp: now,
        });
        self.guard_failure = Some(reason);
    }

    fn transition(&mut self, new_state: CheckoutState, now: DateTime<Utc>) {
        let old_state = self.state;
        self.state = new_state;
        log::debug!("session {}: {:?} -> {:?}", self.id, old_state, new_state);
        self.events.emit(Event::StateChanged {
            session_id: self.id,
            old_state,
            new_state,
            timestamp: now,
        });
    }

    fn ensure_state(&self, expected: CheckoutState, action: &str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &str) -> BookingError {
        BookingError::InvalidTransition {
            current: self.state,
            action: action.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::request::GATEWAY_UNAVAILABLE_REASON;
    use crate::decimal::Money;
    use crate::pricing::RateCard;
    use chrono::{Duration, TimeZone};
    use hourglass_rs::TimeSource;

    fn time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
        ))
    }

    fn listing(price: i64) -> Listing {
        Listing {
            id: "bike-42".to_string(),
            title: "Road bike".to_string(),
            category: "Sports".to_string(),
            location: "Bengaluru".to_string(),
            images: vec!["https://img.example/bike-42.jpg".to_string()],
            owner_id: "owner-9".to_string(),
            rate_card: RateCard::per_day(price).unwrap(),
            rating: None,
        }
    }

    fn renter() -> Identity {
        Identity::new("user-1")
            .with_display_name("Asha")
            .with_email("asha@example.com")
    }

    fn session(price: i64, start: &str, end: &str, time: &SafeTimeProvider) -> CheckoutSession {
        CheckoutSession::open(
            listing(price),
            BookingCalculator::standard(),
            CheckoutConfig::standard(),
            time,
        )
        .with_range(DateRange::from_inputs(start, end))
    }

    fn awaiting(time: &SafeTimeProvider) -> CheckoutSession {
        let mut s = session(200, "2024-01-01", "2024-01-05", time);
        s.confirm(Some(&renter()), time).unwrap();
        s
    }

    #[test]
    fn test_confirm_builds_payment_request() {
        let time = time();
        let mut s = session(200, "2024-01-01", "2024-01-05", &time);

        let request = s.confirm(Some(&renter()), &time).unwrap();

        assert_eq!(s.state(), CheckoutState::AwaitingPayment);
        assert_eq!(request.amount, Money::from_major(940));
        assert_eq!(request.amount_minor, 94_000);
        assert_eq!(request.currency, "INR");
        assert_eq!(request.description, "Booking for Road bike");
        assert_eq!(request.metadata.caller, "user-1");
        assert_eq!(request.metadata.days, 4);
        assert_eq!(request.prefill.email.as_deref(), Some("asha@example.com"));
        assert_eq!(s.payment_deadline(), Some(time.now() + Duration::minutes(15)));
        assert_eq!(s.quote().unwrap().total, Money::from_major(940));
    }

    #[test]
    fn test_incomplete_quote_keeps_quoting() {
        let time = time();
        let mut s = session(200, "", "2024-01-05", &time);

        assert!(matches!(
            s.confirm(Some(&renter()), &time),
            Err(BookingError::IncompleteQuote)
        ));
        assert_eq!(s.state(), CheckoutState::Quoting);
        assert!(s.guard_failure().is_some());
        assert!(s.payment_request().is_none());
    }

    #[test]
    fn test_unauthenticated_keeps_quoting() {
        let time = time();
        let mut s = session(100, "2024-01-01", "2024-01-01", &time);

        assert!(matches!(s.confirm(None, &time), Err(BookingError::Unauthenticated)));
        assert_eq!(s.state(), CheckoutState::Quoting);
        assert_eq!(s.guard_failure(), Some("unauthenticated"));

        // signing in and retrying clears the refusal
        s.confirm(Some(&renter()), &time).unwrap();
        assert_eq!(s.guard_failure(), None);
        assert_eq!(s.payer().unwrap().uid, "user-1");
    }

    #[test]
    fn test_dates_locked_after_confirm() {
        let time = time();
        let mut s = awaiting(&time);

        assert!(matches!(
            s.set_end_date("2024-02-01"),
            Err(BookingError::InvalidTransition { .. })
        ));
        assert_eq!(s.quote().unwrap().days, 4);
    }

    #[test]
    fn test_success_confirms_and_yields_record() {
        let time = time();
        let mut s = awaiting(&time);

        let record = s
            .apply_outcome(PaymentOutcome::succeeded("pay_123"), &time)
            .unwrap()
            .unwrap();

        assert_eq!(s.state(), CheckoutState::Confirmed);
        assert_eq!(s.payment_reference().unwrap().as_str(), "pay_123");
        assert_eq!(record.key.to_string(), "user-1/pay_123");
        assert_eq!(record.quote.total, Money::from_major(940));
        assert_eq!(record.listing_image.as_deref(), Some("https://img.example/bike-42.jpg"));
    }

    #[test]
    fn test_provider_failure() {
        let time = time();
        let mut s = awaiting(&time);

        let record = s
            .apply_outcome(PaymentOutcome::failed("card_declined"), &time)
            .unwrap();

        assert!(record.is_none());
        assert_eq!(s.state(), CheckoutState::Failed);
        assert_eq!(s.failure_reason(), Some("card_declined"));
    }

    #[test]
    fn test_success_after_cancel_is_reconciled() {
        let time = time();
        let mut s = awaiting(&time);
        s.cancel(&time).unwrap();
        assert_eq!(s.state(), CheckoutState::Cancelled);

        let record = s
            .apply_outcome(PaymentOutcome::succeeded("pay_123"), &time)
            .unwrap();

        assert!(record.is_some());
        assert_eq!(s.state(), CheckoutState::Confirmed);
        assert_eq!(s.payment_reference().unwrap().as_str(), "pay_123");
        assert!(s.take_events().iter().any(|e| matches!(
            e,
            Event::LatePaymentReconciled { previous_state: CheckoutState::Cancelled, .. }
        )));
    }

    #[test]
    fn test_success_after_declined_card_is_reconciled() {
        let time = time();
        let mut s = awaiting(&time);
        s.apply_outcome(PaymentOutcome::failed("card_declined"), &time).unwrap();
        assert_eq!(s.state(), CheckoutState::Failed);

        let record = s
            .apply_outcome(PaymentOutcome::succeeded("pay_retry"), &time)
            .unwrap();

        assert_eq!(record.unwrap().key.to_string(), "user-1/pay_retry");
        assert_eq!(s.state(), CheckoutState::Confirmed);
        assert_eq!(s.failure_reason(), None);
        assert!(s.take_events().iter().any(|e| matches!(
            e,
            Event::LatePaymentReconciled { previous_state: CheckoutState::Failed, .. }
        )));

        // the repeated callback is a no-op
        assert!(s
            .apply_outcome(PaymentOutcome::succeeded("pay_retry"), &time)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_success_after_gateway_unavailable_is_reconciled() {
        let time = time();
        let mut s = awaiting(&time);
        s.payment_failed(GATEWAY_UNAVAILABLE_REASON.to_string(), &time).unwrap();
        assert_eq!(s.failure_reason(), Some(GATEWAY_UNAVAILABLE_REASON));

        let record = s.payment_succeeded("pay_2".into(), &time).unwrap();

        assert!(record.is_some());
        assert_eq!(s.state(), CheckoutState::Confirmed);
        assert_eq!(s.payment_reference().unwrap().as_str(), "pay_2");
    }

    #[test]
    fn test_failure_after_cancel_stays_cancelled() {
        let time = time();
        let mut s = awaiting(&time);
        s.cancel(&time).unwrap();

        s.apply_outcome(PaymentOutcome::failed("card_declined"), &time).unwrap();
        assert_eq!(s.state(), CheckoutState::Cancelled);
        assert_eq!(s.failure_reason(), None);
    }

    #[test]
    fn test_duplicate_success_yields_no_second_record() {
        let time = time();
        let mut s = awaiting(&time);

        assert!(s.payment_succeeded("pay_123".into(), &time).unwrap().is_some());
        assert!(s.payment_succeeded("pay_123".into(), &time).unwrap().is_none());
        assert!(matches!(
            s.payment_succeeded("pay_999".into(), &time),
            Err(BookingError::PaymentReferenceMismatch { .. })
        ));
        assert_eq!(s.payment_reference().unwrap().as_str(), "pay_123");
    }

    #[test]
    fn test_failure_after_confirmation_is_refused() {
        let time = time();
        let mut s = awaiting(&time);
        s.payment_succeeded("pay_1".into(), &time).unwrap();

        assert!(s.payment_failed("card_declined".to_string(), &time).is_err());
        assert_eq!(s.state(), CheckoutState::Confirmed);
    }

    #[test]
    fn test_no_outcome_before_confirm() {
        let time = time();
        let mut s = session(200, "2024-01-01", "2024-01-05", &time);

        assert!(s.payment_succeeded("pay_1".into(), &time).is_err());
        assert!(s.cancel(&time).is_err());
        assert_eq!(s.state(), CheckoutState::Quoting);
    }

    #[test]
    fn test_timeout_fails_session() {
        let time = time();
        let control = time.test_control().unwrap();
        let mut s = awaiting(&time);

        control.advance(Duration::minutes(10));
        assert!(!s.check_deadline(&time));
        assert_eq!(s.state(), CheckoutState::AwaitingPayment);

        control.advance(Duration::minutes(6));
        assert!(s.check_deadline(&time));
        assert_eq!(s.state(), CheckoutState::Failed);
        assert_eq!(s.failure_reason(), Some(TIMEOUT_REASON));

        // a late success is still honoured
        s.payment_succeeded("pay_late".into(), &time).unwrap();
        assert_eq!(s.state(), CheckoutState::Confirmed);
        assert_eq!(s.failure_reason(), None);
    }

    #[test]
    fn test_state_change_events() {
        let time = time();
        let mut s = awaiting(&time);
        s.payment_succeeded("pay_1".into(), &time).unwrap();

        let transitions: Vec<(CheckoutState, CheckoutState)> = s
            .take_events()
            .into_iter()
            .filter_map(|e| match e {
                Event::StateChanged { old_state, new_state, .. } => Some((old_state, new_state)),
                _ => None,
            })
            .collect();

        assert_eq!(
            transitions,
            vec![
                (CheckoutState::Quoting, CheckoutState::AwaitingPayment),
                (CheckoutState::AwaitingPayment, CheckoutState::Confirmed),
            ]
        );
    }
}
