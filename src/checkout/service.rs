use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use std::sync::Arc;

use crate::checkout::gateway::PaymentGateway;
use crate::checkout::request::{PaymentOutcome, GATEWAY_UNAVAILABLE_REASON};
use crate::checkout::session::CheckoutSession;
use crate::config::CheckoutConfig;
use crate::errors::Result;
use crate::identity::Identity;
use crate::listing::ListingStore;
use crate::pricing::{BookingCalculator, DateRange};
use crate::reconciliation::{ReconciliationQueue, ReconciliationReport};
use crate::records::{BookingRecord, BookingRecordStore, UpsertOutcome};
use crate::types::{CheckoutState, RentalStatus};

/// drives checkout sessions against the external collaborators
pub struct CheckoutService {
    listings: Arc<dyn ListingStore>,
    gateway: Arc<dyn PaymentGateway>,
    records: Arc<dyn BookingRecordStore>,
    calculator: BookingCalculator,
    config: CheckoutConfig,
    reconciliation: ReconciliationQueue,
}

impl CheckoutService {
    pub fn new(
        listings: Arc<dyn ListingStore>,
        gateway: Arc<dyn PaymentGateway>,
        records: Arc<dyn BookingRecordStore>,
        calculator: BookingCalculator,
        config: CheckoutConfig,
    ) -> Result<Self> {
        config.validate()?;
        let reconciliation = ReconciliationQueue::new(config.max_reconciliation_attempts);

        Ok(Self {
            listings,
            gateway,
            records,
            calculator,
            config,
            reconciliation,
        })
    }

    /// open a session for a listing, optionally with dates already picked
    pub async fn open_session(
        &self,
        listing_id: &str,
        range: Option<DateRange>,
        time_provider: &SafeTimeProvider,
    ) -> Result<CheckoutSession> {
        let listing = self.listings.fetch_listing(listing_id).await?;
        let session = CheckoutSession::open(
            listing,
            self.calculator.clone(),
            self.config.clone(),
            time_provider,
        );
        log::info!("session {} opened for listing {}", session.id(), listing_id);

        Ok(match range {
            Some(range) => session.with_range(range),
            None => session,
        })
    }

    /// confirm the session and open the payment gateway
    ///
    /// Guard failures come back as `Err` with the session still quoting. A
    /// gateway that cannot be opened fails the session instead.
    pub async fn begin_payment(
        &self,
        session: &mut CheckoutSession,
        identity: Option<&Identity>,
        time_provider: &SafeTimeProvider,
    ) -> Result<CheckoutState> {
        let request = session.confirm(identity, time_provider)?;

        match self.gateway.open(&request).await {
            Ok(handle) => {
                log::info!(
                    "session {}: payment of {} {} opened ({:?})",
                    session.id(),
                    request.amount,
                    request.currency,
                    handle.redirect_url
                );
            }
            Err(e) => {
                log::warn!("session {}: gateway unavailable: {}", session.id(), e);
                session.payment_failed(GATEWAY_UNAVAILABLE_REASON.to_string(), time_provider)?;
            }
        }

        Ok(session.state())
    }

    /// apply a gateway callback and persist the booking on success
    pub async fn handle_outcome(
        &self,
        session: &mut CheckoutSession,
        outcome: PaymentOutcome,
        time_provider: &SafeTimeProvider,
    ) -> Result<CheckoutState> {
        if let Some(record) = session.apply_outcome(outcome, time_provider)? {
            self.persist(session, record, time_provider).await;
        }
        Ok(session.state())
    }

    /// fail the session if its payment window has closed
    pub fn expire_if_overdue(&self, session: &mut CheckoutSession, time_provider: &SafeTimeProvider) -> bool {
        let expired = session.check_deadline(time_provider);
        if expired {
            log::warn!("session {}: no payment outcome before deadline", session.id());
        }
        expired
    }

    /// retry booking record writes that failed after payment success
    pub async fn retry_reconciliation(&self) -> ReconciliationReport {
        self.reconciliation.retry(self.records.as_ref()).await
    }

    pub fn reconciliation(&self) -> &ReconciliationQueue {
        &self.reconciliation
    }

    /// the caller's bookings with their status on `today`
    pub async fn rentals_for(
        &self,
        caller: &str,
        today: NaiveDate,
    ) -> Result<Vec<(BookingRecord, RentalStatus)>> {
        let records = self.records.records_for(caller).await?;
        Ok(records
            .into_iter()
            .map(|record| {
                let status = record.status_on(today);
                (record, status)
            })
            .collect())
    }

    async fn persist(
        &self,
        session: &mut CheckoutSession,
        record: BookingRecord,
        time_provider: &SafeTimeProvider,
    ) {
        let key = record.key.clone();

        match self.records.upsert(record.clone()).await {
            Ok(outcome) => {
                if outcome == UpsertOutcome::AlreadyRecorded {
                    log::debug!("booking record {} already present", key);
                }
                session.record_written(&key, time_provider);
            }
            Err(e) => {
                // confirmed stays confirmed; the write is retried out of band
                let error = e.to_string();
                session.record_deferred(&key, &error, time_provider);
                self.reconciliation
                    .enqueue(record, error, time_provider.now())
                    .await;
            }
        }
    }
}
