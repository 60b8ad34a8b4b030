use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::errors::{BookingError, Result};
use crate::pricing::{Quote, TimeWindow};
use crate::types::{ListingId, PaymentReference, RentalStatus, SessionId, UserId};

/// idempotency key of a booking record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookingKey {
    pub caller: UserId,
    pub payment_reference: PaymentReference,
}

impl fmt::Display for BookingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.caller, self.payment_reference)
    }
}

/// paid booking as written to the booking record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub key: BookingKey,
    pub session_id: SessionId,
    pub listing_id: ListingId,
    pub listing_title: String,
    pub listing_image: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub times: TimeWindow,
    pub quote: Quote,
    pub recorded_at: DateTime<Utc>,
}

impl BookingRecord {
    /// where the rental stands on a given day
    pub fn status_on(&self, today: NaiveDate) -> RentalStatus {
        let first = self.start_date.min(self.end_date);
        let last = self.start_date.max(self.end_date);

        if today < first {
            RentalStatus::Upcoming
        } else if today <= last {
            RentalStatus::Active
        } else {
            RentalStatus::Completed
        }
    }
}

/// result of an idempotent upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// a record with the same key already existed and was left untouched
    AlreadyRecorded,
}

/// persistence for paid bookings
#[async_trait]
pub trait BookingRecordStore: Send + Sync {
    /// insert unless a record with the same key exists
    async fn upsert(&self, record: BookingRecord) -> Result<UpsertOutcome>;

    /// all bookings made by a caller, oldest first
    async fn records_for(&self, caller: &str) -> Result<Vec<BookingRecord>>;
}

/// booking store backed by a map, for tests and demos
#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    records: RwLock<BTreeMap<BookingKey, BookingRecord>>,
    failures_remaining: AtomicUsize,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// make the next `count` writes fail, to exercise reconciliation
    pub fn fail_next_writes(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &BookingKey) -> Option<BookingRecord> {
        self.records.read().ok()?.get(key).cloned()
    }

    fn take_injected_failure(&self) -> bool {
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl BookingRecordStore for InMemoryBookingStore {
    async fn upsert(&self, record: BookingRecord) -> Result<UpsertOutcome> {
        if self.take_injected_failure() {
            return Err(BookingError::Store {
                message: format!("write of {} rejected", record.key),
            });
        }

        let mut records = self.records.write().map_err(|e| BookingError::Store {
            message: format!("booking store lock poisoned: {}", e),
        })?;

        if records.contains_key(&record.key) {
            return Ok(UpsertOutcome::AlreadyRecorded);
        }
        records.insert(record.key.clone(), record);
        Ok(UpsertOutcome::Inserted)
    }

    async fn records_for(&self, caller: &str) -> Result<Vec<BookingRecord>> {
        let records = self.records.read().map_err(|e| BookingError::Store {
            message: format!("booking store lock poisoned: {}", e),
        })?;
        let mut mine: Vec<BookingRecord> = records
            .values()
            .filter(|r| r.key.caller == caller)
            .cloned()
            .collect();
        mine.sort_by_key(|r| r.recorded_at);
        Ok(mine)
    }
}
