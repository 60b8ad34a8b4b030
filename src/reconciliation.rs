use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tokio::sync::Mutex;

use crate::records::{BookingKey, BookingRecord, BookingRecordStore, UpsertOutcome};

/// booking record whose write failed after the payment went through
#[derive(Debug, Clone)]
pub struct PendingRecord {
    pub record: BookingRecord,
    pub attempts: u32,
    pub last_error: String,
    pub queued_at: DateTime<Utc>,
}

/// outcome of one retry pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub recorded: Vec<BookingKey>,
    pub still_pending: usize,
    pub abandoned: Vec<BookingKey>,
}

/// retry queue for booking records of confirmed payments
///
/// The checkout session has already terminated as confirmed when a record
/// lands here; retries happen independently of it. Records that exhaust
/// their attempts move to the abandoned list for manual follow-up.
#[derive(Debug)]
pub struct ReconciliationQueue {
    pending: Mutex<VecDeque<PendingRecord>>,
    abandoned: Mutex<Vec<PendingRecord>>,
    max_attempts: u32,
}

impl ReconciliationQueue {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            abandoned: Mutex::new(Vec::new()),
            max_attempts: max_attempts.max(1),
        }
    }

    /// queue a record after its first failed write
    pub async fn enqueue(&self, record: BookingRecord, error: String, queued_at: DateTime<Utc>) {
        log::error!(
            "booking record {} for session {} not written after payment success: {}",
            record.key,
            record.session_id,
            error
        );
        self.pending.lock().await.push_back(PendingRecord {
            record,
            attempts: 1,
            last_error: error,
            queued_at,
        });
    }

    pub async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn abandoned(&self) -> Vec<PendingRecord> {
        self.abandoned.lock().await.clone()
    }

    /// retry every pending write once
    pub async fn retry(&self, store: &dyn BookingRecordStore) -> ReconciliationReport {
        let batch: Vec<PendingRecord> = self.pending.lock().await.drain(..).collect();
        let mut report = ReconciliationReport::default();
        let mut requeue = Vec::new();

        for mut item in batch {
            let key = item.record.key.clone();
            match store.upsert(item.record.clone()).await {
                Ok(outcome) => {
                    if outcome == UpsertOutcome::AlreadyRecorded {
                        log::debug!("booking record {} already present on retry", key);
                    } else {
                        log::info!("booking record {} written after {} attempts", key, item.attempts + 1);
                    }
                    report.recorded.push(key);
                }
                Err(e) => {
                    item.attempts += 1;
                    item.last_error = e.to_string();
                    if item.attempts >= self.max_attempts {
                        log::error!(
                            "giving up on booking record {} after {} attempts: {}",
                            key,
                            item.attempts,
                            item.last_error
                        );
                        report.abandoned.push(key);
                        self.abandoned.lock().await.push(item);
                    } else {
                        log::warn!("booking record {} retry {} failed: {}", key, item.attempts, e);
                        requeue.push(item);
                    }
                }
            }
        }

        report.still_pending = requeue.len();
        self.pending.lock().await.extend(requeue);
        report
    }
}
