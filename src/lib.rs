pub mod checkout;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod identity;
pub mod listing;
pub mod pricing;
pub mod reconciliation;
pub mod records;
pub mod serialization;
pub mod types;

// re-export key types
pub use checkout::{
    CheckoutService, CheckoutSession, GatewayHandle, MockPaymentGateway, PaymentGateway,
    PaymentOutcome, PaymentRequest,
};
pub use config::{CheckoutConfig, Currency, PricingConfig};
pub use decimal::{Money, Rate};
pub use errors::{BookingError, Result};
pub use events::{Event, EventStore};
pub use identity::{Identity, IdentityWatch};
pub use listing::{InMemoryListingStore, Listing, ListingFilter, ListingStore};
pub use pricing::{
    quote, BookingCalculator, BookingDraft, DateRange, DayCountPolicy, Quote, QuoteRejection,
    QuoteResult, RangePolicy, RateCard, TimeWindow,
};
pub use reconciliation::{ReconciliationQueue, ReconciliationReport};
pub use records::{BookingKey, BookingRecord, BookingRecordStore, InMemoryBookingStore, UpsertOutcome};
pub use serialization::{CheckoutView, QuoteView};
pub use types::{CheckoutState, ListingId, PaymentReference, RentalStatus, SessionId, UserId};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
