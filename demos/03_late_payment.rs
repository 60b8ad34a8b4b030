/// late payment - a success reported after cancellation is still honoured,
/// and a failed record write is retried out of band
use std::sync::Arc;

use rentmate_booking::chrono::{Duration, TimeZone, Utc};
use rentmate_booking::{
    BookingCalculator, CheckoutConfig, CheckoutService, DateRange, Identity,
    InMemoryBookingStore, InMemoryListingStore, Listing, MockPaymentGateway, PaymentOutcome,
    RateCard, SafeTimeProvider, TimeSource,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    ));
    let control = time.test_control().unwrap();

    let listings = Arc::new(InMemoryListingStore::new());
    listings.insert(Listing {
        id: "tent-3".to_string(),
        title: "Four-person tent".to_string(),
        category: "Outdoor".to_string(),
        location: "Manali".to_string(),
        images: vec![],
        owner_id: "owner-2".to_string(),
        rate_card: RateCard::per_day(300)?,
        rating: None,
    })?;
    let records = Arc::new(InMemoryBookingStore::new());
    let service = CheckoutService::new(
        listings,
        Arc::new(MockPaymentGateway::new()),
        records.clone(),
        BookingCalculator::standard(),
        CheckoutConfig::standard(),
    )?;
    let renter = Identity::new("user-2");

    // cancelled, then the gateway reports success anyway
    let mut session = service
        .open_session("tent-3", Some(DateRange::from_inputs("2024-02-01", "2024-02-04")), &time)
        .await?;
    service.begin_payment(&mut session, Some(&renter), &time).await?;
    session.cancel(&time)?;
    println!("user cancelled: {:?}", session.state());

    records.fail_next_writes(1);
    service
        .handle_outcome(&mut session, PaymentOutcome::succeeded("pay_late"), &time)
        .await?;
    println!(
        "gateway success arrived: {:?}, record pending: {}",
        session.state(),
        session.is_reconciliation_pending()
    );

    let report = service.retry_reconciliation().await;
    println!("retry recorded {:?}, records stored: {}", report.recorded, records.len());

    // a session left waiting past its payment window
    let mut stale = service
        .open_session("tent-3", Some(DateRange::from_inputs("2024-03-01", "2024-03-02")), &time)
        .await?;
    service.begin_payment(&mut stale, Some(&renter), &time).await?;
    control.advance(Duration::minutes(20));
    service.expire_if_overdue(&mut stale, &time);
    println!("stale session: {:?} ({:?})", stale.state(), stale.failure_reason());

    Ok(())
}
