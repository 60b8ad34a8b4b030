/// checkout flow - quote, pay, confirm and record a booking
use std::sync::Arc;

use rentmate_booking::chrono::{TimeZone, Utc};
use rentmate_booking::{
    BookingCalculator, CheckoutConfig, CheckoutService, CheckoutView, Identity,
    IdentityWatch, InMemoryBookingStore, InMemoryListingStore, Listing, MockPaymentGateway,
    PaymentOutcome, RateCard, SafeTimeProvider, TimeSource,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    ));

    let listings = Arc::new(InMemoryListingStore::new());
    listings.insert(Listing {
        id: "cam-1".to_string(),
        title: "Mirrorless camera".to_string(),
        category: "Electronics".to_string(),
        location: "Pune".to_string(),
        images: vec!["https://img.example/cam-1.jpg".to_string()],
        owner_id: "owner-1".to_string(),
        rate_card: RateCard::per_day(200)?,
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

    let identity = IdentityWatch::new();
    let mut session = service.open_session("cam-1", None, &time).await?;
    session.set_start_date("2024-01-01")?;
    session.set_end_date("2024-01-05")?;

    // not signed in yet: refused, still quoting
    if let Err(e) = service.begin_payment(&mut session, identity.current().as_ref(), &time).await {
        println!("confirm refused: {}", e);
    }

    identity.sign_in(Identity::new("user-1").with_display_name("Asha"));
    let state = service.begin_payment(&mut session, identity.current().as_ref(), &time).await?;
    println!("after confirm: {:?}", state);

    let state = service
        .handle_outcome(&mut session, PaymentOutcome::succeeded("pay_123"), &time)
        .await?;
    println!("after gateway callback: {:?}", state);
    println!("{}", CheckoutView::from_session(&session).to_json_pretty()?);
    println!("records stored: {}", records.len());

    Ok(())
}
