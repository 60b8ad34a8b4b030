/// booking draft - the quote follows every edit of the booking form
use rentmate_booking::{
    BookingCalculator, BookingDraft, PricingConfig, RateCard, TimeWindow,
};
use rentmate_booking::chrono::NaiveTime;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let times = TimeWindow::new(
        NaiveTime::from_hms_opt(9, 0, 0).ok_or("bad time")?,
        NaiveTime::from_hms_opt(18, 0, 0).ok_or("bad time")?,
    );
    let mut draft = BookingDraft::new(BookingCalculator::standard(), RateCard::per_day(450)?, times);

    println!("start date typed:  {:?}", draft.set_start_date("2024-03-10"));
    println!("end date typed:    {:?}", draft.set_end_date("2024-03-13").as_quote().map(|q| q.total));
    println!("rate changed:      {:?}", draft.set_rate_card(RateCard::per_day(500)?).as_quote().map(|q| q.total));
    println!("start cleared:     {:?}", draft.set_start_date(""));

    // the listing page shows a fee-free estimate counting both ends
    let preview = BookingCalculator::new(PricingConfig::listing_preview())?;
    let mut estimate = BookingDraft::new(preview, RateCard::per_day(500)?, times);
    estimate.set_start_date("2024-03-10");
    estimate.set_end_date("2024-03-13");
    println!("listing estimate:  {:?}", estimate.quote().as_quote().map(|q| (q.days, q.total)));

    Ok(())
}
