/// quick quote - price a date range with the standard fee schedule
use rentmate_booking::{quote, DateRange, RateCard};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let rate_card = RateCard::per_day(200)?;

    for (start, end) in [
        ("2024-01-01", "2024-01-01"),
        ("2024-01-01", "2024-01-05"),
        ("2024-01-05", "2024-01-01"),
        ("", "2024-01-05"),
    ] {
        let range = DateRange::from_inputs(start, end);
        match quote(&range, &rate_card).as_quote() {
            Some(q) => println!(
                "{:>10} -> {:<10} {} days: subtotal {} + fee {} + deposit {} = {} {}",
                start, end, q.days, q.subtotal, q.service_fee, q.security_deposit, q.total, q.currency
            ),
            None => println!("{:>10} -> {:<10} incomplete, confirm withheld", start, end),
        }
    }

    Ok(())
}
