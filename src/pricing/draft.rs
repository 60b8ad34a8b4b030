use chrono::NaiveTime;

use crate::errors::Result;
use crate::pricing::{parse_date, BookingCalculator, DateRange, Quote, QuoteResult, RateCard, TimeWindow};

/// booking form state with a quote that always matches its inputs
///
/// Every setter recomputes the quote before returning, so a reader never
/// sees a quote priced from older dates or an older rate.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    calculator: BookingCalculator,
    rate_card: RateCard,
    range: DateRange,
    times: TimeWindow,
    quote: QuoteResult,
}

impl BookingDraft {
    pub fn new(calculator: BookingCalculator, rate_card: RateCard, times: TimeWindow) -> Self {
        let mut draft = Self {
            calculator,
            rate_card,
            range: DateRange::default(),
            times,
            quote: QuoteResult::Incomplete,
        };
        draft.recompute();
        draft
    }

    /// start from dates carried over from another screen
    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self.recompute();
        self
    }

    pub fn set_start_date(&mut self, input: &str) -> &QuoteResult {
        self.range.start_date = parse_date(input);
        self.recompute()
    }

    pub fn set_end_date(&mut self, input: &str) -> &QuoteResult {
        self.range.end_date = parse_date(input);
        self.recompute()
    }

    pub fn set_range(&mut self, range: DateRange) -> &QuoteResult {
        self.range = range;
        self.recompute()
    }

    pub fn set_rate_card(&mut self, rate_card: RateCard) -> &QuoteResult {
        self.rate_card = rate_card;
        self.recompute()
    }

    pub fn set_start_time(&mut self, input: &str) -> Result<()> {
        self.times.start_time = TimeWindow::parse_time(input)?;
        Ok(())
    }

    pub fn set_end_time(&mut self, input: &str) -> Result<()> {
        self.times.end_time = TimeWindow::parse_time(input)?;
        Ok(())
    }

    pub fn set_times(&mut self, start_time: NaiveTime, end_time: NaiveTime) {
        self.times = TimeWindow::new(start_time, end_time);
    }

    pub fn quote(&self) -> &QuoteResult {
        &self.quote
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn times(&self) -> TimeWindow {
        self.times
    }

    pub fn rate_card(&self) -> RateCard {
        self.rate_card
    }

    pub fn calculator(&self) -> &BookingCalculator {
        &self.calculator
    }

    /// whether the confirm action should be offered
    pub fn can_confirm(&self) -> bool {
        self.quote.is_quoted()
    }

    /// quote freshly computed from the current inputs
    pub fn fresh_quote(&self) -> Result<Quote> {
        self.calculator.quote(&self.range, &self.rate_card).into_quote()
    }

    fn recompute(&mut self) -> &QuoteResult {
        self.quote = self.calculator.quote(&self.range, &self.rate_card);
        &self.quote
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;

    fn draft(price: i64) -> BookingDraft {
        BookingDraft::new(
            BookingCalculator::standard(),
            RateCard::per_day(price).unwrap(),
            TimeWindow::new(
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            ),
        )
    }

    #[test]
    fn test_new_draft_is_incomplete() {
        let d = draft(100);
        assert_eq!(d.quote(), &QuoteResult::Incomplete);
        assert!(!d.can_confirm());
    }

    #[test]
    fn test_quote_follows_every_date_change() {
        let mut d = draft(200);
        assert_eq!(d.set_start_date("2024-01-01"), &QuoteResult::Incomplete);

        let total = d.set_end_date("2024-01-05").as_quote().unwrap().total;
        assert_eq!(total, Money::from_major(940));

        let days = d.set_end_date("2024-01-03").as_quote().unwrap().days;
        assert_eq!(days, 2);

        // clearing a field withdraws the quote immediately
        assert_eq!(d.set_start_date(""), &QuoteResult::Incomplete);
        assert!(!d.can_confirm());
    }

    #[test]
    fn test_quote_follows_rate_change() {
        let mut d = draft(100);
        d.set_range(DateRange::from_inputs("2024-01-01", "2024-01-01"));
        assert_eq!(d.quote().as_quote().unwrap().total, Money::from_major(155));

        let q = d.set_rate_card(RateCard::per_day(200).unwrap()).as_quote().unwrap().clone();
        assert_eq!(q.total, Money::from_major(310));
        assert_eq!(d.fresh_quote().unwrap(), q);
    }

    #[test]
    fn test_times_do_not_affect_price() {
        let mut d = draft(100).with_range(DateRange::from_inputs("2024-01-01", "2024-01-02"));
        let before = d.quote().clone();

        d.set_start_time("07:15").unwrap();
        d.set_end_time("23:45").unwrap();

        assert_eq!(d.quote(), &before);
        assert_eq!(d.times().start_time, NaiveTime::from_hms_opt(7, 15, 0).unwrap());
        assert!(d.set_end_time("late").is_err());
    }
}
