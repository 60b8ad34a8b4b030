pub mod day_count;
pub mod draft;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::PricingConfig;
use crate::decimal::Money;
use crate::errors::{BookingError, Result};

pub use day_count::{parse_date, DayCountPolicy, RangePolicy};
pub use draft::BookingDraft;

/// candidate booking dates, either of which may still be missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date),
        }
    }

    /// build from raw form fields; blank or malformed fields stay empty
    pub fn from_inputs(start: &str, end: &str) -> Self {
        Self {
            start_date: parse_date(start),
            end_date: parse_date(end),
        }
    }

    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start_date?, self.end_date?))
    }

    pub fn is_complete(&self) -> bool {
        self.bounds().is_some()
    }
}

/// pickup and return clock times; shown on the booking, never priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl TimeWindow {
    pub fn new(start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self { start_time, end_time }
    }

    /// parse an `HH:MM` (or `HH:MM:SS`) field
    pub fn parse_time(input: &str) -> Result<NaiveTime> {
        let trimmed = input.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .map_err(|_| BookingError::InvalidDate {
                message: format!("unrecognised time of day: {:?}", input),
            })
    }
}

/// per-day price of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRateCard")]
pub struct RateCard {
    price_per_day: Money,
}

#[derive(Deserialize)]
struct RawRateCard {
    price_per_day: Money,
}

impl TryFrom<RawRateCard> for RateCard {
    type Error = BookingError;

    fn try_from(raw: RawRateCard) -> Result<Self> {
        RateCard::new(raw.price_per_day)
    }
}

impl RateCard {
    pub fn new(price_per_day: Money) -> Result<Self> {
        if price_per_day.is_negative() {
            return Err(BookingError::InvalidRateCard { price: price_per_day });
        }
        Ok(Self { price_per_day })
    }

    pub fn per_day(amount: i64) -> Result<Self> {
        Self::new(Money::from_major(amount))
    }

    pub fn price_per_day(&self) -> Money {
        self.price_per_day
    }
}

/// priced breakdown of a booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub days: u32,
    pub price_per_day: Money,
    pub subtotal: Money,
    pub service_fee: Money,
    pub security_deposit: Money,
    pub total: Money,
    pub currency: String,
    pub day_count: DayCountPolicy,
}

impl Quote {
    /// total expressed in the currency's minor unit, as payment gateways expect
    pub fn total_in_minor_units(&self, scale: u32) -> Result<i64> {
        self.total
            .to_minor_units(scale)
            .ok_or_else(|| BookingError::CalculationError {
                message: format!("total {} does not fit in minor units", self.total),
            })
    }
}

/// why a complete range could not be quoted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteRejection {
    InvertedRange { start: NaiveDate, end: NaiveDate },
    /// the amounts exceed what a decimal can hold
    AmountOverflow { days: u32, price_per_day: Money },
}

impl fmt::Display for QuoteRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteRejection::InvertedRange { start, end } => {
                write!(f, "end date {} is before start date {}", end, start)
            }
            QuoteRejection::AmountOverflow { days, price_per_day } => {
                write!(f, "{} days at {} per day is too large to price", days, price_per_day)
            }
        }
    }
}

/// calculator verdict for a candidate range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteResult {
    Quoted(Quote),
    /// a date is missing or unreadable; the confirm action stays withheld
    Incomplete,
    Rejected(QuoteRejection),
}

impl QuoteResult {
    pub fn as_quote(&self) -> Option<&Quote> {
        match self {
            QuoteResult::Quoted(quote) => Some(quote),
            _ => None,
        }
    }

    pub fn is_quoted(&self) -> bool {
        self.as_quote().is_some()
    }

    pub fn into_quote(self) -> Result<Quote> {
        match self {
            QuoteResult::Quoted(quote) => Ok(quote),
            QuoteResult::Incomplete => Err(BookingError::IncompleteQuote),
            QuoteResult::Rejected(reason) => Err(BookingError::QuoteRejected {
                reason: reason.to_string(),
            }),
        }
    }
}

/// turns a date range and a rate card into a quote
#[derive(Debug, Clone)]
pub struct BookingCalculator {
    config: PricingConfig,
}

impl BookingCalculator {
    pub fn new(config: PricingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn standard() -> Self {
        Self {
            config: PricingConfig::standard(),
        }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// quote a range; pure, cheap enough to run on every keystroke
    pub fn quote(&self, range: &DateRange, rate_card: &RateCard) -> QuoteResult {
        let Some((start, end)) = range.bounds() else {
            return QuoteResult::Incomplete;
        };

        if end < start && self.config.range_policy == RangePolicy::RejectInverted {
            return QuoteResult::Rejected(QuoteRejection::InvertedRange { start, end });
        }

        let days = self
            .config
            .day_count
            .count_days(start, end, self.config.minimum_days);

        match self.price(days, rate_card) {
            Ok(quote) => QuoteResult::Quoted(quote),
            Err(rejection) => QuoteResult::Rejected(rejection),
        }
    }

    /// price a known number of days
    pub fn price(&self, days: u32, rate_card: &RateCard) -> std::result::Result<Quote, QuoteRejection> {
        let price_per_day = rate_card.price_per_day();
        let overflow = QuoteRejection::AmountOverflow { days, price_per_day };

        let subtotal = price_per_day.checked_times(days).ok_or(overflow)?;
        let service_fee = subtotal
            .checked_portion(self.config.service_fee_rate)
            .ok_or(overflow)?
            .round_to_unit();
        let security_deposit = price_per_day
            .checked_portion(self.config.security_deposit_rate)
            .ok_or(overflow)?
            .round_to_unit();
        let total = subtotal
            .checked_add(service_fee)
            .and_then(|sum| sum.checked_add(security_deposit))
            .ok_or(overflow)?;

        Ok(Quote {
            days,
            price_per_day,
            subtotal,
            service_fee,
            security_deposit,
            total,
            currency: self.config.currency.code.clone(),
            day_count: self.config.day_count,
        })
    }
}

impl Default for BookingCalculator {
    fn default() -> Self {
        Self::standard()
    }
}

/// quote with the standard fee schedule
pub fn quote(range: &DateRange, rate_card: &RateCard) -> QuoteResult {
    BookingCalculator::standard().quote(range, rate_card)
}
