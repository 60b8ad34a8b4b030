use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::decimal::Rate;
use crate::errors::{BookingError, Result};
use crate::pricing::{DayCountPolicy, RangePolicy};

/// currency the quote is priced in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// iso 4217 code handed to the payment gateway
    pub code: String,
    /// digits of the minor unit (2 for paise/cents)
    pub minor_unit_scale: u32,
}

impl Currency {
    pub fn inr() -> Self {
        Self {
            code: "INR".to_string(),
            minor_unit_scale: 2,
        }
    }
}

/// fee schedule and day counting used by the booking calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub service_fee_rate: Rate,
    pub security_deposit_rate: Rate,
    pub currency: Currency,
    pub minimum_days: u32,
    pub day_count: DayCountPolicy,
    pub range_policy: RangePolicy,
}

impl PricingConfig {
    /// 5% service fee on the subtotal, deposit of half a day's rate
    pub fn standard() -> Self {
        Self {
            service_fee_rate: Rate::from_percentage(5),
            security_deposit_rate: Rate::from_percentage(50),
            currency: Currency::inr(),
            minimum_days: 1,
            day_count: DayCountPolicy::Elapsed,
            range_policy: RangePolicy::Undirected,
        }
    }

    /// rental estimate shown on a listing page: both ends of the range count, no fees
    pub fn listing_preview() -> Self {
        Self {
            service_fee_rate: Rate::ZERO,
            security_deposit_rate: Rate::ZERO,
            day_count: DayCountPolicy::Inclusive,
            ..Self::standard()
        }
    }

    /// standard fees, inverted ranges rejected instead of measured undirected
    pub fn strict() -> Self {
        Self {
            range_policy: RangePolicy::RejectInverted,
            ..Self::standard()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.service_fee_rate.is_negative() {
            return Err(BookingError::InvalidConfiguration {
                message: format!("service fee rate {} is negative", self.service_fee_rate),
            });
        }
        if self.security_deposit_rate.is_negative() {
            return Err(BookingError::InvalidConfiguration {
                message: format!("security deposit rate {} is negative", self.security_deposit_rate),
            });
        }
        if self.minimum_days == 0 {
            return Err(BookingError::InvalidConfiguration {
                message: "minimum days must be at least 1".to_string(),
            });
        }
        if self.currency.code.trim().is_empty() {
            return Err(BookingError::InvalidConfiguration {
                message: "currency code is empty".to_string(),
            });
        }
        Ok(())
    }

    /// load and validate from json
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// checkout flow settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// how long a session may wait for the payment gateway
    pub payment_timeout_secs: i64,
    pub default_start_time: NaiveTime,
    pub default_end_time: NaiveTime,
    /// merchant name shown on the payment sheet
    pub merchant_name: String,
    /// failed booking record writes are retried this many times before giving up
    pub max_reconciliation_attempts: u32,
}

impl CheckoutConfig {
    pub fn standard() -> Self {
        Self {
            payment_timeout_secs: 15 * 60,
            default_start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            default_end_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
            merchant_name: "RentMate".to_string(),
            max_reconciliation_attempts: 5,
        }
    }

    pub fn payment_timeout(&self) -> Duration {
        Duration::seconds(self.payment_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.payment_timeout_secs <= 0 {
            return Err(BookingError::InvalidConfiguration {
                message: format!("payment timeout must be positive, got {}s", self.payment_timeout_secs),
            });
        }
        if self.max_reconciliation_attempts == 0 {
            return Err(BookingError::InvalidConfiguration {
                message: "max reconciliation attempts must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self::standard()
    }
}
