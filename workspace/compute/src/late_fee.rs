//! Day-prorated late fees for rent paid after its due date.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, instrument};

use crate::error::ComputeError;
use crate::schedule::days_in_month;

/// Number of days a monthly late fee is spread over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProrationBase {
    /// Always 30 days, regardless of the month.
    #[default]
    FixedThirtyDays,
    /// Length of the month the due date falls in.
    CalendarMonth,
}

impl ProrationBase {
    fn days(self, due_date: NaiveDate) -> u32 {
        match self {
            ProrationBase::FixedThirtyDays => 30,
            ProrationBase::CalendarMonth => days_in_month(due_date.year(), due_date.month()),
        }
    }
}

impl FromStr for ProrationBase {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed30" | "fixed_thirty_days" => Ok(ProrationBase::FixedThirtyDays),
            "calendar_month" | "calendar" => Ok(ProrationBase::CalendarMonth),
            other => Err(ComputeError::InvalidProration(other.to_string())),
        }
    }
}

/// Whole days between the due date and the payment date; zero when paid on
/// or before the due date.
pub fn days_late(due_date: NaiveDate, payment_date: NaiveDate) -> i64 {
    (payment_date - due_date).num_days().max(0)
}

/// Day-prorated late fee, rounded to cents.
///
/// `daily_rate = base_rent * late_percentage / 100 / proration_days`, and the
/// fee is `daily_rate * days_late`.
#[instrument(level = "debug")]
pub fn late_fee(
    due_date: NaiveDate,
    payment_date: NaiveDate,
    base_rent: Decimal,
    late_percentage: Decimal,
    proration: ProrationBase,
) -> Decimal {
    if payment_date <= due_date {
        return Decimal::ZERO;
    }

    let days = days_late(due_date, payment_date);
    let monthly_fee = base_rent * late_percentage / Decimal::ONE_HUNDRED;
    let daily_rate = monthly_fee / Decimal::from(proration.days(due_date));
    let fee = (daily_rate * Decimal::from(days))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    debug!("Late fee for {} days late: {}", days, fee);
    fee
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_paid_on_due_date_is_free() {
        let fee = late_fee(
            date(2024, 1, 10),
            date(2024, 1, 10),
            Decimal::from(1000),
            Decimal::from(5),
            ProrationBase::FixedThirtyDays,
        );
        assert_eq!(fee, Decimal::ZERO);
    }

    #[test]
    fn test_paid_early_is_free() {
        let fee = late_fee(
            date(2024, 1, 10),
            date(2024, 1, 2),
            Decimal::from(1000),
            Decimal::from(5),
            ProrationBase::FixedThirtyDays,
        );
        assert_eq!(fee, Decimal::ZERO);
    }

    #[test]
    fn test_ten_days_late() {
        let fee = late_fee(
            date(2024, 1, 1),
            date(2024, 1, 11),
            Decimal::from(3000),
            Decimal::from(5),
            ProrationBase::FixedThirtyDays,
        );
        assert_eq!(fee, Decimal::new(5000, 2));
    }

    #[test]
    fn test_rounds_to_cents() {
        // 1000 * 5% / 30 = 1.6666.. per day, 7 days -> 11.67
        let fee = late_fee(
            date(2024, 3, 1),
            date(2024, 3, 8),
            Decimal::from(1000),
            Decimal::from(5),
            ProrationBase::FixedThirtyDays,
        );
        assert_eq!(fee, Decimal::new(1167, 2));
    }

    #[test]
    fn test_calendar_month_base() {
        // February 2024 has 29 days: 2900 * 10% / 29 = 10 per day
        let fee = late_fee(
            date(2024, 2, 1),
            date(2024, 2, 4),
            Decimal::from(2900),
            Decimal::from(10),
            ProrationBase::CalendarMonth,
        );
        assert_eq!(fee, Decimal::new(3000, 2));
    }

    #[test]
    fn test_parse_proration_base() {
        assert_eq!("fixed30".parse::<ProrationBase>().unwrap(), ProrationBase::FixedThirtyDays);
        assert_eq!(
            "Calendar_Month".parse::<ProrationBase>().unwrap(),
            ProrationBase::CalendarMonth
        );
        assert_eq!(
            "weekly".parse::<ProrationBase>(),
            Err(ComputeError::InvalidProration("weekly".to_string()))
        );
    }
}
