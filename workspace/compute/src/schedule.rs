//! Monthly due-date arithmetic.

use chrono::{Datelike, NaiveDate};

/// Returns the number of days in the given month using chrono.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month_year = year + (month / 12) as i32;
    let next_month = (month % 12) + 1;

    NaiveDate::from_ymd_opt(next_month_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last_of_current| last_of_current.day())
        .unwrap_or(30)
}

/// Due date of the following month's rent, keeping the day of month when
/// possible and clamping to the month's last day otherwise.
pub fn next_due_date(due_date: NaiveDate) -> NaiveDate {
    let year = due_date.year() + (due_date.month() / 12) as i32;
    let month = (due_date.month() % 12) + 1;
    let day = std::cmp::min(due_date.day(), days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(due_date)
}
