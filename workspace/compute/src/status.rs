//! Ledger statuses derived from balances and due dates. Only cancellation is
//! set explicitly; every other status follows from the amounts.

use chrono::NaiveDate;
use common::{AdvanceStatus, RentStatus};
use rust_decimal::Decimal;

/// Status of an advance from its balance.
pub fn advance_status(amount: Decimal, remaining: Decimal) -> AdvanceStatus {
    if remaining <= Decimal::ZERO {
        AdvanceStatus::FullyUsed
    } else if remaining >= amount {
        AdvanceStatus::Paid
    } else {
        AdvanceStatus::PartiallyUsed
    }
}

/// Status of a rent obligation. Cancellation is sticky.
pub fn rent_status(
    amount: Decimal,
    paid_amount: Decimal,
    due_date: NaiveDate,
    today: NaiveDate,
    cancelled: bool,
) -> RentStatus {
    if cancelled {
        RentStatus::Cancelled
    } else if paid_amount >= amount {
        RentStatus::Paid
    } else if paid_amount > Decimal::ZERO {
        RentStatus::Partial
    } else if due_date < today {
        RentStatus::Overdue
    } else {
        RentStatus::Pending
    }
}
