//! FIFO consumption of advance credit against an amount due.

use chrono::NaiveDate;
use common::AdvanceSliceDto;
use rust_decimal::Decimal;
use tracing::{debug, instrument, trace};

/// The part of an advance ledger entry that matters for consumption.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceCredit {
    pub id: i32,
    pub payment_date: NaiveDate,
    pub remaining: Decimal,
}

/// Amount taken from one advance.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceSlice {
    pub advance_id: i32,
    pub amount: Decimal,
    /// Balance of the advance after the slice is taken
    pub remaining_after: Decimal,
}

impl From<&AdvanceSlice> for AdvanceSliceDto {
    fn from(slice: &AdvanceSlice) -> Self {
        Self {
            advance_payment_id: slice.advance_id,
            amount: slice.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConsumptionPlan {
    pub slices: Vec<AdvanceSlice>,
    pub total_applied: Decimal,
    /// What is still owed after all credit is used
    pub outstanding: Decimal,
}

/// Plans how available advances cover `amount_due`, oldest first.
///
/// Advances are ordered by `(payment_date, id)`; entries without balance are
/// skipped. Each advance contributes `min(remaining, still_due)`.
#[instrument(skip(advances), fields(num_advances = advances.len()))]
pub fn plan(advances: &[AdvanceCredit], amount_due: Decimal) -> ConsumptionPlan {
    let mut ordered: Vec<&AdvanceCredit> = advances
        .iter()
        .filter(|advance| advance.remaining > Decimal::ZERO)
        .collect();
    ordered.sort_by_key(|advance| (advance.payment_date, advance.id));

    let mut still_due = amount_due.max(Decimal::ZERO);
    let mut slices = Vec::new();

    for advance in ordered {
        if still_due <= Decimal::ZERO {
            break;
        }
        let take = advance.remaining.min(still_due);
        trace!("Taking {} from advance {} (remaining {})", take, advance.id, advance.remaining);
        still_due -= take;
        slices.push(AdvanceSlice {
            advance_id: advance.id,
            amount: take,
            remaining_after: advance.remaining - take,
        });
    }

    let total_applied = slices.iter().map(|slice| slice.amount).sum();
    debug!(
        "Consumption plan covers {} of {} using {} advances",
        total_applied,
        amount_due,
        slices.len()
    );

    ConsumptionPlan {
        slices,
        total_applied,
        outstanding: still_due,
    }
}

/// Total credit left across advances.
pub fn available(advances: &[AdvanceCredit]) -> Decimal {
    advances
        .iter()
        .map(|advance| advance.remaining.max(Decimal::ZERO))
        .sum()
}
