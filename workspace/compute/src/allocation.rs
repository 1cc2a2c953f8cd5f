//! Allocation of advance credit to a single rent obligation.
//!
//! Everything here is a non-authoritative estimate: the server re-validates
//! and executes the allocation atomically, and the client refetches the
//! resulting balances instead of trusting the preview.

use common::AllocationPreviewDto;
use rust_decimal::Decimal;
use tracing::{instrument, trace};

use crate::error::{ComputeError, Result};

/// Outstanding amount of an obligation: `amount - paid_amount`.
///
/// A missing `paid_amount` counts as zero. Negative results (a malformed
/// obligation with `paid_amount > amount`) are clamped to zero.
pub fn rent_due(amount: Decimal, paid_amount: Option<Decimal>) -> Decimal {
    let due = amount - paid_amount.unwrap_or(Decimal::ZERO);
    due.max(Decimal::ZERO)
}

/// Suggested amount to apply: the smaller of what is owed and what is
/// available, so one side is fully resolved by the allocation.
pub fn suggest(rent_due: Decimal, advance_available: Decimal) -> Decimal {
    rent_due.max(Decimal::ZERO).min(advance_available.max(Decimal::ZERO))
}

/// Resulting balances of applying `amount_to_apply`.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationPreview {
    pub rent_due: Decimal,
    pub advance_available: Decimal,
    pub amount_to_apply: Decimal,
    pub new_rent_due: Decimal,
    pub remaining_advance: Decimal,
    /// `amount_to_apply >= rent_due`
    pub fully_pays: bool,
    /// `amount_to_apply < rent_due`
    pub partially_pays: bool,
    /// `amount_to_apply >= advance_available`
    pub exhausts_advance: bool,
}

/// Previews an allocation without validating the amount.
///
/// Use [`validate`] before submitting; the preview is meant to be shown while
/// the user is still typing.
pub fn preview(
    rent_due: Decimal,
    advance_available: Decimal,
    amount_to_apply: Decimal,
) -> AllocationPreview {
    AllocationPreview {
        rent_due,
        advance_available,
        amount_to_apply,
        new_rent_due: rent_due - amount_to_apply,
        remaining_advance: advance_available - amount_to_apply,
        fully_pays: amount_to_apply >= rent_due,
        partially_pays: amount_to_apply < rent_due,
        exhausts_advance: amount_to_apply >= advance_available,
    }
}

/// Previews the suggested allocation.
pub fn preview_suggested(rent_due: Decimal, advance_available: Decimal) -> AllocationPreview {
    preview(rent_due, advance_available, suggest(rent_due, advance_available))
}

/// Checks `0 < amount <= min(rent_due, advance_available)`.
#[instrument(level = "trace")]
pub fn validate(rent_due: Decimal, advance_available: Decimal, amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        trace!("Rejecting non-positive allocation amount");
        return Err(ComputeError::NonPositiveAmount);
    }
    if amount > rent_due {
        return Err(ComputeError::ExceedsRentDue { amount, rent_due });
    }
    if amount > advance_available {
        return Err(ComputeError::ExceedsAdvance {
            amount,
            available: advance_available,
        });
    }
    Ok(amount)
}

impl AllocationPreview {
    /// Converts into the transport type, attaching the suggested amount.
    pub fn into_dto(self) -> AllocationPreviewDto {
        let suggested_amount = suggest(self.rent_due, self.advance_available);
        AllocationPreviewDto {
            rent_due: self.rent_due,
            advance_available: self.advance_available,
            suggested_amount,
            amount_to_apply: self.amount_to_apply,
            new_rent_due: self.new_rent_due,
            remaining_advance: self.remaining_advance,
            fully_pays: self.fully_pays,
            partially_pays: self.partially_pays,
            exhausts_advance: self.exhausts_advance,
        }
    }
}
