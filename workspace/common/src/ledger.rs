use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::property::AmenityInput;

fn positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("positive_amount")
            .with_message(Cow::Borrowed("Amount must be greater than zero")));
    }
    Ok(())
}

fn non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("non_negative_amount")
            .with_message(Cow::Borrowed("Amount cannot be negative")));
    }
    Ok(())
}

/// Status of an advance-payment ledger entry. Always derived from the
/// remaining balance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceStatus {
    Paid,
    PartiallyUsed,
    FullyUsed,
}

/// Status of a rent obligation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RentStatus {
    Pending,
    Paid,
    Overdue,
    Partial,
    Cancelled,
}

/// A new advance deposit, either standalone or seeded during assignment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct NewAdvancePayment {
    /// Amount paid ahead of rent
    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,
    /// Amount actually received, when it differs from `amount`
    #[validate(custom(function = "non_negative_amount"))]
    pub paid_amount: Option<Decimal>,
    pub payment_date: NaiveDate,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}

/// Advance-payment ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AdvancePaymentDto {
    pub id: i32,
    pub flat_id: i32,
    pub renter_id: i32,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    /// Unconsumed balance
    pub remaining_amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
    pub status: AdvanceStatus,
}

/// Rent obligation with its breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RentPaymentDto {
    pub id: i32,
    pub flat_id: i32,
    pub renter_id: Option<i32>,
    pub due_date: NaiveDate,
    pub base_rent: Decimal,
    pub amenities_total: Decimal,
    pub late_fee: Decimal,
    /// Total due: base rent + amenities + late fee
    pub amount: Decimal,
    pub paid_amount: Decimal,
    /// `amount - paid_amount`, never negative
    pub amount_due: Decimal,
    pub status: RentStatus,
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}

/// Request body for recording a rent payment.
///
/// Without `rent_payment_id` a new obligation is created from the flat's base
/// rent, the given amenities (or the flat's own when none are given) and the
/// late fee; with it, the existing obligation is settled.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct RecordPaymentRequest {
    pub rent_payment_id: Option<i32>,
    pub due_date: NaiveDate,
    pub payment_date: NaiveDate,
    /// Cash received on top of any advance credit
    #[validate(custom(function = "non_negative_amount"))]
    pub amount_paid: Decimal,
    #[serde(default)]
    pub amenities: Vec<AmenityInput>,
    /// Overrides the flat's late fee percentage
    #[validate(custom(function = "non_negative_amount"))]
    pub late_fee_percentage: Option<Decimal>,
    /// Consume available advance credit, oldest first
    #[serde(default)]
    pub use_advance_payment: bool,
    /// Create the next month's pending obligation
    #[serde(default)]
    pub schedule_next_payment: bool,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}

/// Portion of one advance consumed by a payment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AdvanceSliceDto {
    pub advance_payment_id: i32,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RecordPaymentResponse {
    pub payment: RentPaymentDto,
    pub advance_applied: Vec<AdvanceSliceDto>,
    pub next_payment: Option<RentPaymentDto>,
}

/// Request body for applying advance credit to one obligation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct ApplyAdvanceRequest {
    pub advance_payment_id: i32,
    pub rent_payment_id: i32,
    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,
}

/// Balances after an allocation, as committed by the server.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ApplyAdvanceResponse {
    pub rent_payment: RentPaymentDto,
    pub advance_payment: AdvancePaymentDto,
}

/// Request body for a non-mutating allocation preview. Without `amount` the
/// suggested amount is previewed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AllocationPreviewRequest {
    pub advance_payment_id: i32,
    pub rent_payment_id: i32,
    pub amount: Option<Decimal>,
}

/// Preview of an allocation. The three flags are independent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AllocationPreviewDto {
    pub rent_due: Decimal,
    pub advance_available: Decimal,
    pub suggested_amount: Decimal,
    pub amount_to_apply: Decimal,
    pub new_rent_due: Decimal,
    pub remaining_advance: Decimal,
    pub fully_pays: bool,
    pub partially_pays: bool,
    pub exhausts_advance: bool,
}
