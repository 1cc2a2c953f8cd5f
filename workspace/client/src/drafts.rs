//! Form state for the three flows that move money.
//!
//! A draft owns the raw user input, shows a live estimate through `compute`,
//! and turns into a request only when the input is acceptable. A rejected or
//! failed submission leaves the draft as it was so the user can fix and
//! resubmit.

use std::str::FromStr;

use chrono::NaiveDate;
use common::{
    AdvancePaymentDto, AmenityInput, ApplyAdvanceRequest, AssignRenterRequest, FlatDto,
    NewAdvancePayment, RecordPaymentRequest, RentPaymentDto,
};
use compute::{
    allocation::{self, AllocationPreview},
    amenities::{self, AmenityFilter},
    consumption::{self, AdvanceCredit, ConsumptionPlan},
    late_fee::{late_fee, ProrationBase},
    ComputeError,
};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{ClientError, Result};

fn parse_amount(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw).ok()
}

fn validation(message: impl Into<String>) -> ClientError {
    ClientError::Validation(message.into())
}

/// Applying one advance to one rent obligation.
#[derive(Debug, Clone, Default)]
pub struct ApplyAdvanceDraft {
    rent_payment: Option<RentPaymentDto>,
    advance_payment: Option<AdvancePaymentDto>,
    /// Raw amount as typed; prefilled with the suggestion on selection
    pub amount: String,
}

impl ApplyAdvanceDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_rent_payment(&mut self, rent_payment: RentPaymentDto) {
        self.rent_payment = Some(rent_payment);
        self.prefill();
    }

    pub fn select_advance_payment(&mut self, advance_payment: AdvancePaymentDto) {
        self.advance_payment = Some(advance_payment);
        self.prefill();
    }

    fn prefill(&mut self) {
        if let Some(suggested) = self.suggested_amount() {
            self.amount = suggested.normalize().to_string();
        }
    }

    pub fn rent_due(&self) -> Option<Decimal> {
        self.rent_payment
            .as_ref()
            .map(|rent| allocation::rent_due(rent.amount, Some(rent.paid_amount)))
    }

    pub fn advance_available(&self) -> Option<Decimal> {
        self.advance_payment
            .as_ref()
            .map(|advance| advance.remaining_amount)
    }

    pub fn suggested_amount(&self) -> Option<Decimal> {
        Some(allocation::suggest(self.rent_due()?, self.advance_available()?))
    }

    /// Live estimate for the typed amount; `None` until both sides are chosen
    /// and the amount parses.
    pub fn preview(&self) -> Option<AllocationPreview> {
        let amount = parse_amount(&self.amount)?;
        Some(allocation::preview(self.rent_due()?, self.advance_available()?, amount))
    }

    pub fn to_request(&self) -> Result<ApplyAdvanceRequest> {
        let rent_payment = self
            .rent_payment
            .as_ref()
            .ok_or_else(|| validation("Please select a rent payment"))?;
        let advance_payment = self
            .advance_payment
            .as_ref()
            .ok_or_else(|| validation("Please select an advance payment"))?;
        let amount =
            parse_amount(&self.amount).ok_or_else(|| validation("Please enter a valid amount"))?;

        let rent_due = allocation::rent_due(rent_payment.amount, Some(rent_payment.paid_amount));
        let amount = allocation::validate(rent_due, advance_payment.remaining_amount, amount)
            .map_err(|err| match err {
                ComputeError::NonPositiveAmount => {
                    validation("Amount to apply must be greater than zero")
                }
                _ => validation(format!(
                    "Amount must not exceed {}",
                    allocation::suggest(rent_due, advance_payment.remaining_amount)
                )),
            })?;

        Ok(ApplyAdvanceRequest {
            advance_payment_id: advance_payment.id,
            rent_payment_id: rent_payment.id,
            amount,
        })
    }
}

/// Recording a rent payment for a flat.
#[derive(Debug, Clone)]
pub struct PaymentDraft {
    flat: FlatDto,
    advances: Vec<AdvancePaymentDto>,
    proration: ProrationBase,
    /// Existing obligation being settled, if any
    existing: Option<RentPaymentDto>,
    pub due_date: NaiveDate,
    pub payment_date: NaiveDate,
    pub amenities: Vec<AmenityInput>,
    pub amount_paid: String,
    pub use_advance_payment: bool,
    pub schedule_next_payment: bool,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

impl PaymentDraft {
    /// Starts from the flat's own amenities and an on-time payment.
    pub fn new(flat: FlatDto, advances: Vec<AdvancePaymentDto>, due_date: NaiveDate) -> Self {
        let amenities = flat
            .amenities
            .iter()
            .map(|amenity| AmenityInput::new(amenity.name.clone(), amenity.charge.to_string()))
            .collect();

        Self {
            flat,
            advances,
            proration: ProrationBase::default(),
            existing: None,
            due_date,
            payment_date: due_date,
            amenities,
            amount_paid: String::new(),
            use_advance_payment: false,
            schedule_next_payment: true,
            payment_method: None,
            notes: None,
        }
    }

    pub fn with_proration(mut self, proration: ProrationBase) -> Self {
        self.proration = proration;
        self
    }

    /// Settles an obligation already on the ledger instead of raising a new
    /// one. Its stored breakdown replaces the flat's rent and amenities.
    pub fn settle(mut self, rent_payment: RentPaymentDto) -> Self {
        self.due_date = rent_payment.due_date;
        self.payment_date = rent_payment.due_date;
        self.amenities.clear();
        self.existing = Some(rent_payment);
        self
    }

    pub fn rent_payment_id(&self) -> Option<i32> {
        self.existing.as_ref().map(|rent_payment| rent_payment.id)
    }

    pub fn amenities_total(&self) -> Decimal {
        amenities::total(&self.amenities, AmenityFilter::NamedOnly)
    }

    /// Late fee this payment adds. An obligation that already carries one
    /// gets no second fee.
    pub fn late_fee(&self) -> Decimal {
        let base_rent = match &self.existing {
            Some(rent_payment) if !rent_payment.late_fee.is_zero() => return Decimal::ZERO,
            Some(rent_payment) => rent_payment.base_rent,
            None => self.flat.base_rent,
        };
        late_fee(
            self.due_date,
            self.payment_date,
            base_rent,
            self.flat.late_fee_percentage,
            self.proration,
        )
    }

    /// Base rent, amenities and late fee, or what is still owed on the
    /// obligation being settled.
    pub fn total_due(&self) -> Decimal {
        match &self.existing {
            Some(rent_payment) => {
                allocation::rent_due(rent_payment.amount, Some(rent_payment.paid_amount))
                    + self.late_fee()
            }
            None => self.flat.base_rent + self.amenities_total() + self.late_fee(),
        }
    }

    /// Advance credit the server would consume, oldest first.
    pub fn advance_plan(&self) -> ConsumptionPlan {
        if !self.use_advance_payment {
            return ConsumptionPlan {
                outstanding: self.total_due(),
                ..ConsumptionPlan::default()
            };
        }
        let credits: Vec<AdvanceCredit> = self
            .advances
            .iter()
            .map(|advance| AdvanceCredit {
                id: advance.id,
                payment_date: advance.payment_date,
                remaining: advance.remaining_amount,
            })
            .collect();
        consumption::plan(&credits, self.total_due())
    }

    /// What is left for cash after advance credit.
    pub fn cash_due(&self) -> Decimal {
        self.advance_plan().outstanding
    }

    pub fn to_request(&self) -> Result<RecordPaymentRequest> {
        if self.flat.renter_id.is_none() {
            return Err(validation("Assign a renter before recording payments"));
        }
        let amount_paid = if self.amount_paid.trim().is_empty() {
            Decimal::ZERO
        } else {
            parse_amount(&self.amount_paid)
                .ok_or_else(|| validation("Please enter a valid amount"))?
        };
        if amount_paid < Decimal::ZERO {
            return Err(validation("Amount paid cannot be negative"));
        }
        let cash_due = self.cash_due();
        if amount_paid > cash_due {
            return Err(validation(format!(
                "Amount paid cannot exceed the amount due of {}",
                cash_due
            )));
        }
        debug!(
            "Payment draft for flat {}: {} cash against {} due",
            self.flat.id, amount_paid, cash_due
        );

        Ok(RecordPaymentRequest {
            rent_payment_id: self.rent_payment_id(),
            due_date: self.due_date,
            payment_date: self.payment_date,
            amount_paid,
            amenities: self.amenities.clone(),
            late_fee_percentage: None,
            use_advance_payment: self.use_advance_payment,
            schedule_next_payment: self.schedule_next_payment,
            payment_method: self.payment_method.clone(),
            transaction_id: None,
            notes: self.notes.clone(),
        })
    }
}

/// One advance deposit entered during assignment.
#[derive(Debug, Clone)]
pub struct AdvanceDraft {
    pub amount: String,
    pub payment_date: NaiveDate,
    pub payment_method: Option<String>,
}

/// Moving a renter into a flat.
#[derive(Debug, Clone)]
pub struct AssignmentDraft {
    flat: FlatDto,
    pub renter_id: Option<i32>,
    pub rent_start_date: Option<NaiveDate>,
    pub advances: Vec<AdvanceDraft>,
}

impl AssignmentDraft {
    pub fn new(flat: FlatDto) -> Self {
        Self {
            flat,
            renter_id: None,
            rent_start_date: None,
            advances: Vec::new(),
        }
    }

    /// Monthly rent the renter takes on.
    pub fn monthly_rent(&self) -> Decimal {
        let charges: Vec<AmenityInput> = self
            .flat
            .amenities
            .iter()
            .map(|amenity| AmenityInput::new(amenity.name.clone(), amenity.charge.to_string()))
            .collect();
        amenities::total_rent(self.flat.base_rent, &charges, AmenityFilter::NamedOnly)
    }

    /// Sum of the advances that parse.
    pub fn advance_total(&self) -> Decimal {
        self.advances
            .iter()
            .map(|advance| amenities::parse_charge(Some(advance.amount.as_str())))
            .sum()
    }

    pub fn to_request(&self) -> Result<AssignRenterRequest> {
        if self.flat.renter_id.is_some() {
            return Err(validation("Flat is already occupied"));
        }
        let renter_id = self
            .renter_id
            .ok_or_else(|| validation("Please select a renter"))?;
        let rent_start_date = self
            .rent_start_date
            .ok_or_else(|| validation("Please choose a rent start date"))?;

        let advance_payments = self
            .advances
            .iter()
            .map(|advance| {
                let amount = parse_amount(&advance.amount)
                    .filter(|amount| *amount > Decimal::ZERO)
                    .ok_or_else(|| validation("Advance amounts must be greater than zero"))?;
                Ok(NewAdvancePayment {
                    amount,
                    paid_amount: None,
                    payment_date: advance.payment_date,
                    payment_method: advance.payment_method.clone(),
                    transaction_id: None,
                    notes: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(AssignRenterRequest {
            renter_id,
            rent_start_date,
            advance_payments,
        })
    }
}
