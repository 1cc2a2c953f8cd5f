use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::ledger::NewAdvancePayment;

// ===================== Houses =====================

/// Request body for creating a house.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct CreateHouseRequest {
    #[validate(length(min = 1, message = "House name cannot be empty"))]
    pub name: String,
    pub address: Option<String>,
    /// Caretaker responsible for the house
    pub caretaker_id: Option<i32>,
}

/// Request body for updating a house.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq, Default)]
pub struct UpdateHouseRequest {
    #[validate(length(min = 1, message = "House name cannot be empty"))]
    pub name: Option<String>,
    pub address: Option<String>,
    pub caretaker_id: Option<i32>,
}

/// House response model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct HouseDto {
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
    pub caretaker_id: Option<i32>,
}

// ===================== Caretakers =====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct CreateCaretakerRequest {
    #[validate(length(min = 1, message = "Caretaker name cannot be empty"))]
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq, Default)]
pub struct UpdateCaretakerRequest {
    #[validate(length(min = 1, message = "Caretaker name cannot be empty"))]
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CaretakerDto {
    pub id: i32,
    pub name: String,
    pub phone: Option<String>,
}

// ===================== Renters =====================

/// Request body for creating a renter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct CreateRenterRequest {
    #[validate(length(min = 1, message = "Renter name cannot be empty"))]
    pub name: String,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    /// National identity document number
    pub national_id: Option<String>,
}

/// Request body for updating a renter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq, Default)]
pub struct UpdateRenterRequest {
    #[validate(length(min = 1, message = "Renter name cannot be empty"))]
    pub name: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub national_id: Option<String>,
}

/// Renter response model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RenterDto {
    pub id: i32,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub national_id: Option<String>,
}

// ===================== Flats =====================

/// An amenity as typed into a form: the charge is free text and may be
/// missing or non-numeric, in which case it counts as zero.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct AmenityInput {
    pub name: String,
    pub charge: Option<String>,
}

impl AmenityInput {
    pub fn new(name: impl Into<String>, charge: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            charge: Some(charge.into()),
        }
    }
}

/// A stored amenity of a flat.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AmenityDto {
    pub id: i32,
    pub name: String,
    pub charge: Decimal,
}

/// Request body for creating a flat.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct CreateFlatRequest {
    pub house_id: i32,
    #[validate(length(min = 1, message = "Flat number cannot be empty"))]
    pub number: String,
    pub floor: Option<i32>,
    /// Monthly base rent
    pub base_rent: Decimal,
    /// Monthly late fee as a percentage of base rent (default: 0)
    pub late_fee_percentage: Option<Decimal>,
    /// Unnamed amenities are dropped
    #[serde(default)]
    pub amenities: Vec<AmenityInput>,
}

/// Request body for updating a flat. `amenities`, when present, replaces the
/// existing list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq, Default)]
pub struct UpdateFlatRequest {
    #[validate(length(min = 1, message = "Flat number cannot be empty"))]
    pub number: Option<String>,
    pub floor: Option<i32>,
    pub base_rent: Option<Decimal>,
    pub late_fee_percentage: Option<Decimal>,
    pub amenities: Option<Vec<AmenityInput>>,
}

/// Flat response model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct FlatDto {
    pub id: i32,
    pub house_id: i32,
    pub number: String,
    pub floor: Option<i32>,
    pub base_rent: Decimal,
    pub late_fee_percentage: Decimal,
    pub amenities: Vec<AmenityDto>,
    /// Sum of all amenity charges
    pub amenities_total: Decimal,
    /// Base rent plus amenities
    pub total_rent: Decimal,
    /// Currently assigned renter, if the flat is occupied
    pub renter_id: Option<i32>,
    pub rent_start_date: Option<NaiveDate>,
}

/// Request body for assigning a renter to a flat.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct AssignRenterRequest {
    pub renter_id: i32,
    pub rent_start_date: NaiveDate,
    /// Initial advance deposits recorded together with the assignment
    #[serde(default)]
    #[validate(nested)]
    pub advance_payments: Vec<NewAdvancePayment>,
}
