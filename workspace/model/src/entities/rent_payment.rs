use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::{flat, renter};

/// Lifecycle state of a rent obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(15))")]
pub enum RentPaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending, // Not yet due or due today, nothing paid.
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "overdue")]
    Overdue, // Past the due date with nothing paid.
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// A periodic amount owed for a flat: base rent plus amenities plus any late
/// fee, and how much of it has been settled.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "rent_payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub flat_id: i32,
    /// Renter the obligation was raised against (nullable once the renter is deleted).
    pub renter_id: Option<i32>,
    pub due_date: NaiveDate,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub base_rent: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amenities_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub late_fee: Decimal,
    /// Total due.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    /// Settled so far, by cash or advance credit.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub paid_amount: Decimal,
    pub status: RentPaymentStatus,
    /// Date of the most recent settlement.
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "flat::Entity",
        from = "Column::FlatId",
        to = "flat::Column::Id",
        on_delete = "Cascade"
    )]
    Flat,
    #[sea_orm(
        belongs_to = "renter::Entity",
        from = "Column::RenterId",
        to = "renter::Column::Id",
        on_delete = "SetNull"
    )]
    Renter,
}

impl Related<flat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Flat.def()
    }
}

impl Related<renter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Renter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
