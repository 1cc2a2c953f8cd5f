use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::{flat, renter};

/// Money collected from a renter ahead of rent, held as credit.
///
/// Invariant: `0 <= remaining_amount <= amount`. The status shown to users is
/// derived from these two columns and is not stored.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "advance_payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub flat_id: i32,
    pub renter_id: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    /// Actually received; may differ from `amount` for partial deposits.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub paid_amount: Decimal,
    /// Unconsumed balance.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub remaining_amount: Decimal,
    pub payment_date: NaiveDate,
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
        on_delete = "Restrict"
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
