use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::{advance_payment, flat_amenity, house, renter, rent_payment};

/// A rentable unit inside a house.
///
/// A flat has at most one active renter; `renter_id` is cleared when the
/// flat is vacated.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "flats")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub house_id: i32,
    /// Door number or label, unique only within its house.
    pub number: String,
    pub floor: Option<i32>,
    /// Monthly rent before amenities and late fees.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub base_rent: Decimal,
    /// Monthly late fee as a percentage of the base rent.
    #[sea_orm(column_type = "Decimal(Some((8, 4)))")]
    pub late_fee_percentage: Decimal,
    pub renter_id: Option<i32>,
    pub rent_start_date: Option<NaiveDate>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "house::Entity",
        from = "Column::HouseId",
        to = "house::Column::Id",
        on_delete = "Cascade"
    )]
    House,
    #[sea_orm(
        belongs_to = "renter::Entity",
        from = "Column::RenterId",
        to = "renter::Column::Id",
        on_delete = "SetNull"
    )]
    Renter,
    #[sea_orm(has_many = "flat_amenity::Entity")]
    FlatAmenity,
    #[sea_orm(has_many = "rent_payment::Entity")]
    RentPayment,
    #[sea_orm(has_many = "advance_payment::Entity")]
    AdvancePayment,
}

impl Related<house::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::House.def()
    }
}

impl Related<renter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Renter.def()
    }
}

impl Related<flat_amenity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FlatAmenity.def()
    }
}

impl Related<rent_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RentPayment.def()
    }
}

impl Related<advance_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdvancePayment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
