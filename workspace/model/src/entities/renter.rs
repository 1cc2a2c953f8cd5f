use sea_orm::entity::prelude::*;

use super::{advance_payment, rent_payment};

/// A person renting (or having rented) a flat.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "renters")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// National identity document number.
    pub national_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "advance_payment::Entity")]
    AdvancePayment,
    #[sea_orm(has_many = "rent_payment::Entity")]
    RentPayment,
}

impl Related<advance_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdvancePayment.def()
    }
}

impl Related<rent_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RentPayment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
