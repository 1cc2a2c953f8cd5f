use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::flat;

/// A named monthly add-on charge of a flat (wifi, parking, ...).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "flat_amenities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub flat_id: i32,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub charge: Decimal,
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
}

impl Related<flat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Flat.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
