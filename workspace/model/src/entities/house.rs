use sea_orm::entity::prelude::*;

use super::{caretaker, flat};

/// A building containing flats.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "houses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
    /// Caretaker responsible for the house, if any.
    pub caretaker_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "caretaker::Entity",
        from = "Column::CaretakerId",
        to = "caretaker::Column::Id",
        on_delete = "SetNull"
    )]
    Caretaker,
    #[sea_orm(has_many = "flat::Entity")]
    Flat,
}

impl Related<caretaker::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Caretaker.def()
    }
}

impl Related<flat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Flat.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
