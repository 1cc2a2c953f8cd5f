use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create caretakers table
        manager
            .create_table(
                Table::create()
                    .table(Caretakers::Table)
                    .if_not_exists()
                    .col(pk_auto(Caretakers::Id))
                    .col(string(Caretakers::Name))
                    .col(string_null(Caretakers::Phone))
                    .to_owned(),
            )
            .await?;

        // Create houses table
        manager
            .create_table(
                Table::create()
                    .table(Houses::Table)
                    .if_not_exists()
                    .col(pk_auto(Houses::Id))
                    .col(string(Houses::Name))
                    .col(string_null(Houses::Address))
                    .col(integer_null(Houses::CaretakerId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_house_caretaker")
                            .from(Houses::Table, Houses::CaretakerId)
                            .to(Caretakers::Table, Caretakers::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create renters table
        manager
            .create_table(
                Table::create()
                    .table(Renters::Table)
                    .if_not_exists()
                    .col(pk_auto(Renters::Id))
                    .col(string(Renters::Name))
                    .col(string_null(Renters::Phone))
                    .col(string_null(Renters::Email))
                    .col(string_null(Renters::NationalId))
                    .to_owned(),
            )
            .await?;

        // Create flats table
        manager
            .create_table(
                Table::create()
                    .table(Flats::Table)
                    .if_not_exists()
                    .col(pk_auto(Flats::Id))
                    .col(integer(Flats::HouseId))
                    .col(string(Flats::Number))
                    .col(integer_null(Flats::Floor))
                    .col(decimal(Flats::BaseRent).decimal_len(16, 4))
                    .col(decimal(Flats::LateFeePercentage).decimal_len(8, 4).default(0))
                    .col(integer_null(Flats::RenterId))
                    .col(date_null(Flats::RentStartDate))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_flat_house")
                            .from(Flats::Table, Flats::HouseId)
                            .to(Houses::Table, Houses::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_flat_renter")
                            .from(Flats::Table, Flats::RenterId)
                            .to(Renters::Table, Renters::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create flat_amenities table
        manager
            .create_table(
                Table::create()
                    .table(FlatAmenities::Table)
                    .if_not_exists()
                    .col(pk_auto(FlatAmenities::Id))
                    .col(integer(FlatAmenities::FlatId))
                    .col(string(FlatAmenities::Name))
                    .col(decimal(FlatAmenities::Charge).decimal_len(16, 4))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_flat_amenity_flat")
                            .from(FlatAmenities::Table, FlatAmenities::FlatId)
                            .to(Flats::Table, Flats::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(FlatAmenities::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Flats::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Renters::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Houses::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Caretakers::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Caretakers {
    Table,
    Id,
    Name,
    Phone,
}

#[derive(DeriveIden)]
pub(crate) enum Houses {
    Table,
    Id,
    Name,
    Address,
    CaretakerId,
}

#[derive(DeriveIden)]
pub(crate) enum Renters {
    Table,
    Id,
    Name,
    Phone,
    Email,
    NationalId,
}

#[derive(DeriveIden)]
pub(crate) enum Flats {
    Table,
    Id,
    HouseId,
    Number,
    Floor,
    BaseRent,
    LateFeePercentage,
    RenterId,
    RentStartDate,
}

#[derive(DeriveIden)]
pub(crate) enum FlatAmenities {
    Table,
    Id,
    FlatId,
    Name,
    Charge,
}
