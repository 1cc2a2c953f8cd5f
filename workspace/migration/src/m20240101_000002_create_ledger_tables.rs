use sea_orm_migration::{prelude::*, schema::*};

use crate::m20240101_000001_create_property_tables::{Flats, Renters};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create rent_payments table
        manager
            .create_table(
                Table::create()
                    .table(RentPayments::Table)
                    .if_not_exists()
                    .col(pk_auto(RentPayments::Id))
                    .col(integer(RentPayments::FlatId))
                    .col(integer_null(RentPayments::RenterId))
                    .col(date(RentPayments::DueDate))
                    .col(decimal(RentPayments::BaseRent).decimal_len(16, 4))
                    .col(decimal(RentPayments::AmenitiesTotal).decimal_len(16, 4).default(0))
                    .col(decimal(RentPayments::LateFee).decimal_len(16, 4).default(0))
                    .col(decimal(RentPayments::Amount).decimal_len(16, 4))
                    .col(decimal(RentPayments::PaidAmount).decimal_len(16, 4).default(0))
                    .col(string(RentPayments::Status).string_len(15))
                    .col(date_null(RentPayments::PaymentDate))
                    .col(string_null(RentPayments::PaymentMethod))
                    .col(string_null(RentPayments::TransactionId))
                    .col(string_null(RentPayments::Notes))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rent_payment_flat")
                            .from(RentPayments::Table, RentPayments::FlatId)
                            .to(Flats::Table, Flats::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rent_payment_renter")
                            .from(RentPayments::Table, RentPayments::RenterId)
                            .to(Renters::Table, Renters::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rent_payments_flat_due_date")
                    .table(RentPayments::Table)
                    .col(RentPayments::FlatId)
                    .col(RentPayments::DueDate)
                    .to_owned(),
            )
            .await?;

        // Create advance_payments table
        manager
            .create_table(
                Table::create()
                    .table(AdvancePayments::Table)
                    .if_not_exists()
                    .col(pk_auto(AdvancePayments::Id))
                    .col(integer(AdvancePayments::FlatId))
                    .col(integer(AdvancePayments::RenterId))
                    .col(decimal(AdvancePayments::Amount).decimal_len(16, 4))
                    .col(decimal(AdvancePayments::PaidAmount).decimal_len(16, 4))
                    .col(decimal(AdvancePayments::RemainingAmount).decimal_len(16, 4))
                    .col(date(AdvancePayments::PaymentDate))
                    .col(string_null(AdvancePayments::PaymentMethod))
                    .col(string_null(AdvancePayments::TransactionId))
                    .col(string_null(AdvancePayments::Notes))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_advance_payment_flat")
                            .from(AdvancePayments::Table, AdvancePayments::FlatId)
                            .to(Flats::Table, Flats::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_advance_payment_renter")
                            .from(AdvancePayments::Table, AdvancePayments::RenterId)
                            .to(Renters::Table, Renters::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_advance_payments_flat")
                    .table(AdvancePayments::Table)
                    .col(AdvancePayments::FlatId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdvancePayments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(RentPayments::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum RentPayments {
    Table,
    Id,
    FlatId,
    RenterId,
    DueDate,
    BaseRent,
    AmenitiesTotal,
    LateFee,
    Amount,
    PaidAmount,
    Status,
    PaymentDate,
    PaymentMethod,
    TransactionId,
    Notes,
}

#[derive(DeriveIden)]
enum AdvancePayments {
    Table,
    Id,
    FlatId,
    RenterId,
    Amount,
    PaidAmount,
    RemainingAmount,
    PaymentDate,
    PaymentMethod,
    TransactionId,
    Notes,
}
