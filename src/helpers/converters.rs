//! Conversions from stored models to the DTOs served by the API.

use chrono::NaiveDate;
use common::{
    AdvancePaymentDto, AmenityDto, CaretakerDto, FlatDto, HouseDto, RentPaymentDto, RentStatus,
    RenterDto,
};
use compute::{consumption::AdvanceCredit, status};
use model::entities::{
    advance_payment, caretaker, flat, flat_amenity, house, rent_payment,
    rent_payment::RentPaymentStatus, renter,
};
use rust_decimal::Decimal;

pub fn house_dto(model: house::Model) -> HouseDto {
    HouseDto {
        id: model.id,
        name: model.name,
        address: model.address,
        caretaker_id: model.caretaker_id,
    }
}

pub fn caretaker_dto(model: caretaker::Model) -> CaretakerDto {
    CaretakerDto {
        id: model.id,
        name: model.name,
        phone: model.phone,
    }
}

pub fn renter_dto(model: renter::Model) -> RenterDto {
    RenterDto {
        id: model.id,
        name: model.name,
        phone: model.phone,
        email: model.email,
        national_id: model.national_id,
    }
}

/// Builds a flat view with its amenities and rent totals.
pub fn flat_dto(model: flat::Model, amenities: Vec<flat_amenity::Model>) -> FlatDto {
    let amenities_total: Decimal = amenities.iter().map(|amenity| amenity.charge).sum();

    FlatDto {
        id: model.id,
        house_id: model.house_id,
        number: model.number,
        floor: model.floor,
        base_rent: model.base_rent,
        late_fee_percentage: model.late_fee_percentage,
        amenities: amenities
            .into_iter()
            .map(|amenity| AmenityDto {
                id: amenity.id,
                name: amenity.name,
                charge: amenity.charge,
            })
            .collect(),
        amenities_total,
        total_rent: model.base_rent + amenities_total,
        renter_id: model.renter_id,
        rent_start_date: model.rent_start_date,
    }
}

pub fn rent_status_to_model(status: RentStatus) -> RentPaymentStatus {
    match status {
        RentStatus::Pending => RentPaymentStatus::Pending,
        RentStatus::Paid => RentPaymentStatus::Paid,
        RentStatus::Overdue => RentPaymentStatus::Overdue,
        RentStatus::Partial => RentPaymentStatus::Partial,
        RentStatus::Cancelled => RentPaymentStatus::Cancelled,
    }
}

/// Current status of a stored obligation. Overdue depends on `today`, so the
/// stored value is only trusted for cancellation.
pub fn derive_rent_status(model: &rent_payment::Model, today: NaiveDate) -> RentStatus {
    status::rent_status(
        model.amount,
        model.paid_amount,
        model.due_date,
        today,
        model.status == RentPaymentStatus::Cancelled,
    )
}

pub fn rent_payment_dto(model: rent_payment::Model, today: NaiveDate) -> RentPaymentDto {
    let status = derive_rent_status(&model, today);
    let amount_due = compute::rent_due(model.amount, Some(model.paid_amount));

    RentPaymentDto {
        id: model.id,
        flat_id: model.flat_id,
        renter_id: model.renter_id,
        due_date: model.due_date,
        base_rent: model.base_rent,
        amenities_total: model.amenities_total,
        late_fee: model.late_fee,
        amount: model.amount,
        paid_amount: model.paid_amount,
        amount_due,
        status,
        payment_date: model.payment_date,
        payment_method: model.payment_method,
        transaction_id: model.transaction_id,
        notes: model.notes,
    }
}

pub fn advance_payment_dto(model: advance_payment::Model) -> AdvancePaymentDto {
    AdvancePaymentDto {
        id: model.id,
        flat_id: model.flat_id,
        renter_id: model.renter_id,
        amount: model.amount,
        paid_amount: model.paid_amount,
        remaining_amount: model.remaining_amount,
        payment_date: model.payment_date,
        payment_method: model.payment_method,
        transaction_id: model.transaction_id,
        notes: model.notes,
        status: status::advance_status(model.amount, model.remaining_amount),
    }
}

pub fn advance_credit(model: &advance_payment::Model) -> AdvanceCredit {
    AdvanceCredit {
        id: model.id,
        payment_date: model.payment_date,
        remaining: model.remaining_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AdvanceStatus;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn obligation(paid: i64, status: RentPaymentStatus) -> rent_payment::Model {
        rent_payment::Model {
            id: 1,
            flat_id: 1,
            renter_id: Some(1),
            due_date: date(1),
            base_rent: Decimal::from(900),
            amenities_total: Decimal::from(100),
            late_fee: Decimal::ZERO,
            amount: Decimal::from(1000),
            paid_amount: Decimal::from(paid),
            status,
            payment_date: None,
            payment_method: None,
            transaction_id: None,
            notes: None,
        }
    }

    #[test]
    fn test_rent_payment_dto_derives_status_and_due() {
        let dto = rent_payment_dto(obligation(400, RentPaymentStatus::Pending), date(10));
        assert_eq!(dto.status, RentStatus::Partial);
        assert_eq!(dto.amount_due, Decimal::from(600));

        let dto = rent_payment_dto(obligation(0, RentPaymentStatus::Pending), date(10));
        assert_eq!(dto.status, RentStatus::Overdue);

        let dto = rent_payment_dto(obligation(0, RentPaymentStatus::Cancelled), date(10));
        assert_eq!(dto.status, RentStatus::Cancelled);
    }

    #[test]
    fn test_status_is_stored_as_derived() {
        for (paid, expected) in [
            (0, RentPaymentStatus::Overdue),
            (400, RentPaymentStatus::Partial),
            (1000, RentPaymentStatus::Paid),
        ] {
            let model = obligation(paid, RentPaymentStatus::Pending);
            let derived = derive_rent_status(&model, date(20));
            assert_eq!(rent_status_to_model(derived), expected);
        }
        assert_eq!(
            rent_status_to_model(RentStatus::Cancelled),
            RentPaymentStatus::Cancelled
        );
    }

    #[test]
    fn test_flat_dto_totals() {
        let flat = flat::Model {
            id: 7,
            house_id: 1,
            number: "2B".to_string(),
            floor: Some(2),
            base_rent: Decimal::from(5000),
            late_fee_percentage: Decimal::from(5),
            renter_id: None,
            rent_start_date: None,
        };
        let amenities = vec![
            flat_amenity::Model {
                id: 1,
                flat_id: 7,
                name: "wifi".to_string(),
                charge: Decimal::from(200),
            },
            flat_amenity::Model {
                id: 2,
                flat_id: 7,
                name: "parking".to_string(),
                charge: Decimal::from(300),
            },
        ];

        let dto = flat_dto(flat, amenities);
        assert_eq!(dto.amenities_total, Decimal::from(500));
        assert_eq!(dto.total_rent, Decimal::from(5500));
        assert_eq!(dto.amenities.len(), 2);
    }

    #[test]
    fn test_advance_dto_status() {
        let advance = advance_payment::Model {
            id: 3,
            flat_id: 1,
            renter_id: 1,
            amount: Decimal::from(1000),
            paid_amount: Decimal::from(1000),
            remaining_amount: Decimal::from(250),
            payment_date: date(1),
            payment_method: None,
            transaction_id: None,
            notes: None,
        };
        assert_eq!(advance_payment_dto(advance).status, AdvanceStatus::PartiallyUsed);
    }
}
