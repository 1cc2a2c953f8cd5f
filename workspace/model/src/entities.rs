//! This file serves as the root for all SeaORM entity modules.
//! Data models of the property-management back office: houses and their
//! flats, renters and caretakers, rent obligations and advance credit.

pub mod advance_payment;
pub mod caretaker;
pub mod flat;
pub mod flat_amenity;
pub mod house;
pub mod rent_payment;
pub mod renter;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::advance_payment::Entity as AdvancePayment;
    pub use super::caretaker::Entity as Caretaker;
    pub use super::flat::Entity as Flat;
    pub use super::flat_amenity::Entity as FlatAmenity;
    pub use super::house::Entity as House;
    pub use super::rent_payment::Entity as RentPayment;
    pub use super::renter::Entity as Renter;
}
