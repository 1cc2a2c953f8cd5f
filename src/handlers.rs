pub mod advances;
pub mod caretakers;
pub mod flats;
pub mod health;
pub mod houses;
pub mod payments;
pub mod renters;
