//! Pure estimators shared by the server and the client: advance allocation,
//! late fees, amenity totals, FIFO advance consumption and status derivation.

pub mod allocation;
pub mod amenities;
pub mod consumption;
pub mod error;
pub mod late_fee;
pub mod schedule;
pub mod status;

pub use allocation::{AllocationPreview, preview, rent_due, suggest, validate};
pub use amenities::AmenityFilter;
pub use consumption::{AdvanceCredit, ConsumptionPlan};
pub use error::ComputeError;
pub use late_fee::{ProrationBase, late_fee};
