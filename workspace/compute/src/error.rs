use rust_decimal::Decimal;
use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    /// The amount to apply is zero or negative
    #[error("Amount to apply must be greater than zero")]
    NonPositiveAmount,

    /// The amount to apply is larger than what is still owed
    #[error("Amount {amount} exceeds the rent due of {rent_due}")]
    ExceedsRentDue { amount: Decimal, rent_due: Decimal },

    /// The amount to apply is larger than the advance balance
    #[error("Amount {amount} exceeds the remaining advance of {available}")]
    ExceedsAdvance { amount: Decimal, available: Decimal },

    /// Unrecognised late-fee proration setting
    #[error("Unknown proration base '{0}'")]
    InvalidProration(String),
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
