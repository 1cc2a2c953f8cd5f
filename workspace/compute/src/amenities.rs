use std::str::FromStr;

use common::AmenityInput;
use rust_decimal::Decimal;
use tracing::trace;

/// Which amenity entries take part in a total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmenityFilter {
    /// Entries with a blank name are ignored.
    NamedOnly,
    /// Every entry counts.
    All,
}

/// Parses a free-form charge. Missing, blank and non-numeric values are zero.
pub fn parse_charge(charge: Option<&str>) -> Decimal {
    charge
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| Decimal::from_str(raw).ok())
        .unwrap_or(Decimal::ZERO)
}

/// Keeps the entries selected by `filter`, in order.
pub fn retained(amenities: &[AmenityInput], filter: AmenityFilter) -> Vec<&AmenityInput> {
    amenities
        .iter()
        .filter(|amenity| match filter {
            AmenityFilter::NamedOnly => !amenity.name.trim().is_empty(),
            AmenityFilter::All => true,
        })
        .collect()
}

/// Sums amenity charges.
pub fn total(amenities: &[AmenityInput], filter: AmenityFilter) -> Decimal {
    let sum: Decimal = retained(amenities, filter)
        .into_iter()
        .map(|amenity| parse_charge(amenity.charge.as_deref()))
        .sum();
    trace!("Amenities total over {} entries: {}", amenities.len(), sum);
    sum
}

/// Base rent plus amenities.
pub fn total_rent(base_rent: Decimal, amenities: &[AmenityInput], filter: AmenityFilter) -> Decimal {
    base_rent + total(amenities, filter)
}
