//! Fare Level Resolver: filed fare to canonical price level.
//!
//! The filed total is stripped of fixed tax, converted to AED and
//! truncated; the result is looked up in the band table of the trip type.

use crate::{
    error::FilingError,
    reference::{FareLevelMap, TaxComponents},
    status::{RowFailure, RowSkip},
    tables::{self, MIN_FARE_AED},
    types::{PriceLevel, TripType},
};

/// Float noise below this is not a fraction worth rounding up.
const ROUNDING_TOLERANCE: f64 = 1e-6;

/// Round a fare up to the next whole unit. Whole amounts are unchanged.
/// Fares are never rounded down: the carrier must not under-file.
pub fn round_up(amount: f64) -> f64 {
    let nearest = amount.round();
    if (amount - nearest).abs() < ROUNDING_TOLERANCE {
        nearest
    } else {
        amount.ceil()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelResolution {
    /// Truncated AED base fare incl. fuel surcharge.
    pub aed_amount: i64,
    pub class:      char,
    pub level:      PriceLevel,
}

/// AED amount a filed total is banded on: (total − fixed tax) × rate, truncated.
pub fn level_amount_aed(filed_total: f64, taxes: &TaxComponents, rate: f64) -> i64 {
    ((filed_total - taxes.fixed_tax) * rate) as i64
}

/// Fare class whose band contains `amount`. `None` below the table's floor.
pub fn class_for_amount(amount: i64, trip: TripType) -> Option<char> {
    tables::fare_bands(trip)
        .iter()
        .find(|band| band.contains(amount))
        .map(|band| band.class)
}

pub fn resolve_level(
    filed_total: f64,
    taxes: &TaxComponents,
    rate: f64,
    trip: TripType,
    levels: &FareLevelMap,
) -> Result<LevelResolution, RowFailure> {
    let aed_amount = level_amount_aed(filed_total, taxes, rate);
    if aed_amount < MIN_FARE_AED {
        return Err(RowSkip::IncorrectTotalFare.into());
    }
    let class = class_for_amount(aed_amount, trip).ok_or(RowSkip::IncorrectTotalFare)?;
    let level = levels.level_of(class).ok_or_else(|| {
        FilingError::InvalidReference(format!("fare class {class} has no fare level"))
    })?;
    Ok(LevelResolution { aed_amount, class, level })
}
