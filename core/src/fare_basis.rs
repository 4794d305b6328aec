//! Baggage codes and fare-basis codes.

use crate::{
    tables,
    types::{Brand, Route, TripType},
};

const FBC_DELIMITER: char = '-';

/// Baggage allowance (kg) to fare-basis baggage code.
/// Brand 1 fares carry no baggage code.
pub fn baggage_code(brand: Brand, bag_kg: u32) -> &'static str {
    if brand == Brand::Brand1 {
        return "";
    }
    match bag_kg {
        20 => "B",
        30 => "L",
        40 => "X",
        kg if kg > 40 => "NF",
        _ => "",
    }
}

/// True when the batch header's sales label marks a structure filing.
pub fn is_structure_sales(sales: &str) -> bool {
    sales.trim().eq_ignore_ascii_case(tables::STRUCTURE_SALES_LABEL)
}

/// Assemble a fare-basis code:
/// origin, destination, class, trip marker, baggage code, brand digit,
/// origin country, channel digit, then the filing number after the delimiter.
pub fn fare_basis_code(
    route: &Route,
    rbd: char,
    trip: TripType,
    brand: Brand,
    bag_kg: u32,
    structure_sales: bool,
    filing_number: &str,
) -> String {
    format!(
        "{}{}{}{}{}{}{}{}{}{}",
        route.origin,
        route.destination,
        rbd,
        trip.fbc_marker(),
        baggage_code(brand, bag_kg),
        tables::brand_digit(brand, structure_sales),
        tables::origin_country(&route.origin),
        tables::channel_digit(brand.channel(), structure_sales),
        FBC_DELIMITER,
        filing_number,
    )
}
