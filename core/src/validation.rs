//! Row Validator: well-formedness and eligibility of one input row.
//!
//! Checks run in a fixed order and the first failure wins. A failing
//! row never reaches pricing; its skip reason becomes its status.

use crate::{
    config::{Cell, InputRow},
    reference::ReferenceData,
    status::RowSkip,
    types::{Currency, PriceLevel, Route, TripType},
};

/// A row that passed every check, with typed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRow {
    pub route:        Route,
    pub trip:         TripType,
    pub rbd:          char,
    pub filed_level:  PriceLevel,
    pub currency:     Currency,
    pub filed_total:  f64,
}

pub fn validate_row(row: &InputRow, reference: &ReferenceData) -> Result<ValidatedRow, RowSkip> {
    let [Some(origin), Some(destination), Some(trip), Some(rbd), Some(currency), Some(b1)] =
        row.required_cells()
    else {
        return Err(RowSkip::MissingInputData);
    };

    let filed_total = b1
        .as_number()
        .filter(|v| v.is_finite())
        .ok_or(RowSkip::IncorrectFiledFare)?;

    let route = Route::new(origin.as_text(), destination.as_text());
    if reference.restricted.is_restricted(&route) {
        return Err(RowSkip::RestrictedRoute);
    }
    if !reference.fare_calc_ods.is_eligible_origin(&route.origin) {
        return Err(RowSkip::IncorrectOrigin);
    }
    if !reference.fare_calc_ods.is_eligible_destination(&route.destination) {
        return Err(RowSkip::IncorrectDestination);
    }

    let trip = parse_trip(trip).ok_or(RowSkip::IncorrectTripType)?;
    let rbd = parse_fare_class(rbd).ok_or(RowSkip::IncorrectFareClass)?;
    let currency = match currency {
        Cell::Text(code) => Currency::parse(code.trim()),
        Cell::Number(_)  => None,
    }
    .ok_or(RowSkip::IncorrectCurrency)?;

    // A well-formed class the fare-level map does not know is still wrong.
    let filed_level = reference
        .fare_levels
        .level_of(rbd)
        .ok_or(RowSkip::IncorrectFareClass)?;

    Ok(ValidatedRow {
        route,
        trip,
        rbd,
        filed_level,
        currency,
        filed_total,
    })
}

fn parse_trip(cell: &Cell) -> Option<TripType> {
    let value = cell.as_number()?;
    if value.fract() != 0.0 {
        return None;
    }
    TripType::from_code(value as i64)
}

fn parse_fare_class(cell: &Cell) -> Option<char> {
    let Cell::Text(text) = cell else { return None };
    let mut chars = text.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ReferenceData {
        ReferenceData::default_test()
    }

    #[test]
    fn well_formed_row_validates() {
        let row = InputRow::new("DOH", "DXB", 1, "H", "QAR", 550.0);
        let v = validate_row(&row, &reference()).unwrap();
        assert_eq!(v.route, Route::new("DOH", "DXB"));
        assert_eq!(v.trip, TripType::OneWay);
        assert_eq!(v.filed_level, 3);
        assert_eq!(v.currency, Currency::QAR);
    }

    #[test]
    fn blank_cell_is_missing_input() {
        let mut row = InputRow::new("DOH", "DXB", 1, "H", "QAR", 550.0);
        row.currency = Some(Cell::text("  "));
        assert_eq!(validate_row(&row, &reference()), Err(RowSkip::MissingInputData));
        row.currency = None;
        assert_eq!(validate_row(&row, &reference()), Err(RowSkip::MissingInputData));
    }

    #[test]
    fn text_fare_is_incorrect_filed_fare() {
        let mut row = InputRow::new("DOH", "DXB", 1, "H", "QAR", 550.0);
        row.b1 = Some(Cell::text("550 QAR"));
        assert_eq!(validate_row(&row, &reference()), Err(RowSkip::IncorrectFiledFare));
    }

    #[test]
    fn restricted_route_wins_over_origin_check() {
        // JED is not an eligible origin either; restriction is checked first.
        let row = InputRow::new("JED", "BEY", 1, "H", "QAR", 550.0);
        assert_eq!(validate_row(&row, &reference()), Err(RowSkip::RestrictedRoute));
    }

    #[test]
    fn unknown_origin_and_destination() {
        let row = InputRow::new("LHR", "DXB", 1, "H", "QAR", 550.0);
        assert_eq!(validate_row(&row, &reference()), Err(RowSkip::IncorrectOrigin));
        let row = InputRow::new("DOH", "LHR", 1, "H", "QAR", 550.0);
        assert_eq!(validate_row(&row, &reference()), Err(RowSkip::IncorrectDestination));
    }

    #[test]
    fn sll_is_always_an_eligible_origin() {
        let row = InputRow::new("SLL", "DXB", 1, "H", "OMR", 80.0);
        assert!(validate_row(&row, &reference()).is_ok());
    }

    #[test]
    fn trip_class_and_currency_checks() {
        let row = InputRow::new("DOH", "DXB", 3, "H", "QAR", 550.0);
        assert_eq!(validate_row(&row, &reference()), Err(RowSkip::IncorrectTripType));
        let row = InputRow::new("DOH", "DXB", 1, "HK", "QAR", 550.0);
        assert_eq!(validate_row(&row, &reference()), Err(RowSkip::IncorrectFareClass));
        let row = InputRow::new("DOH", "DXB", 1, "Z", "QAR", 550.0);
        assert_eq!(validate_row(&row, &reference()), Err(RowSkip::IncorrectFareClass));
        let row = InputRow::new("DOH", "DXB", 1, "H", "USD", 550.0);
        assert_eq!(validate_row(&row, &reference()), Err(RowSkip::IncorrectCurrency));
    }
}
