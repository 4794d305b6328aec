use crate::{
    reference::{
        ExchangeRates, ExistingFare, ExistingFares, FareCalcOds, FareLevelMap, ReferenceData,
        RestrictedRoutes, TaxEntry, TaxTable, TicketingFeeDiscount, TicketingFeeDiscounts,
    },
    types::{Brand, PriceLevel, Route, TripType},
};
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{collections::HashSet, path::Path};

// ── Reference sheets ───────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct FareLevelsFile {
    levels: Vec<FareLevelRow>,
}

#[derive(Debug, Clone, Deserialize)]
struct FareLevelRow {
    level:      PriceLevel,
    fare_class: String,
}

#[derive(Debug, Clone, Deserialize)]
struct TaxFile {
    taxes: Vec<TaxRow>,
}

#[derive(Debug, Clone, Deserialize)]
struct TaxRow {
    origin:          String,
    destination:     String,
    journey_type:    String,
    fixed_tax_total: Option<f64>,
    yq:              Option<f64>,
    yr:              Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct ExchangeRatesFile {
    rates: Vec<ExchangeRateRow>,
}

#[derive(Debug, Clone, Deserialize)]
struct ExchangeRateRow {
    currency: String,
    price:    f64,
}

#[derive(Debug, Clone, Deserialize)]
struct AtpcoFile {
    fares: Vec<ExistingFare>,
}

#[derive(Debug, Clone, Deserialize)]
struct FareCalcOdFile {
    rows: Vec<FareCalcOdRow>,
}

#[derive(Debug, Clone, Deserialize)]
struct FareCalcOdRow {
    #[serde(default)]
    origin:          Option<String>,
    #[serde(default)]
    destination:     Option<String>,
    #[serde(default)]
    all_destination: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TfeeDiscountFile {
    discounts: Vec<TfeeDiscountRow>,
}

#[derive(Debug, Clone, Deserialize)]
struct TfeeDiscountRow {
    ods: String,
    #[serde(default)]
    ow:  Option<f64>,
    #[serde(default)]
    rt:  Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct RestrictedOdFile {
    rows: Vec<RestrictedOdRow>,
}

#[derive(Debug, Clone, Deserialize)]
struct RestrictedOdRow {
    #[serde(default)]
    origin:      Option<String>,
    #[serde(default)]
    destination: Option<String>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Cannot parse {}: {e}", path.display()))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ReferenceData {
    /// Load every reference sheet from `<data_dir>/reference/`.
    /// In tests, use ReferenceData::default_test().
    pub fn load(data_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = data_dir.as_ref().join("reference");

        let levels_file: FareLevelsFile = read_json(&dir.join("fare_levels.json"))?;
        let mut pairs = Vec::with_capacity(levels_file.levels.len());
        for row in levels_file.levels {
            let mut chars = row.fare_class.trim().chars();
            match (chars.next(), chars.next()) {
                (Some(class), None) => pairs.push((row.level, class)),
                _ => anyhow::bail!(
                    "fare level {} has class '{}', expected one character",
                    row.level,
                    row.fare_class
                ),
            }
        }
        let fare_levels = FareLevelMap::from_pairs(pairs)?;

        let tax_file: TaxFile = read_json(&dir.join("tax.json"))?;
        let mut taxes = TaxTable::default();
        for row in tax_file.taxes {
            let trip = match row.journey_type.trim() {
                "OW" => TripType::OneWay,
                "RT" => TripType::RoundTrip,
                other => {
                    log::warn!("reference: ignoring tax row with journey type '{other}'");
                    continue;
                }
            };
            taxes.insert(
                Route::new(row.origin.trim(), row.destination.trim()),
                trip,
                TaxEntry {
                    fixed_tax_total: row.fixed_tax_total,
                    yq:              row.yq,
                    yr:              row.yr,
                },
            );
        }

        let exch_file: ExchangeRatesFile = read_json(&dir.join("exchange_rates.json"))?;
        let mut exchange_rates = ExchangeRates::default();
        for row in exch_file.rates {
            exchange_rates.insert(row.currency.trim(), row.price);
        }

        let atpco_file: AtpcoFile = read_json(&dir.join("atpco.json"))?;
        let existing_fares = ExistingFares::from_rows(atpco_file.fares);

        let fod_file: FareCalcOdFile = read_json(&dir.join("fare_calc_od.json"))?;
        let mut fare_calc_ods = FareCalcOds::default();
        for row in fod_file.rows {
            fare_calc_ods.origins.extend(trimmed(row.origin));
            fare_calc_ods.destinations.extend(trimmed(row.destination));
            fare_calc_ods.all_destinations.extend(trimmed(row.all_destination));
        }

        let tfee_file: TfeeDiscountFile = read_json(&dir.join("tfee_discount.json"))?;
        let mut tfee_discounts = TicketingFeeDiscounts::default();
        for row in tfee_file.discounts {
            tfee_discounts.insert(row.ods.trim(), TicketingFeeDiscount { ow: row.ow, rt: row.rt });
        }

        let restricted_file: RestrictedOdFile = read_json(&dir.join("restricted_od.json"))?;
        let mut restricted = RestrictedRoutes::default();
        for row in restricted_file.rows {
            restricted.origins.extend(trimmed(row.origin));
            restricted.destinations.extend(trimmed(row.destination));
        }

        log::info!(
            "reference: loaded {} fare levels, {} existing fares from {}",
            fare_levels.len(),
            existing_fares.len(),
            dir.display()
        );

        Ok(Self {
            fare_levels,
            taxes,
            exchange_rates,
            existing_fares,
            fare_calc_ods,
            tfee_discounts,
            restricted,
        })
    }

    /// Small fixed reference set used across the test suite.
    ///
    /// - Routes DOH-DXB, DOH-CAI, DOH-SAW (filed as DOH-IST), BAH-DXB.
    /// - Levels 1..=8 filed under "F1" for every brand, both trips,
    ///   base fare = level × 100 (× 200 round-trip).
    /// - Structure levels 9..=16 filed under "S1", one-way only.
    /// - GH ancillary fares for Brand 1 and Brand 2 under "F1".
    pub fn default_test() -> Self {
        let mut taxes = TaxTable::default();
        let tax = |fixed: f64, yq: f64, yr: f64| TaxEntry {
            fixed_tax_total: Some(fixed),
            yq:              Some(yq),
            yr:              Some(yr),
        };
        taxes.insert(Route::new("DOH", "DXB"), TripType::OneWay, tax(50.0, 30.0, 20.0));
        taxes.insert(Route::new("DOH", "DXB"), TripType::RoundTrip, tax(100.0, 60.0, 40.0));
        taxes.insert(Route::new("DOH", "CAI"), TripType::OneWay, tax(40.0, 25.0, 15.0));
        taxes.insert(Route::new("DOH", "SAW"), TripType::OneWay, tax(60.0, 30.0, 20.0));
        taxes.insert(Route::new("BAH", "DXB"), TripType::OneWay, tax(5.0, 3.0, 2.0));

        let mut exchange_rates = ExchangeRates::default();
        exchange_rates.insert("QAR/AED", 1.0);
        exchange_rates.insert("SAR/AED", 1.0);
        exchange_rates.insert("BHD/AED", 10.0);
        exchange_rates.insert("KWD/AED", 12.0);
        exchange_rates.insert("OMR/AED", 10.0);

        let fare_levels = FareLevelMap::standard();
        let mut fares = Vec::new();
        for (loc1, loc2) in [("DOH", "DXB"), ("DOH", "CAI"), ("DOH", "IST"), ("BAH", "DXB")] {
            for level in 1..=16u8 {
                let Some(class) = fare_levels.class_of(level) else { continue };
                for trip in [TripType::OneWay, TripType::RoundTrip] {
                    let structure = level > crate::types::MAX_FILED_LEVEL;
                    if structure && trip == TripType::RoundTrip {
                        continue;
                    }
                    let filing_number = if structure { "S1" } else { "F1" };
                    for brand in Brand::ALL {
                        let base = f64::from(level) * trip.pick(100.0, 200.0);
                        fares.push(test_fare(
                            loc1,
                            loc2,
                            &class.to_string(),
                            brand,
                            filing_number,
                            trip,
                            base,
                            Some(test_bag(brand)),
                        ));
                    }
                }
            }
            for trip in [TripType::OneWay, TripType::RoundTrip] {
                for brand in [Brand::Brand1, Brand::Brand2] {
                    fares.push(test_fare(loc1, loc2, "GH", brand, "F1", trip, 150.0, None));
                }
            }
        }

        Self {
            fare_levels,
            taxes,
            exchange_rates,
            existing_fares: ExistingFares::from_rows(fares),
            fare_calc_ods: FareCalcOds {
                origins:          string_set(&["DOH", "BAH", "KWI", "MCT"]),
                destinations:     string_set(&["DXB"]),
                all_destinations: string_set(&["DXB", "CAI", "SAW", "BEY"]),
            },
            tfee_discounts: {
                let mut d = TicketingFeeDiscounts::default();
                d.insert("DOHDXB", TicketingFeeDiscount { ow: Some(10.0), rt: Some(20.0) });
                d.insert("DOHSAW", TicketingFeeDiscount { ow: Some(10.0), rt: None });
                d.insert("BAHDXB", TicketingFeeDiscount { ow: Some(1.0), rt: Some(2.0) });
                d
            },
            restricted: RestrictedRoutes {
                origins:      string_set(&["JED"]),
                destinations: string_set(&["BEY"]),
            },
        }
    }
}

fn string_set(codes: &[&str]) -> HashSet<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

fn test_bag(brand: Brand) -> u32 {
    match brand {
        Brand::Brand1 | Brand::Brand2 => 20,
        Brand::Gds1 | Brand::Brand3   => 30,
        Brand::Gds2                   => 40,
    }
}

#[allow(clippy::too_many_arguments)]
fn test_fare(
    loc1: &str,
    loc2: &str,
    rbd: &str,
    brand: Brand,
    filing_number: &str,
    trip: TripType,
    base: f64,
    bag: Option<u32>,
) -> ExistingFare {
    ExistingFare {
        tariff:        "FBRINP".into(),
        cxr:           "XY".into(),
        nat1:          "QA".into(),
        nat2:          "AE".into(),
        loc1:          loc1.into(),
        loc2:          loc2.into(),
        rule:          "XY01".into(),
        fare_class:    format!("{rbd}{}{}", trip.fbc_marker(), brand.index() + 1),
        ow_rt:         trip.code(),
        rtg:           "0".into(),
        filing_number: filing_number.into(),
        cur:           "QAR".into(),
        amount:        base,
        eff_date:      NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or(NaiveDate::MIN),
        disc_date:     "INF".into(),
        gfsfan:        format!("{loc1}{loc2}{rbd}"),
        rbd:           rbd.into(),
        brand:         brand.label().into(),
        bag,
        base_fare:     Some(base),
        total_fare:    Some(base + 80.0),
    }
}

// ── Input batch ────────────────────────────────────────────────────

/// Metadata fields printed on every FILE row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchHeader {
    pub sales:         String,
    pub travel:        String,
    pub filing_number: String,
}

impl BatchHeader {
    pub fn default_test() -> Self {
        Self {
            sales:         "WEB SALES".into(),
            travel:        "ALL YEAR".into(),
            filing_number: "F1".into(),
        }
    }
}

/// One spreadsheet cell as it arrives: number or text. Blank cells are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Trimmed text; numbers are rendered without a trailing ".0".
    pub fn as_text(&self) -> String {
        match self {
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(_)   => None,
        }
    }

    /// Blank text counts as a missing value.
    fn is_blank(&self) -> bool {
        matches!(self, Cell::Text(s) if s.trim().is_empty())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

/// One input row: {Origin, Destination, O/R, RBD, Currency, B1}.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputRow {
    #[serde(default)]
    pub origin:      Option<Cell>,
    #[serde(default)]
    pub destination: Option<Cell>,
    #[serde(default)]
    pub trip:        Option<Cell>,
    #[serde(default)]
    pub rbd:         Option<Cell>,
    #[serde(default)]
    pub currency:    Option<Cell>,
    #[serde(default)]
    pub b1:          Option<Cell>,
}

impl InputRow {
    /// Convenience constructor for a fully populated row.
    pub fn new(origin: &str, destination: &str, trip: u8, rbd: &str, currency: &str, b1: f64) -> Self {
        Self {
            origin:      Some(Cell::text(origin)),
            destination: Some(Cell::text(destination)),
            trip:        Some(Cell::Number(f64::from(trip))),
            rbd:         Some(Cell::text(rbd)),
            currency:    Some(Cell::text(currency)),
            b1:          Some(Cell::Number(b1)),
        }
    }

    /// Required fields, in column order. Blank text reads as missing.
    pub(crate) fn required_cells(&self) -> [Option<&Cell>; 6] {
        [
            &self.origin,
            &self.destination,
            &self.trip,
            &self.rbd,
            &self.currency,
            &self.b1,
        ]
        .map(|c| c.as_ref().filter(|cell| !cell.is_blank()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputBatch {
    pub header: BatchHeader,
    pub rows:   Vec<InputRow>,
}

impl InputBatch {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let batch: InputBatch = read_json(path.as_ref())?;
        log::info!(
            "batch: {} rows, filing number {}",
            batch.rows.len(),
            batch.header.filing_number
        );
        Ok(batch)
    }
}
