//! Reference Data Store: the immutable lookup tables of one run.
//!
//! RULE: Loaded once, never mutated during a batch.
//! Pricing code reads these tables through the lookup methods below;
//! it never scans the raw rows itself.

use crate::{
    error::{FilingError, FilingResult},
    tables,
    types::{Brand, Currency, FilingNumber, PriceLevel, Route, TripType},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Bijection between price level and single-character fare class (RBD).
#[derive(Debug, Clone, Default)]
pub struct FareLevelMap {
    by_level: BTreeMap<PriceLevel, char>,
    by_class: HashMap<char, PriceLevel>,
}

impl FareLevelMap {
    /// Build from (level, class) pairs. Fails unless the pairs form a bijection.
    pub fn from_pairs<I>(pairs: I) -> FilingResult<Self>
    where
        I: IntoIterator<Item = (PriceLevel, char)>,
    {
        let mut map = Self::default();
        for (level, class) in pairs {
            if map.by_level.insert(level, class).is_some() {
                return Err(FilingError::InvalidReference(format!(
                    "fare level {level} mapped twice"
                )));
            }
            if map.by_class.insert(class, level).is_some() {
                return Err(FilingError::InvalidReference(format!(
                    "fare class {class} mapped twice"
                )));
            }
        }
        Ok(map)
    }

    /// The carrier's standard ladder: band order of the threshold tables.
    pub fn standard() -> Self {
        let mut map = Self::default();
        for (i, band) in tables::ONE_WAY_BANDS.iter().enumerate() {
            let level = (i + 1) as PriceLevel;
            map.by_level.insert(level, band.class);
            map.by_class.insert(band.class, level);
        }
        map
    }

    pub fn class_of(&self, level: PriceLevel) -> Option<char> {
        self.by_level.get(&level).copied()
    }

    pub fn level_of(&self, class: char) -> Option<PriceLevel> {
        self.by_class.get(&class).copied()
    }

    pub fn len(&self) -> usize {
        self.by_level.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_level.is_empty()
    }
}

/// Fixed tax, fuel surcharge (YQ) and ticketing fee (YR) for one OD/journey.
/// Any component may be blank on the source sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxEntry {
    pub fixed_tax_total: Option<f64>,
    pub yq:              Option<f64>,
    pub yr:              Option<f64>,
}

/// A fully populated tax entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxComponents {
    pub fixed_tax:     f64,
    pub fuel:          f64,
    pub ticketing_fee: f64,
}

impl TaxEntry {
    pub fn complete(&self) -> Option<TaxComponents> {
        Some(TaxComponents {
            fixed_tax:     self.fixed_tax_total?,
            fuel:          self.yq?,
            ticketing_fee: self.yr?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaxTable {
    entries: HashMap<(String, String, TripType), TaxEntry>,
}

impl TaxTable {
    /// First entry per key wins.
    pub fn insert(&mut self, route: Route, trip: TripType, entry: TaxEntry) {
        self.entries
            .entry((route.origin, route.destination, trip))
            .or_insert(entry);
    }

    pub fn get(&self, route: &Route, trip: TripType) -> Option<&TaxEntry> {
        self.entries
            .get(&(route.origin.clone(), route.destination.clone(), trip))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExchangeRates {
    rates: HashMap<String, f64>,
}

impl ExchangeRates {
    pub fn insert(&mut self, pair: impl Into<String>, rate: f64) {
        self.rates.entry(pair.into()).or_insert(rate);
    }

    /// AED per unit of `currency`. A missing pair is fatal for the run.
    pub fn to_aed(&self, currency: Currency) -> FilingResult<f64> {
        let pair = currency.aed_pair();
        self.rates
            .get(&pair)
            .copied()
            .ok_or(FilingError::MissingExchangeRate { pair })
    }
}

/// One row of the existing filed fares ("ATPCO Data") table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingFare {
    pub tariff:     String,
    pub cxr:        String,
    pub nat1:       String,
    pub nat2:       String,
    pub loc1:       String,
    pub loc2:       String,
    pub rule:       String,
    pub fare_class: String,
    pub ow_rt:      u8,
    pub rtg:        String,
    #[serde(rename = "fn")]
    pub filing_number: String,
    pub cur:        String,
    pub amount:     f64,
    pub eff_date:   NaiveDate,
    pub disc_date:  String,
    pub gfsfan:     String,
    pub rbd:        String,
    pub brand:      String,
    #[serde(default)]
    pub bag:        Option<u32>,
    #[serde(default)]
    pub base_fare:  Option<f64>,
    #[serde(default)]
    pub total_fare: Option<f64>,
}

/// Lookup key into the existing-fares table. Locations are filed codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FareKey {
    pub loc1:  String,
    pub loc2:  String,
    pub rbd:   String,
    pub brand: String,
    pub trip:  u8,
}

impl FareKey {
    /// Key for `route` with airport codes translated to filed city codes.
    pub fn new(route: &Route, rbd: &str, brand: Brand, trip: TripType) -> Self {
        Self {
            loc1:  tables::filed_location(&route.origin).to_string(),
            loc2:  tables::filed_location(&route.destination).to_string(),
            rbd:   rbd.to_string(),
            brand: brand.label().to_string(),
            trip:  trip.code(),
        }
    }

    fn of(fare: &ExistingFare) -> Self {
        Self {
            loc1:  fare.loc1.trim().to_string(),
            loc2:  fare.loc2.trim().to_string(),
            rbd:   fare.rbd.trim().to_string(),
            brand: fare.brand.trim().to_string(),
            trip:  fare.ow_rt,
        }
    }
}

/// The currently filed fares. Read-only for the core; the first row
/// matching a key is the one every lookup returns.
#[derive(Debug, Clone, Default)]
pub struct ExistingFares {
    rows:       Vec<ExistingFare>,
    by_filing:  HashMap<(FareKey, String), usize>,
    by_key:     HashMap<FareKey, usize>,
}

impl ExistingFares {
    pub fn from_rows(rows: Vec<ExistingFare>) -> Self {
        let mut fares = Self::default();
        for row in rows {
            fares.push(row);
        }
        fares
    }

    pub fn push(&mut self, fare: ExistingFare) {
        let idx = self.rows.len();
        let key = FareKey::of(&fare);
        self.by_filing
            .entry((key.clone(), fare.filing_number.trim().to_string()))
            .or_insert(idx);
        self.by_key.entry(key).or_insert(idx);
        self.rows.push(fare);
    }

    /// Entry for a key under one filing number.
    pub fn get(&self, key: &FareKey, filing_number: &str) -> Option<&ExistingFare> {
        self.by_filing
            .get(&(key.clone(), filing_number.to_string()))
            .map(|&i| &self.rows[i])
    }

    pub fn get_mut(&mut self, key: &FareKey, filing_number: &str) -> Option<&mut ExistingFare> {
        let idx = *self.by_filing.get(&(key.clone(), filing_number.to_string()))?;
        self.rows.get_mut(idx)
    }

    /// Entry for a key under any filing number (structure fares).
    pub fn get_any_filing(&self, key: &FareKey) -> Option<&ExistingFare> {
        self.by_key.get(key).map(|&i| &self.rows[i])
    }

    /// Keep only the rows `keep` accepts, re-indexing the rest.
    pub fn retain(&mut self, keep: impl FnMut(&ExistingFare) -> bool) {
        let rows = std::mem::take(&mut self.rows);
        *self = Self::from_rows(rows.into_iter().filter(keep).collect());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The "Fare Calc OD" sheet: three independent columns.
#[derive(Debug, Clone, Default)]
pub struct FareCalcOds {
    pub origins:          HashSet<String>,
    pub destinations:     HashSet<String>,
    pub all_destinations: HashSet<String>,
}

impl FareCalcOds {
    pub fn is_eligible_origin(&self, origin: &str) -> bool {
        origin == tables::ALWAYS_ELIGIBLE_ORIGIN || self.origins.contains(origin)
    }

    pub fn is_eligible_destination(&self, destination: &str) -> bool {
        self.all_destinations.contains(destination)
    }

    /// Eligible for the GDS 1 ticketing-fee waiver.
    pub fn waives_ticketing_fee(&self, route: &Route) -> bool {
        self.origins.contains(&route.origin) && self.destinations.contains(&route.destination)
    }
}

/// Discounted ticketing fee per OD ("Tfee discount" sheet).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TicketingFeeDiscount {
    pub ow: Option<f64>,
    pub rt: Option<f64>,
}

impl TicketingFeeDiscount {
    pub fn for_trip(&self, trip: TripType) -> Option<f64> {
        trip.pick(self.ow, self.rt)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TicketingFeeDiscounts {
    by_od: HashMap<String, TicketingFeeDiscount>,
}

impl TicketingFeeDiscounts {
    pub fn insert(&mut self, od: impl Into<String>, discount: TicketingFeeDiscount) {
        self.by_od.entry(od.into()).or_insert(discount);
    }

    pub fn get(&self, route: &Route) -> Option<&TicketingFeeDiscount> {
        self.by_od.get(&route.od())
    }
}

/// Restricted origins and destinations. A row is restricted when its
/// origin is on the origin list and its destination on the destination list.
#[derive(Debug, Clone, Default)]
pub struct RestrictedRoutes {
    pub origins:      HashSet<String>,
    pub destinations: HashSet<String>,
}

impl RestrictedRoutes {
    pub fn is_restricted(&self, route: &Route) -> bool {
        self.origins.contains(&route.origin) && self.destinations.contains(&route.destination)
    }
}

/// Every reference table needed for one run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub fare_levels:     FareLevelMap,
    pub taxes:           TaxTable,
    pub exchange_rates:  ExchangeRates,
    pub existing_fares:  ExistingFares,
    pub fare_calc_ods:   FareCalcOds,
    pub tfee_discounts:  TicketingFeeDiscounts,
    pub restricted:      RestrictedRoutes,
}

impl ReferenceData {
    /// Baggage allowance for one brand. Structure levels (> 8) ignore the
    /// filing number. `None` when absent or zero.
    pub fn baggage(
        &self,
        route: &Route,
        rbd: char,
        brand: Brand,
        trip: TripType,
        level: PriceLevel,
        filing_number: &FilingNumber,
    ) -> Option<u32> {
        let key = FareKey::new(route, &rbd.to_string(), brand, trip);
        let fare = if level > crate::types::MAX_FILED_LEVEL {
            self.existing_fares.get_any_filing(&key)
        } else {
            self.existing_fares.get(&key, filing_number)
        };
        fare.and_then(|f| f.bag).filter(|&bag| bag > 0)
    }

    /// Existing filing for (route, class, brand, trip) under `filing_number`.
    pub fn existing_fare(
        &self,
        route: &Route,
        rbd: &str,
        brand: Brand,
        trip: TripType,
        filing_number: &str,
    ) -> Option<&ExistingFare> {
        self.existing_fares
            .get(&FareKey::new(route, rbd, brand, trip), filing_number)
    }

    /// The GH ancillary filing of one brand, if the route carries one.
    pub fn ancillary_fare(
        &self,
        route: &Route,
        brand: Brand,
        trip: TripType,
        filing_number: &str,
    ) -> Option<&ExistingFare> {
        self.existing_fare(route, tables::ANCILLARY_FARE_CLASS, brand, trip, filing_number)
    }
}
