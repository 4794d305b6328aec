//! GH ancillary amendments: which brands are amended, with what amount,
//! and under which state-machine branches.

use fare_filing_core::{
    config::{BatchHeader, InputBatch, InputRow},
    filing_engine::{BatchReport, FilingEngine},
    reference::FareKey,
    types::{Brand, Route, TripType},
};

fn run(run_id: &str, rows: Vec<InputRow>) -> BatchReport {
    let mut engine = FilingEngine::build_test(run_id.into()).unwrap();
    let batch = InputBatch { header: BatchHeader::default_test(), rows };
    engine.process_batch(&batch).unwrap()
}

#[test]
fn amend_re_files_gh_for_brands_that_carry_one() {
    let report = run("gh-amend", vec![InputRow::new("DOH", "DXB", 1, "H", "QAR", 550.0)]);

    // The fixture files GH for Brand 1 and Brand 2 only.
    assert_eq!(report.output.ancillary.len(), 2);
    let rows: Vec<(&str, f64)> = report
        .output
        .ancillary
        .iter()
        .map(|a| (a.filed.fare_class.as_str(), a.new_amount))
        .collect();
    assert_eq!(rows, vec![("GHO1", 490.0), ("GHO2", 520.0)]);
    assert!(report.output.ancillary.iter().all(|a| a.action == "Amend Fare"));
    assert_eq!(report.output.ancillary[0].filed.eff_date, "01/01/26");
    assert_eq!(report.output.ancillary[0].filed.disc_date, "INF");
}

#[test]
fn round_trip_increment_is_doubled() {
    // DOH-DXB RT: fixed tax 100, YQ 60. 970 QAR -> 870 AED -> K (4), filed at K.
    let report = run("gh-rt", vec![InputRow::new("DOH", "DXB", 2, "K", "QAR", 970.0)]);
    assert_eq!(report.statuses, vec!["YES"]);
    let brand1_base = report.output.file[0].base_fare;
    assert_eq!(brand1_base, 810.0);
    assert_eq!(report.output.ancillary[0].new_amount, brand1_base + 40.0);
    assert_eq!(report.output.ancillary[0].filed.fare_class, "GHR1");
}

#[test]
fn brand_3_gh_follows_brand_3_not_gds_1() {
    let mut engine = FilingEngine::build_test("gh-brand3".into()).unwrap();
    // Re-label the Brand 2 GH filing as Brand 3.
    let route = Route::new("DOH", "DXB");
    let mut gh = engine
        .reference
        .existing_fares
        .get(&FareKey::new(&route, "GH", Brand::Brand2, TripType::OneWay), "F1")
        .unwrap()
        .clone();
    gh.brand = Brand::Brand3.label().into();
    gh.fare_class = "GHO4".into();
    engine.reference.existing_fares.push(gh);

    let batch = InputBatch {
        header: BatchHeader::default_test(),
        rows:   vec![InputRow::new("DOH", "DXB", 1, "H", "QAR", 550.0)],
    };
    let report = engine.process_batch(&batch).unwrap();
    let brand3_row = report
        .output
        .ancillary
        .iter()
        .find(|a| a.filed.fare_class == "GHO4")
        .unwrap();
    // Brand 3 base 630 + 20.
    assert_eq!(brand3_row.new_amount, 650.0);
}

#[test]
fn same_fare_skips_the_gh_pass() {
    let mut engine = FilingEngine::build_test("gh-same".into()).unwrap();
    let key = FareKey::new(&Route::new("DOH", "DXB"), "H", Brand::Brand1, TripType::OneWay);
    engine.reference.existing_fares.get_mut(&key, "F1").unwrap().base_fare = Some(470.0);
    let batch = InputBatch {
        header: BatchHeader::default_test(),
        rows:   vec![InputRow::new("DOH", "DXB", 1, "H", "QAR", 550.0)],
    };
    let report = engine.process_batch(&batch).unwrap();
    assert!(report.output.ancillary.is_empty());
}

#[test]
fn route_without_gh_filings_amends_nothing() {
    let mut engine = FilingEngine::build_test("gh-none".into()).unwrap();
    engine.reference.existing_fares.retain(|f| f.rbd != "GH");
    let batch = InputBatch {
        header: BatchHeader::default_test(),
        rows:   vec![InputRow::new("DOH", "DXB", 1, "H", "QAR", 550.0)],
    };
    let report = engine.process_batch(&batch).unwrap();
    assert_eq!(report.statuses, vec!["YES"]);
    assert_eq!(report.output.file.len(), 5);
    assert!(report.output.ancillary.is_empty());
}
