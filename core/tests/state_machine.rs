//! Filing state machine: AMEND at the filed level, moving down, moving up,
//! and structure levels. All figures use the DOH-DXB one-way test fixture:
//! fixed tax 50, YQ 30, discounted ticketing fee 10, QAR at 1 AED.

use fare_filing_core::{
    config::{BatchHeader, InputBatch, InputRow},
    filing_engine::{BatchReport, FilingEngine},
    output::FilingAction,
    reference::FareKey,
    types::{Brand, Route, TripType},
};

fn engine(run_id: &str) -> FilingEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    FilingEngine::build_test(run_id.into()).unwrap()
}

fn run(engine: &mut FilingEngine, rows: Vec<InputRow>) -> BatchReport {
    let batch = InputBatch { header: BatchHeader::default_test(), rows };
    engine.process_batch(&batch).unwrap()
}

fn set_existing_base(engine: &mut FilingEngine, rbd: &str, brand: Brand, base: f64) {
    let key = FareKey::new(&Route::new("DOH", "DXB"), rbd, brand, TripType::OneWay);
    let fare = engine.reference.existing_fares.get_mut(&key, "F1").unwrap();
    fare.base_fare = Some(base);
}

fn fares(report: &BatchReport) -> Vec<(f64, f64)> {
    report.output.file.iter().map(|r| (r.base_fare, r.total_fare)).collect()
}

// ── F == N ───────────────────────────────────────────────────────────────────

#[test]
fn same_level_amends_all_five_tiers() {
    let mut engine = engine("sm-amend");
    let report = run(&mut engine, vec![InputRow::new("DOH", "DXB", 1, "H", "QAR", 550.0)]);

    assert_eq!(report.statuses, vec!["YES"]);
    assert!(report.output.deletions.is_empty());
    assert_eq!(report.output.file.len(), 5);
    assert!(report.output.file.iter().all(|r| r.action == FilingAction::Amend && r.rbd == 'H'));
    assert_eq!(
        fares(&report),
        vec![(470.0, 550.0), (500.0, 580.0), (520.0, 610.0), (630.0, 710.0), (693.0, 783.0)]
    );

    let fbcs: Vec<&str> = report.output.file.iter().map(|r| r.fbc.as_str()).collect();
    assert_eq!(
        fbcs,
        vec![
            "DOHDXBHO6QA5-F1",
            "DOHDXBHOB7QA5-F1",
            "DOHDXBHOLP7QA1-F1",
            "DOHDXBHOL8QA5-F1",
            "DOHDXBHOXP3QA1-F1",
        ]
    );
    let channels: Vec<&str> = report.output.file.iter().map(|r| r.channel.as_str()).collect();
    assert_eq!(channels, vec!["WEB", "WEB", "GDS", "WEB", "GDS"]);
    assert_eq!(report.output.file[0].filing_date, "17-10-26");
}

#[test]
fn same_level_with_unchanged_fare_files_nothing() {
    let mut engine = engine("sm-same-fare");
    set_existing_base(&mut engine, "H", Brand::Brand1, 470.0);
    let report = run(&mut engine, vec![InputRow::new("DOH", "DXB", 1, "H", "QAR", 550.0)]);

    assert_eq!(report.statuses, vec!["not amended as same fare"]);
    assert!(report.output.file.is_empty());
    assert!(report.output.ancillary.is_empty());
}

#[test]
fn tier_matching_its_filed_base_is_nudged_by_one() {
    let mut engine = engine("sm-nudge");
    set_existing_base(&mut engine, "H", Brand::Brand2, 500.0);
    let report = run(&mut engine, vec![InputRow::new("DOH", "DXB", 1, "H", "QAR", 550.0)]);

    assert_eq!(report.statuses, vec!["YES"]);
    let f = fares(&report);
    assert_eq!(f[0], (470.0, 550.0));
    assert_eq!(f[1], (501.0, 581.0));
    // Later tiers price off the nudged Brand 2.
    assert_eq!(f[2], (521.0, 611.0));
    assert_eq!(f[3], (631.0, 711.0));
    assert_eq!(f[4], (695.0, 785.0));

    let events = engine.store.events_for_row("sm-nudge", 1).unwrap();
    assert!(events.iter().any(|e| e.event_type == "same_fare_nudged"));
}

// ── F > N ────────────────────────────────────────────────────────────────────

#[test]
fn moving_down_deletes_intermediate_levels_then_files_new() {
    let mut engine = engine("sm-down");
    // Filed at U (5); 500 QAR resolves to Q (2).
    let report = run(&mut engine, vec![InputRow::new("DOH", "DXB", 1, "U", "QAR", 500.0)]);

    assert_eq!(report.statuses, vec!["YES"]);

    let deleted: Vec<&str> = report
        .output
        .deletions
        .iter()
        .map(|d| d.filed.fare_class.as_str())
        .collect();
    assert_eq!(
        deleted,
        vec!["KO1", "KO2", "KO4", "KO3", "KO5", "HO1", "HO2", "HO4", "HO3", "HO5"]
    );
    assert_eq!(report.output.deletions[0].amount, 400.0);
    assert_eq!(report.output.deletions[0].filed.eff_date, "01/01/26");

    assert_eq!(report.output.file.len(), 5);
    assert!(report.output.file.iter().all(|r| r.action == FilingAction::New && r.rbd == 'Q'));
    assert_eq!(
        fares(&report),
        vec![(420.0, 500.0), (440.0, 520.0), (460.0, 550.0), (570.0, 650.0), (630.0, 720.0)]
    );

    let gh: Vec<f64> = report.output.ancillary.iter().map(|a| a.new_amount).collect();
    assert_eq!(gh, vec![440.0, 460.0]);
}

#[test]
fn one_level_down_deletes_nothing() {
    let mut engine = engine("sm-down-one");
    // Filed at K (4); 550 QAR resolves to H (3).
    let report = run(&mut engine, vec![InputRow::new("DOH", "DXB", 1, "K", "QAR", 550.0)]);
    assert_eq!(report.statuses, vec!["YES"]);
    assert!(report.output.deletions.is_empty());
    assert!(report.output.file.iter().all(|r| r.action == FilingAction::New && r.rbd == 'H'));
}

// ── F < N ────────────────────────────────────────────────────────────────────

#[test]
fn moving_up_deletes_from_filed_level_then_amends() {
    let mut engine = engine("sm-up");
    // Filed at Q (2); 630 QAR resolves to K (4).
    let report = run(&mut engine, vec![InputRow::new("DOH", "DXB", 1, "Q", "QAR", 630.0)]);

    assert_eq!(report.statuses, vec!["YES"]);
    let deleted_classes: Vec<char> = report
        .output
        .deletions
        .iter()
        .filter_map(|d| d.filed.fare_class.chars().next())
        .collect();
    assert_eq!(deleted_classes, vec!['Q', 'Q', 'Q', 'Q', 'Q', 'H', 'H', 'H', 'H', 'H']);

    assert_eq!(report.output.file.len(), 5);
    assert!(report.output.file.iter().all(|r| r.action == FilingAction::Amend && r.rbd == 'K'));
    assert_eq!(report.output.file[0].base_fare, 550.0);
    assert_eq!(report.output.file[0].total_fare, 630.0);
}

#[test]
fn moving_up_next_to_an_existing_fare_nudges_by_currency_step() {
    let mut engine = engine("sm-up-near");
    set_existing_base(&mut engine, "K", Brand::Brand1, 551.0);
    let report = run(&mut engine, vec![InputRow::new("DOH", "DXB", 1, "Q", "QAR", 630.0)]);

    assert_eq!(report.statuses, vec!["YES"]);
    assert_eq!(report.output.file[0].base_fare, 560.0);
    assert_eq!(report.output.file[0].total_fare, 640.0);

    let events = engine.store.events_for_row("sm-up-near", 1).unwrap();
    assert!(events.iter().any(|e| e.event_type == "near_duplicate_nudged"));
}

#[test]
fn moving_up_to_a_level_with_no_filing_is_noted() {
    let mut engine = engine("sm-up-missing");
    engine
        .reference
        .existing_fares
        .retain(|f| !(f.loc2 == "DXB" && f.rbd == "K" && f.brand == "Brand 1" && f.ow_rt == 1));
    let report = run(&mut engine, vec![InputRow::new("DOH", "DXB", 1, "Q", "QAR", 630.0)]);

    assert_eq!(report.statuses, vec!["YES//not amended as no existing fare"]);
    assert_eq!(report.output.deletions.len(), 10);
    assert!(report.output.file.is_empty());
}

// ── Structure levels ─────────────────────────────────────────────────────────

#[test]
fn structure_level_on_both_sides_files_nothing() {
    let mut engine = engine("sm-structure");
    // M is level 9; 1250 QAR resolves to M.
    let report = run(&mut engine, vec![InputRow::new("DOH", "DXB", 1, "M", "QAR", 1250.0)]);
    assert_eq!(report.statuses, vec!["structure RBD"]);
    assert!(report.output.file.is_empty());
    assert!(report.output.deletions.is_empty());
}

#[test]
fn structure_target_level_is_annotated_after_yes() {
    let mut engine = engine("sm-structure-up");
    // T is level 10 (clamped to 9); 1500 QAR resolves to T.
    let report = run(&mut engine, vec![InputRow::new("DOH", "DXB", 1, "T", "QAR", 1500.0)]);
    assert_eq!(report.statuses, vec!["YES//structure RBD"]);
    assert!(report.output.file.is_empty());
}

#[test]
fn structure_filed_level_moving_down_deletes_from_level_8() {
    let mut engine = engine("sm-structure-down");
    // T is clamped to 9; 550 QAR resolves to H (3): levels 8..=4 are deleted.
    let report = run(&mut engine, vec![InputRow::new("DOH", "DXB", 1, "T", "QAR", 550.0)]);
    assert_eq!(report.statuses, vec!["YES//structure RBD"]);
    assert_eq!(report.output.deletions.len(), 25);
    assert_eq!(report.output.deletions[0].filed.fare_class, "NO1");
    assert!(report.output.file.iter().all(|r| r.action == FilingAction::New && r.rbd == 'H'));
}

// ── Ticketing fee ────────────────────────────────────────────────────────────

#[test]
fn above_level_5_gds_1_charges_the_tax_table_fee() {
    let mut engine = engine("sm-yr");
    // DOH-CAI: fixed tax 40, YQ 25, YR 15, no discount row, not waivable.
    // 790 QAR resolves to B (6).
    let report = run(&mut engine, vec![InputRow::new("DOH", "CAI", 1, "B", "QAR", 790.0)]);
    assert_eq!(report.statuses, vec!["YES"]);
    let f = fares(&report);
    assert_eq!(f[0], (725.0, 790.0));
    assert_eq!(f[1], (755.0, 820.0));
    assert_eq!(f[2], (785.0, 865.0));
}

#[test]
fn airport_codes_are_filed_under_city_codes() {
    let mut engine = engine("sm-alias");
    // DOH-SAW is filed as DOH-IST; 640 QAR resolves to K (4).
    let report = run(&mut engine, vec![InputRow::new("DOH", "SAW", 1, "K", "QAR", 640.0)]);
    assert_eq!(report.statuses, vec!["YES"]);
    assert_eq!(report.output.file[0].fbc, "DOHSAWKO6QA5-F1");
    assert_eq!(report.output.ancillary.len(), 2);
    assert!(report.output.ancillary.iter().all(|a| a.filed.loc2 == "IST"));
}

#[test]
fn low_value_currency_prices_in_its_own_units() {
    let mut engine = engine("sm-bhd");
    // BAH-DXB: fixed tax 5, YQ 3, discounted fee 1, BHD at 10 AED.
    let report = run(&mut engine, vec![InputRow::new("BAH", "DXB", 1, "H", "BHD", 55.0)]);
    assert_eq!(report.statuses, vec!["YES"]);
    assert_eq!(
        fares(&report),
        vec![(47.0, 55.0), (50.0, 58.0), (52.0, 61.0), (63.0, 71.0), (70.0, 79.0)]
    );
    assert_eq!(report.output.file[0].fbc, "BAHDXBHO6BH5-F1");
    let gh: Vec<f64> = report.output.ancillary.iter().map(|a| a.new_amount).collect();
    assert_eq!(gh, vec![49.0, 52.0]);
}
