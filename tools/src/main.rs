//! filing-runner: headless batch runner for the fare filing engine.
//!
//! Usage:
//!   filing-runner --data-dir ./data --db output.db
//!   filing-runner --input ./data/input/batch.json --filing-date 2026-10-17

use anyhow::{Context, Result};
use chrono::NaiveDate;
use fare_filing_core::{
    config::InputBatch,
    filing_engine::{BatchReport, FilingEngine},
    reference::ReferenceData,
    store::FilingStore,
    types::new_run_id,
};
use std::collections::BTreeMap;
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir = string_arg(&args, "--data-dir").unwrap_or_else(|| "./data".to_string());
    let input = string_arg(&args, "--input")
        .unwrap_or_else(|| format!("{data_dir}/input/batch.json"));
    let db = string_arg(&args, "--db").unwrap_or_else(|| "output.db".to_string());
    let filing_date = match string_arg(&args, "--filing-date") {
        Some(date) => NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .with_context(|| format!("--filing-date {date}: expected YYYY-MM-DD"))?,
        None => chrono::Local::now().date_naive(),
    };

    println!("Fare filing: filing-runner");
    println!("  data_dir:     {data_dir}");
    println!("  input:        {input}");
    println!("  db:           {db}");
    println!("  filing date:  {filing_date}");
    println!();

    let reference = ReferenceData::load(&data_dir)?;
    let batch = InputBatch::load(&input)?;

    let store = FilingStore::open(&db)?;
    store.migrate()?;

    let mut engine = FilingEngine::new(new_run_id(), reference, filing_date, store);
    let report = engine.process_batch(&batch)?;
    log::info!("filing-runner: run {} written to {db}", report.run_id);
    print_summary(&report);

    Ok(())
}

fn print_summary(report: &BatchReport) {
    let mut by_status: BTreeMap<&str, usize> = BTreeMap::new();
    for status in &report.statuses {
        *by_status.entry(status.as_str()).or_default() += 1;
    }

    println!("=== RUN SUMMARY ===");
    println!("  run_id:          {}", report.run_id);
    println!("  input rows:      {}", report.statuses.len());
    println!("  FILE rows:       {}", report.output.file.len());
    println!("  DELETE rows:     {}", report.output.deletions.len());
    println!("  GH rows:         {}", report.output.ancillary.len());
    println!("  duplicate FBCs:  {}", report.duplicates.len());

    println!();
    println!("=== COMPLETED ===");
    for (status, count) in &by_status {
        println!("  {count:>4}  {status}");
    }
    for &idx in &report.duplicates {
        if let Some(row) = report.output.file.get(idx) {
            println!("  Not OK: FILE row {} {}", idx + 1, row.fbc);
        }
    }
}

fn string_arg(args: &[String], flag: &str) -> Option<String> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].clone())
}
