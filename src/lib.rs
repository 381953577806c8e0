//! sevimpact -- estimate payments lost to a SEV against a best-fit baseline.
//!
//! This crate loads a bucketed payments export, fits a quadratic baseline
//! outside the incident window per country and across all countries, and
//! totals the deviation inside the window.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod report;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::{info, warn};

use analysis::CountrySelection;
use config::AnalysisConfig;
use ingest::Observation;
use report::ImpactReport;

/// Run the full analysis described by `config`.
pub fn run(config: &AnalysisConfig) -> Result<ImpactReport> {
    let windows = config.validate().context("invalid configuration")?;

    info!(path = %config.input_path.display(), "Loading payments export");
    let data = ingest::load_csv(&config.input_path)
        .with_context(|| format!("failed to load {}", config.input_path.display()))?;

    let present = country_buckets(&data);
    info!(countries = present.len(), rows = data.len(), "Export summary");
    for code in &config.countries {
        if !present.contains_key(code) {
            warn!(country = %code, "Configured country has no rows in the export");
        }
    }
    let outside = data
        .iter()
        .filter(|obs| !windows.data.contains(&obs.timestamp))
        .count();
    if outside > 0 {
        warn!(rows = outside, "Rows fall outside the configured data window");
    }

    let mut countries = Vec::with_capacity(config.countries.len());
    for code in &config.countries {
        let deviation = analysis::process(&data, &CountrySelection::single(code), &windows.sev)?;
        info!(
            country = %code,
            count_diff = deviation.count_diff,
            amount_diff = deviation.amount_diff,
            "Country deviation"
        );
        countries.push(deviation);
    }

    let merged = analysis::across_countries(&data);
    let total = analysis::process(&merged, &CountrySelection::all(), &windows.sev)?;
    info!(
        count_diff = total.count_diff,
        amount_diff = total.amount_diff,
        "Total deviation"
    );

    Ok(ImpactReport {
        data_window: config.data_window.clone(),
        sev_window: config.sev_window.clone(),
        countries_present: present,
        countries,
        total,
    })
}

/// Distinct country codes with the number of buckets each contributes.
pub fn country_buckets(data: &[Observation]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for obs in data {
        *counts.entry(obs.country_code.clone()).or_insert(0) += 1;
    }
    counts
}
