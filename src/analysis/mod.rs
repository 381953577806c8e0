//! Baseline fitting and incident deviation.

pub mod aggregate;
pub mod deviation;
pub mod fit;
pub mod window;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::ingest::Observation;

pub use aggregate::{across_countries, BucketTotals, Totals};
pub use deviation::{process, CountrySelection, Deviation};
pub use fit::{FitError, QuadraticFit};
pub use window::TimeWindow;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("cannot fit {metric} baseline for {selection}")]
    Fit {
        selection: String,
        metric: Metric,
        #[source]
        source: FitError,
    },
}

/// The two series fitted for every selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Count,
    Amount,
}

impl Metric {
    pub fn value(self, obs: &Observation) -> i64 {
        match self {
            Metric::Count => obs.payment_count,
            Metric::Amount => obs.total_amount,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Count => write!(f, "count"),
            Metric::Amount => write!(f, "amount"),
        }
    }
}
