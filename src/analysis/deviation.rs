use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

use crate::analysis::fit::QuadraticFit;
use crate::analysis::window::TimeWindow;
use crate::analysis::{AnalysisError, Metric};
use crate::ingest::Observation;

/// Countries to include in a run. Empty selects every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CountrySelection(BTreeSet<String>);

impl CountrySelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn single(code: &str) -> Self {
        Self(BTreeSet::from([code.to_string()]))
    }

    pub fn matches(&self, obs: &Observation) -> bool {
        self.0.is_empty() || self.0.contains(&obs.country_code)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for CountrySelection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Set-literal form: `{'US'}`, `{'CA', 'US'}`, `{}`.
impl fmt::Display for CountrySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self
            .0
            .iter()
            .map(|c| format!("'{c}'"))
            .collect::<Vec<_>>()
            .join(", ");
        f.pad(&format!("{{{inner}}}"))
    }
}

/// Cumulative `expected - observed` over the incident window.
/// Positive values mean payments were lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deviation {
    pub label: String,
    pub count_diff: i64,
    /// Minor currency units.
    pub amount_diff: i64,
    pub incident_rows: usize,
    pub baseline_rows: usize,
}

/// Fit baselines outside `sev` and total the deviation inside it.
pub fn process(
    data: &[Observation],
    selection: &CountrySelection,
    sev: &TimeWindow,
) -> Result<Deviation, AnalysisError> {
    let label = selection.to_string();
    let (incident, baseline): (Vec<&Observation>, Vec<&Observation>) = data
        .iter()
        .filter(|obs| selection.matches(obs))
        .partition(|obs| sev.contains(&obs.timestamp));

    debug!(
        selection = %label,
        incident = incident.len(),
        baseline = baseline.len(),
        "Partitioned rows"
    );

    let count_model = fit_metric(&baseline, Metric::Count, &label)?;
    let amount_model = fit_metric(&baseline, Metric::Amount, &label)?;

    let mut count_diff = 0_i64;
    let mut amount_diff = 0_i64;
    for obs in &incident {
        let t = obs.epoch_seconds();
        let expected_count = truncate(count_model.predict(t));
        let expected_amount = truncate(amount_model.predict(t));
        let row_count_diff = expected_count - obs.payment_count;
        let row_amount_diff = expected_amount - obs.total_amount;
        trace!(timestamp = %obs.timestamp, row_count_diff, row_amount_diff, "Incident bucket");
        count_diff += row_count_diff;
        amount_diff += row_amount_diff;
    }

    Ok(Deviation {
        label,
        count_diff,
        amount_diff,
        incident_rows: incident.len(),
        baseline_rows: baseline.len(),
    })
}

fn fit_metric(
    rows: &[&Observation],
    metric: Metric,
    label: &str,
) -> Result<QuadraticFit, AnalysisError> {
    let points: Vec<(f64, f64)> = rows
        .iter()
        .map(|obs| (obs.epoch_seconds(), metric.value(obs) as f64))
        .collect();
    QuadraticFit::fit(&points).map_err(|source| AnalysisError::Fit {
        selection: label.to_string(),
        metric,
        source,
    })
}

/// Toward zero, like an integer cast. Rounding would change published totals.
fn truncate(estimate: f64) -> i64 {
    estimate.trunc() as i64
}
