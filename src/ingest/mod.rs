//! CSV ingest: turns the warehouse export into typed observations.
//!
//! The export is already deduplicated and bucketed upstream, so this layer is
//! strict. The first malformed row aborts the whole load.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// Number of columns in every data row: country, bucket, count, amount.
pub const FIELD_COUNT: usize = 4;

// `%.f` is optional when parsing, so these also accept fractional seconds.
// `%#z` takes `+00`, `+0000` and `+00:00`.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: unparsable timestamp {value:?}")]
    Timestamp { line: usize, value: String },

    #[error("line {line}: {field} {value:?} is not an integer: {source}")]
    Integer {
        line: usize,
        field: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// One pre-aggregated bucket for one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    /// Two-letter country code; empty for the synthetic all-countries series.
    pub country_code: String,
    pub timestamp: DateTime<Utc>,
    pub payment_count: i64,
    /// Summed amount in minor currency units (cents).
    pub total_amount: i64,
}

impl Observation {
    /// Seconds since the Unix epoch, the independent variable of the fit.
    pub fn epoch_seconds(&self) -> f64 {
        epoch_seconds(&self.timestamp)
    }
}

pub fn epoch_seconds(t: &DateTime<Utc>) -> f64 {
    t.timestamp() as f64 + f64::from(t.timestamp_subsec_nanos()) * 1e-9
}

/// Parse a bucket timestamp such as `2022-07-15 17:00:00+00`.
///
/// Returns `None` when no supported layout matches.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| DateTime::<FixedOffset>::parse_from_str(value, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(value).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse one data row. `line` is only used for error messages.
pub fn parse_row<S: AsRef<str>>(line: usize, fields: &[S]) -> Result<Observation, IngestError> {
    if fields.len() != FIELD_COUNT {
        return Err(IngestError::FieldCount {
            line,
            expected: FIELD_COUNT,
            found: fields.len(),
        });
    }

    let raw_ts = fields[1].as_ref();
    let timestamp = parse_timestamp(raw_ts).ok_or_else(|| IngestError::Timestamp {
        line,
        value: raw_ts.to_string(),
    })?;

    Ok(Observation {
        country_code: fields[0].as_ref().trim().to_string(),
        timestamp,
        payment_count: parse_int(line, "count", fields[2].as_ref())?,
        total_amount: parse_int(line, "amount", fields[3].as_ref())?,
    })
}

fn parse_int(line: usize, field: &'static str, value: &str) -> Result<i64, IngestError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|source| IngestError::Integer {
            line,
            field,
            value: value.to_string(),
            source,
        })
}

/// Parse data rows that followed a header line, preserving order.
pub fn parse_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Vec<Observation>, IngestError> {
    rows.iter()
        .enumerate()
        .map(|(idx, fields)| parse_row(idx + 2, fields))
        .collect()
}

/// Read and parse the export at `path`, skipping its header row.
pub fn load_csv(path: &Path) -> Result<Vec<Observation>, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut observations = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(observations.len() + 2);
        let fields: Vec<&str> = record.iter().collect();
        observations.push(parse_row(line, &fields)?);
    }

    info!(path = %path.display(), rows = observations.len(), "Loaded payment buckets");
    debug!(
        first = ?observations.first().map(|o| o.timestamp),
        last = ?observations.last().map(|o| o.timestamp),
        "Bucket range in file order"
    );
    Ok(observations)
}
