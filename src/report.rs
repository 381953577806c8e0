//! Report assembly and plain-text rendering.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::analysis::Deviation;
use crate::config::WindowConfig;

/// Everything printed by a report run.
#[derive(Debug, Clone, Serialize)]
pub struct ImpactReport {
    pub data_window: WindowConfig,
    pub sev_window: WindowConfig,
    /// Buckets per country code found in the export.
    pub countries_present: BTreeMap<String, usize>,
    pub countries: Vec<Deviation>,
    pub total: Deviation,
}

impl ImpactReport {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push('\n');
        out.push_str("Estimated loss in payments as compared to a best-fit regression\n");
        out.push_str("Data fetched from BigQuery\n");
        out.push('\n');
        let _ = writeln!(
            out,
            "Data from {} to {}",
            self.data_window.start, self.data_window.end
        );
        let _ = writeln!(
            out,
            " SEV from {} to {}",
            self.sev_window.start, self.sev_window.end
        );
        out.push('\n');

        for deviation in &self.countries {
            out.push_str(&format_line(deviation));
            out.push('\n');
        }

        out.push('\n');
        out.push_str("Total:\n");
        out.push_str(&format_line(&self.total));
        out.push('\n');
        out
    }
}

/// `{'US'} ## Count Diff:    1,234, Amount Diff:       56,789.01`
pub fn format_line(deviation: &Deviation) -> String {
    format!(
        "{:6} ## Count Diff: {:>8}, Amount Diff: {:>15}",
        deviation.label,
        group_int(deviation.count_diff),
        group_float(deviation.amount_diff as f64 / 100.0),
    )
}

/// Decimal digits with a comma every three places.
pub fn group_int(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Shortest round-trip form with a grouped integer part. Whole numbers keep
/// a trailing `.0`.
pub fn group_float(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let repr = value.to_string();
    let (int_part, frac_part) = repr.split_once('.').unwrap_or((repr.as_str(), "0"));
    let (sign, int_digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::from(sign);
    for (i, ch) in int_digits.chars().enumerate() {
        if i > 0 && (int_digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped.push('.');
    grouped.push_str(frac_part);
    grouped
}
