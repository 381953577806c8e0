//! Least-squares quadratic baseline.
//!
//! Epoch seconds squared sit around 1e18, so fitting in raw time destroys the
//! normal equations. Both axes are mean-centred and time is scaled into
//! [-1, 1] before solving. The fitted curve is still the ordinary
//! least-squares quadratic in the original variables.

use serde::Serialize;
use thiserror::Error;

/// Distinct abscissae needed for a determined degree-2 fit.
pub const MIN_DISTINCT_POINTS: usize = 3;

const DEGREE: usize = 2;
const TERMS: usize = DEGREE + 1;

#[derive(Debug, Error, PartialEq)]
pub enum FitError {
    #[error("insufficient baseline data: need {needed} distinct timestamps, have {have}")]
    InsufficientPoints { needed: usize, have: usize },

    #[error("normal equations are singular (pivot {pivot:e} in column {column})")]
    Singular { column: usize, pivot: f64 },

    #[error("non-finite input at index {index}")]
    NonFinite { index: usize },
}

/// `y = c0 + c1*u + c2*u^2 + y_mean` where `u = (t - t_mean) / t_scale`.
#[derive(Debug, Clone, Serialize)]
pub struct QuadraticFit {
    coefficients: [f64; TERMS],
    t_mean: f64,
    t_scale: f64,
    y_mean: f64,
    points: usize,
}

impl QuadraticFit {
    pub fn fit(points: &[(f64, f64)]) -> Result<Self, FitError> {
        if let Some(index) = points
            .iter()
            .position(|(t, y)| !t.is_finite() || !y.is_finite())
        {
            return Err(FitError::NonFinite { index });
        }

        let distinct = count_distinct(points.iter().map(|(t, _)| *t));
        if distinct < MIN_DISTINCT_POINTS {
            return Err(FitError::InsufficientPoints {
                needed: MIN_DISTINCT_POINTS,
                have: distinct,
            });
        }

        let n = points.len() as f64;
        let t_mean = points.iter().map(|(t, _)| t).sum::<f64>() / n;
        let y_mean = points.iter().map(|(_, y)| y).sum::<f64>() / n;
        let t_scale = points
            .iter()
            .map(|(t, _)| (t - t_mean).abs())
            .fold(0.0_f64, f64::max);

        // Gram matrix of [1, u, u^2] and the projection of centred y onto it.
        let mut gram = [[0.0_f64; TERMS]; TERMS];
        let mut rhs = [0.0_f64; TERMS];
        for (t, y) in points {
            let u = (t - t_mean) / t_scale;
            let powers = [1.0, u, u * u];
            let dy = y - y_mean;
            for i in 0..TERMS {
                rhs[i] += powers[i] * dy;
                for j in 0..TERMS {
                    gram[i][j] += powers[i] * powers[j];
                }
            }
        }

        let coefficients = solve(gram, rhs)?;
        Ok(Self {
            coefficients,
            t_mean,
            t_scale,
            y_mean,
            points: points.len(),
        })
    }

    /// Estimated value at `t` seconds since the epoch. Valid outside the
    /// range of fitted timestamps.
    pub fn predict(&self, t: f64) -> f64 {
        let u = (t - self.t_mean) / self.t_scale;
        let [c0, c1, c2] = self.coefficients;
        self.y_mean + (c0 + u * (c1 + u * c2))
    }

    /// Number of points the model was fitted on.
    pub fn points(&self) -> usize {
        self.points
    }
}

fn count_distinct(values: impl Iterator<Item = f64>) -> usize {
    let mut sorted: Vec<f64> = values.collect();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: [[f64; TERMS]; TERMS], mut b: [f64; TERMS]) -> Result<[f64; TERMS], FitError> {
    let magnitude = a
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let tolerance = magnitude * 1e-12;

    for col in 0..TERMS {
        let pivot_row = (col..TERMS)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        let pivot = a[pivot_row][col];
        if pivot.abs() <= tolerance {
            return Err(FitError::Singular { column: col, pivot });
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..TERMS {
            let factor = a[row][col] / a[col][col];
            for k in col..TERMS {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0_f64; TERMS];
    for row in (0..TERMS).rev() {
        let tail: f64 = (row + 1..TERMS).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}
