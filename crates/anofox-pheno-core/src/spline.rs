//! Spline smoothing primitive.
//!
//! The boundary-padded smoother only needs "fit a smooth curve with `knots`
//! knots to this sequence and give me the fitted values back". That contract
//! is the [`SplineSmoother`] trait; [`NaturalCubicSpline`] is the default
//! implementation.

use crate::error::{PhenologyError, Result};
use anofox_regression::prelude::*;

/// A smoothing method parameterized by a knot count.
///
/// Implementations must be deterministic and return a sequence of the same
/// length as the input.
pub trait SplineSmoother {
    fn fit(&self, values: &[f64], knots: usize) -> Result<Vec<f64>>;
}

/// Natural cubic regression spline with evenly spaced knots.
///
/// The sequence is placed on [0, 1] and regressed by ordinary least squares
/// on the natural cubic spline basis (linear term plus K-2 truncated-power
/// differences), with an intercept. K knots give K degrees of freedom; the
/// curve is linear beyond the boundary knots.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalCubicSpline;

impl SplineSmoother for NaturalCubicSpline {
    fn fit(&self, values: &[f64], knots: usize) -> Result<Vec<f64>> {
        if knots == 0 {
            return Err(PhenologyError::invalid_parameter(
                "knots",
                knots,
                "must be positive",
            ));
        }
        let n = values.len();
        if n < knots + 1 {
            return Err(PhenologyError::InsufficientData {
                needed: knots + 1,
                got: n,
            });
        }

        let basis = natural_spline_basis(n, knots);
        let k = basis.len();

        let x_mat = faer::Mat::from_fn(n, k, |i, j| basis[j][i]);
        let y_col = faer::Col::from_fn(n, |i| values[i]);

        let fitted = match OlsRegressor::builder()
            .with_intercept(true)
            .build()
            .fit(&x_mat, &y_col)
        {
            Ok(f) => f,
            Err(_) => {
                return Err(PhenologyError::ComputationError(format!(
                    "spline regression failed (n={n}, knots={knots})"
                )))
            }
        };

        let predictions = fitted.predict(&x_mat);
        Ok((0..n).map(|i| predictions[i]).collect())
    }
}

/// Natural cubic spline basis columns for `n` evenly spaced points on [0, 1].
///
/// Column 0 is `x`; column `k + 1` is `d_k(x) - d_{K-2}(x)` with
/// `d_k(x) = ((x - ξ_k)+³ - (x - ξ_{K-1})+³) / (ξ_{K-1} - ξ_k)`.
/// The intercept is left to the regression.
pub fn natural_spline_basis(n: usize, knots: usize) -> Vec<Vec<f64>> {
    let xs: Vec<f64> = (0..n)
        .map(|i| if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 })
        .collect();

    let mut columns = vec![xs.clone()];
    if knots < 3 {
        return columns;
    }

    let xi: Vec<f64> = (0..knots)
        .map(|k| k as f64 / (knots - 1) as f64)
        .collect();
    let last = xi[knots - 1];
    let cube_plus = |v: f64| if v > 0.0 { v * v * v } else { 0.0 };
    let d = |k: usize, x: f64| (cube_plus(x - xi[k]) - cube_plus(x - last)) / (last - xi[k]);

    for k in 0..knots - 2 {
        columns.push(xs.iter().map(|&x| d(k, x) - d(knots - 2, x)).collect());
    }
    columns
}
