//! Savitzky–Golay smoothing.
//!
//! Fits a polynomial of order `polyorder` by least squares inside a sliding
//! window of odd length and replaces each point by the fitted value at the
//! window center. Samples beyond either end are taken to equal the nearest
//! edge sample.

use crate::error::{PhenologyError, Result};
use faer::linalg::solvers::Solve;
use faer::Mat;

/// A Savitzky–Golay smoothing filter with precomputed convolution weights.
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window: usize,
    polyorder: usize,
    coefficients: Vec<f64>,
}

impl SavitzkyGolay {
    /// Create a filter.
    ///
    /// # Arguments
    /// * `window` - Window length, odd and greater than `polyorder`
    /// * `polyorder` - Order of the local polynomial
    pub fn new(window: usize, polyorder: usize) -> Result<Self> {
        if window % 2 == 0 {
            return Err(PhenologyError::invalid_parameter(
                "window",
                window,
                "window length must be odd",
            ));
        }
        if polyorder >= window {
            return Err(PhenologyError::invalid_parameter(
                "polyorder",
                polyorder,
                format!("must be less than the window length {window}"),
            ));
        }

        let coefficients = smoothing_coefficients(window, polyorder)?;
        Ok(Self {
            window,
            polyorder,
            coefficients,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn polyorder(&self) -> usize {
        self.polyorder
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Smooth `data`, extending it with its edge values where the window
    /// reaches past either end.
    pub fn apply(&self, data: &[f64]) -> Vec<f64> {
        let n = data.len();
        if n == 0 {
            return vec![];
        }
        let half = (self.window / 2) as isize;
        let last = (n - 1) as isize;

        (0..n as isize)
            .map(|i| {
                self.coefficients
                    .iter()
                    .enumerate()
                    .map(|(k, c)| {
                        let j = (i + k as isize - half).clamp(0, last) as usize;
                        c * data[j]
                    })
                    .sum()
            })
            .collect()
    }
}

/// Convenience wrapper: build a filter and apply it once.
pub fn savgol_filter(data: &[f64], window: usize, polyorder: usize) -> Result<Vec<f64>> {
    Ok(SavitzkyGolay::new(window, polyorder)?.apply(data))
}

/// Weights that evaluate the local least-squares polynomial at the center.
///
/// Positions are scaled to [-1, 1]; the value at the center does not depend
/// on that scaling but the normal equations stay well conditioned for wide
/// windows.
fn smoothing_coefficients(window: usize, polyorder: usize) -> Result<Vec<f64>> {
    let half = (window / 2) as f64;
    let m = polyorder + 1;
    let positions: Vec<f64> = (0..window)
        .map(|k| {
            if half > 0.0 {
                (k as f64 - half) / half
            } else {
                0.0
            }
        })
        .collect();

    // Normal matrix A[p][q] = sum_k u_k^(p+q)
    let mut moments = vec![0.0; 2 * m - 1];
    for &u in &positions {
        for (e, moment) in moments.iter_mut().enumerate() {
            *moment += u.powi(e as i32);
        }
    }
    let normal = Mat::from_fn(m, m, |p, q| moments[p + q]);
    let rhs = Mat::from_fn(m, 1, |p, _| if p == 0 { 1.0 } else { 0.0 });
    let solution = normal.partial_piv_lu().solve(&rhs);

    let a: Vec<f64> = (0..m).map(|p| solution[(p, 0)]).collect();
    if !a.iter().all(|v| v.is_finite()) {
        return Err(PhenologyError::ComputationError(format!(
            "singular Savitzky-Golay system for window {window}, order {polyorder}"
        )));
    }

    Ok(positions
        .iter()
        .map(|&u| {
            a.iter()
                .enumerate()
                .map(|(p, ap)| ap * u.powi(p as i32))
                .sum()
        })
        .collect())
}
