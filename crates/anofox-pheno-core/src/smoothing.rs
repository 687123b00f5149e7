//! Boundary-padded, year-by-year smoothing.
//!
//! Each calendar year is smoothed on its own, but with 20 days borrowed from
//! the neighboring years on both sides so the spline has support past
//! January 1 and December 31. The borrowed days are trimmed off again, so
//! the output has exactly the shape of the input.

use crate::error::{PhenologyError, Result};
use crate::filter::{cumulative_sum, gradient};
use crate::imputation::{fill_linear, longest_gap};
use crate::series::{count_missing, DailyObservation, YearIndex};
use crate::spline::{NaturalCubicSpline, SplineSmoother};
use std::str::FromStr;
use tracing::{debug, warn};

/// Days borrowed from each neighboring year.
pub const PADDING_DAYS: usize = 20;

/// A year with at least this many missing days is excluded.
pub const MAX_MISSING_DAYS: usize = 50;

/// How the spline is applied to a padded year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmoothingMode {
    /// Smooth the running total, then differentiate it back to daily values
    #[default]
    Integral,
    /// Smooth the daily values directly
    Direct,
}

impl FromStr for SmoothingMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "integral" | "cumulative" | "true" => Self::Integral,
            "direct" | "raw" | "false" => Self::Direct,
            _ => Self::Integral,
        })
    }
}

impl SmoothingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integral => "integral",
            Self::Direct => "direct",
        }
    }
}

impl From<bool> for SmoothingMode {
    /// `true` selects integral smoothing, `false` direct smoothing.
    fn from(integral: bool) -> Self {
        if integral {
            Self::Integral
        } else {
            Self::Direct
        }
    }
}

/// Smooth a multi-year daily series with the default natural cubic spline.
///
/// # Arguments
/// * `series` - Whole calendar years of daily observations, in order
/// * `mode` - Integral or direct smoothing
/// * `knots` - Spline knot count (positive)
///
/// # Returns
/// A series of the same length and day alignment; years with at least
/// [`MAX_MISSING_DAYS`] missing values are all missing.
pub fn smooth(
    series: &[DailyObservation],
    mode: SmoothingMode,
    knots: usize,
) -> Result<Vec<DailyObservation>> {
    smooth_with(series, mode, knots, &NaturalCubicSpline)
}

/// Like [`smooth`], with a caller-supplied spline method.
pub fn smooth_with(
    series: &[DailyObservation],
    mode: SmoothingMode,
    knots: usize,
    spline: &dyn SplineSmoother,
) -> Result<Vec<DailyObservation>> {
    validate_knots(knots)?;
    let index = YearIndex::build(series)?;
    smooth_indexed(series, &index, mode, knots, spline)
}

pub(crate) fn validate_knots(knots: usize) -> Result<()> {
    if knots == 0 {
        return Err(PhenologyError::invalid_parameter(
            "knots",
            knots,
            "must be positive",
        ));
    }
    Ok(())
}

/// Smooth every year of an already indexed series.
///
/// A failed spline fit only affects its own year, which is then reported as
/// missing.
pub(crate) fn smooth_indexed(
    series: &[DailyObservation],
    index: &YearIndex,
    mode: SmoothingMode,
    knots: usize,
    spline: &dyn SplineSmoother,
) -> Result<Vec<DailyObservation>> {
    let mut smoothed = Vec::with_capacity(series.len());

    for (j, slice) in index.slices().iter().enumerate() {
        let year = index.observations(series, j);
        let n_missing = count_missing(year);

        if n_missing >= MAX_MISSING_DAYS {
            warn!(
                year = slice.year,
                n_missing, "year excluded from smoothing: too many missing days"
            );
            smoothed.extend(year.iter().map(|o| o.with_value(None)));
            continue;
        }

        let window = padded_window(series, index, j);
        match smooth_window(&window, mode, knots, spline) {
            Ok(values) if values.len() == window.len() => {
                let trimmed = &values[PADDING_DAYS..PADDING_DAYS + year.len()];
                smoothed.extend(
                    year.iter()
                        .zip(trimmed)
                        .map(|(o, v)| o.with_value(Some(*v))),
                );
                debug!(
                    year = slice.year,
                    n_missing,
                    longest_gap = longest_gap(&window),
                    mode = mode.as_str(),
                    "year smoothed"
                );
            }
            Ok(values) => {
                warn!(
                    year = slice.year,
                    expected = window.len(),
                    got = values.len(),
                    "spline returned a sequence of the wrong length; year left missing"
                );
                smoothed.extend(year.iter().map(|o| o.with_value(None)));
            }
            Err(e) => {
                warn!(year = slice.year, error = %e, "spline fit failed; year left missing");
                smoothed.extend(year.iter().map(|o| o.with_value(None)));
            }
        }
    }

    Ok(smoothed)
}

/// Year `j` with [`PADDING_DAYS`] borrowed on each side.
///
/// The first year is padded at the front with its own first days, the last
/// year at the back with its own last days.
pub(crate) fn padded_window(
    series: &[DailyObservation],
    index: &YearIndex,
    j: usize,
) -> Vec<Option<f64>> {
    let year = index.observations(series, j);

    let prefix = match index.previous(j) {
        Some(prev) => {
            let prev = &series[prev.range.clone()];
            &prev[prev.len().saturating_sub(PADDING_DAYS)..]
        }
        None => &year[..PADDING_DAYS.min(year.len())],
    };
    let suffix = match index.next(j) {
        Some(next) => {
            let next = &series[next.range.clone()];
            &next[..PADDING_DAYS.min(next.len())]
        }
        None => &year[year.len().saturating_sub(PADDING_DAYS)..],
    };

    prefix
        .iter()
        .chain(year)
        .chain(suffix)
        .map(|o| o.value)
        .collect()
}

fn smooth_window(
    window: &[Option<f64>],
    mode: SmoothingMode,
    knots: usize,
    spline: &dyn SplineSmoother,
) -> Result<Vec<f64>> {
    let filled = fill_linear(window);
    match mode {
        SmoothingMode::Integral => {
            let total = spline.fit(&cumulative_sum(&filled), knots)?;
            Ok(gradient(&total))
        }
        SmoothingMode::Direct => spline.fit(&filled, knots),
    }
}
