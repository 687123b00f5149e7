//! Phenology extraction over a multi-year daily series.
//!
//! Smooths the whole series once, then walks the years in order and runs the
//! transition extractor on each one with its neighbors' smoothed values.

use crate::error::{PhenologyError, Result};
use crate::series::{DailyObservation, YearIndex};
use crate::smoothing::{smooth_indexed, validate_knots, SmoothingMode};
use crate::spline::{NaturalCubicSpline, SplineSmoother};
use crate::transitions::{
    extract_year, wrap_to_extended_axis, Neighbors, SeasonCase, YearTransitions,
};
use tracing::{debug, warn};

/// Column names of the phenology table, in output order.
pub const PHENOLOGY_COLUMNS: [&str; 8] = [
    "Year", "SOS", "POS", "EOS", "GSL", "SOS_der", "EOS_der", "GSL_der",
];

/// Options for phenology extraction.
#[derive(Debug, Clone)]
pub struct PhenologyOptions {
    /// Fraction of the annual range that marks SOS/EOS (0-1, exclusive)
    pub threshold: f64,
    /// Spline smoothing variant
    pub mode: SmoothingMode,
    /// Spline knot count
    pub knots: usize,
}

impl Default for PhenologyOptions {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            mode: SmoothingMode::Integral,
            knots: 10,
        }
    }
}

impl PhenologyOptions {
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(PhenologyError::invalid_parameter(
                "threshold",
                self.threshold,
                "must lie strictly between 0 and 1",
            ));
        }
        validate_knots(self.knots)
    }
}

/// Transition dates of one calendar year.
///
/// Days are on the year's extended axis: SOS may be zero or negative when the
/// season started in the previous year and EOS may exceed the year length
/// when it ended in the next one. `None` means the date could not be
/// determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhenologyRecord {
    pub year: i32,
    pub sos: Option<i64>,
    pub pos: Option<i64>,
    pub eos: Option<i64>,
    pub gsl: Option<i64>,
    pub sos_der: Option<i64>,
    pub eos_der: Option<i64>,
    pub gsl_der: Option<i64>,
    /// Crossing configurations that matched, in evaluation order
    pub cases: Vec<SeasonCase>,
}

impl PhenologyRecord {
    fn finalize(year: i32, t: YearTransitions) -> Self {
        let (sos, eos) = wrap_to_extended_axis(&t);
        Self {
            year,
            sos: sos.value(),
            pos: t.pos.value(),
            eos: eos.value(),
            gsl: t.gsl.value(),
            sos_der: t.sos_der.value(),
            eos_der: t.eos_der.value(),
            gsl_der: t.gsl_der.value(),
            cases: t.cases,
        }
    }

    /// The seven date columns after `Year`, in table order.
    pub fn dates(&self) -> [Option<i64>; 7] {
        [
            self.sos,
            self.pos,
            self.eos,
            self.gsl,
            self.sos_der,
            self.eos_der,
            self.gsl_der,
        ]
    }

    /// True when no date at all could be determined for the year.
    pub fn is_empty(&self) -> bool {
        self.dates().iter().all(Option::is_none)
    }
}

/// Result of [`extract_phenology`].
#[derive(Debug, Clone)]
pub struct PhenologyOutput {
    /// One record per calendar year, in order
    pub records: Vec<PhenologyRecord>,
    /// Input series with smoothed values
    pub smoothed: Vec<DailyObservation>,
}

/// Extract per-year transition dates with the default spline.
///
/// # Arguments
/// * `series` - Whole calendar years of daily observations, in order
/// * `options` - Threshold, smoothing mode and knot count
///
/// # Example
/// ```
/// use anofox_pheno_core::{daily_series, extract_phenology, PhenologyOptions};
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
/// let values: Vec<Option<f64>> = (0..3 * 365)
///     .map(|i| {
///         let d = (i % 365) as f64 + 1.0;
///         Some(20.0 * (1.0 - (d - 180.0).abs() / 61.0).max(0.0))
///     })
///     .collect();
/// let output = extract_phenology(&daily_series(start, &values), &PhenologyOptions::default())
///     .unwrap();
/// assert_eq!(output.records.len(), 3);
/// ```
pub fn extract_phenology(
    series: &[DailyObservation],
    options: &PhenologyOptions,
) -> Result<PhenologyOutput> {
    extract_phenology_with(series, options, &NaturalCubicSpline)
}

/// Like [`extract_phenology`], with a caller-supplied spline method.
pub fn extract_phenology_with(
    series: &[DailyObservation],
    options: &PhenologyOptions,
    spline: &dyn SplineSmoother,
) -> Result<PhenologyOutput> {
    options.validate()?;
    let index = YearIndex::build(series)?;
    let smoothed = smooth_indexed(series, &index, options.mode, options.knots, spline)?;

    let years: Vec<Option<Vec<f64>>> = (0..index.len())
        .map(|j| {
            index
                .observations(&smoothed, j)
                .iter()
                .map(|o| o.value)
                .collect()
        })
        .collect();

    let mut records = Vec::with_capacity(index.len());
    for (j, slice) in index.slices().iter().enumerate() {
        let transitions = match &years[j] {
            Some(values) => {
                let neighbors = Neighbors {
                    previous: j.checked_sub(1).and_then(|p| years[p].as_deref()),
                    next: years.get(j + 1).and_then(|n| n.as_deref()),
                };
                year_or_excluded(slice.year, extract_year(values, &neighbors, options.threshold))
            }
            None => YearTransitions::excluded(),
        };

        let record = PhenologyRecord::finalize(slice.year, transitions);
        debug!(
            year = record.year,
            sos = ?record.sos,
            pos = ?record.pos,
            eos = ?record.eos,
            "phenology record"
        );
        records.push(record);
    }

    Ok(PhenologyOutput { records, smoothed })
}

/// A year whose extraction fails is reported as missing; the other years
/// are unaffected.
fn year_or_excluded(year: i32, result: Result<YearTransitions>) -> YearTransitions {
    result.unwrap_or_else(|e| {
        warn!(year, error = %e, "transition extraction failed; year left missing");
        YearTransitions::excluded()
    })
}
