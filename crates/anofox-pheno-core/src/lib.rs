//! Core phenology library for the anofox-phenology DuckDB extension.
//!
//! This crate provides year-aware spline smoothing of daily vegetation-index
//! series and the extraction of per-year transition dates (start, peak and
//! end of season, growing season length) from the smoothed signal.

pub mod error;
pub mod filter;
pub mod imputation;
pub mod phenology;
pub mod savgol;
pub mod series;
pub mod smoothing;
pub mod spline;
pub mod transitions;

// Re-exports for convenience
pub use error::{PhenologyError, Result};
pub use filter::{argmax, argmin, cumulative_sum, gradient, threshold_crossings, ValueRange};
pub use imputation::{fill_linear, longest_gap};
pub use phenology::{
    extract_phenology, extract_phenology_with, PhenologyOptions, PhenologyOutput,
    PhenologyRecord, PHENOLOGY_COLUMNS,
};
pub use savgol::{savgol_filter, SavitzkyGolay};
pub use series::{daily_series, days_in_year, DailyObservation, YearIndex, YearSlice};
pub use smoothing::{smooth, smooth_with, SmoothingMode, MAX_MISSING_DAYS, PADDING_DAYS};
pub use spline::{natural_spline_basis, NaturalCubicSpline, SplineSmoother};
pub use transitions::{extract_year, Neighbors, Ptd, SeasonCase, YearTransitions};
