//! Per-year transition-date extraction.
//!
//! Works on one year of smoothed values plus the smoothed values of the
//! neighboring years. Two methods run side by side:
//!
//! * **Threshold**: the year is rescaled onto [0, 1] with its own min/max and
//!   SOS/EOS are the days where it crosses a fixed fraction of that range.
//!   When a crossing is missing on one side of the peak, it is looked for in
//!   the neighboring year (rescaled with the *current* year's range).
//! * **Derivative**: SOS/EOS are the days of steepest increase before and
//!   steepest decrease after the peak, on a Savitzky–Golay smoothed
//!   derivative.
//!
//! Day numbers on the output are 1-based days of the current year. Dates
//! taken from a neighboring year keep that year's numbering here; the
//! orchestrator moves them onto the extended axis.

use crate::error::Result;
use crate::filter::{argmax, argmin, gradient, threshold_crossings, ValueRange};
use crate::savgol::SavitzkyGolay;
use tracing::{debug, warn};

/// Day count used to wrap dates across a year boundary.
pub const SEASON_DAYS: i64 = 365;

/// Derivative smoothing window for single-season cases.
pub const DERIVATIVE_WINDOW: usize = 101;

/// Derivative smoothing window when several crossings surround the peak.
pub const WIDE_DERIVATIVE_WINDOW: usize = 201;

/// Polynomial order of the derivative smoothing.
pub const DERIVATIVE_POLYORDER: usize = 3;

/// A transition date while it is being worked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ptd {
    /// A day number (or day count for season lengths)
    Resolved(i64),
    /// No case produced a value
    Unresolved,
    /// The input did not allow computing a value at all
    Missing,
}

impl Ptd {
    pub fn value(self) -> Option<i64> {
        match self {
            Ptd::Resolved(v) => Some(v),
            Ptd::Unresolved | Ptd::Missing => None,
        }
    }

    pub fn is_resolved(self) -> bool {
        matches!(self, Ptd::Resolved(_))
    }

    fn map(self, f: impl FnOnce(i64) -> i64) -> Self {
        match self {
            Ptd::Resolved(v) => Ptd::Resolved(f(v)),
            other => other,
        }
    }
}

/// Crossing configurations, in the order they are evaluated.
///
/// Several may match the same year; each later match overwrites what the
/// earlier ones set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonCase {
    /// Exactly two crossings, one on each side of the peak
    Interior,
    /// All crossings before the peak; the season ends in the next year
    EndsNextYear,
    /// All crossings after the peak; the season started in the previous year
    StartedPreviousYear,
    /// Two or more crossings with the peak between the first and the last
    MultipleCrossings,
}

impl SeasonCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interior => "interior",
            Self::EndsNextYear => "ends_next_year",
            Self::StartedPreviousYear => "started_previous_year",
            Self::MultipleCrossings => "multiple_crossings",
        }
    }
}

/// Smoothed values of the years around the one being processed.
///
/// `None` when the year does not exist or was excluded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Neighbors<'a> {
    pub previous: Option<&'a [f64]>,
    pub next: Option<&'a [f64]>,
}

/// Raw per-year result, before wrap correction.
#[derive(Debug, Clone, PartialEq)]
pub struct YearTransitions {
    pub sos: Ptd,
    pub pos: Ptd,
    pub eos: Ptd,
    pub gsl: Ptd,
    pub sos_der: Ptd,
    pub eos_der: Ptd,
    pub gsl_der: Ptd,
    /// Cases that matched, in evaluation order
    pub cases: Vec<SeasonCase>,
}

impl YearTransitions {
    /// Result for a year that could not be processed at all.
    pub fn excluded() -> Self {
        Self {
            sos: Ptd::Missing,
            pos: Ptd::Missing,
            eos: Ptd::Missing,
            gsl: Ptd::Missing,
            sos_der: Ptd::Missing,
            eos_der: Ptd::Missing,
            gsl_der: Ptd::Missing,
            cases: Vec::new(),
        }
    }

    fn unresolved(pos: i64) -> Self {
        Self {
            sos: Ptd::Unresolved,
            pos: Ptd::Resolved(pos),
            eos: Ptd::Unresolved,
            gsl: Ptd::Unresolved,
            sos_der: Ptd::Unresolved,
            eos_der: Ptd::Unresolved,
            gsl_der: Ptd::Unresolved,
            cases: Vec::new(),
        }
    }
}

/// Threshold crossings of the current year and its neighbors.
#[derive(Debug, Clone, Default)]
struct Crossings {
    own: Vec<usize>,
    previous: Vec<usize>,
    next: Vec<usize>,
}

/// Extract peak, threshold and derivative dates for one year.
///
/// # Arguments
/// * `values` - The year's smoothed values, one per day, none missing
/// * `neighbors` - Smoothed values of the previous/next year, if usable
/// * `threshold` - Fraction of the year's range, in (0, 1)
pub fn extract_year(
    values: &[f64],
    neighbors: &Neighbors<'_>,
    threshold: f64,
) -> Result<YearTransitions> {
    let Some(peak) = argmax(values) else {
        return Ok(YearTransitions::excluded());
    };
    let pos = peak as i64 + 1;
    let mut out = YearTransitions::unresolved(pos);

    let Some(range) = ValueRange::of(values) else {
        warn!(pos, "flat smoothed year: threshold dates cannot be normalized");
        out.sos = Ptd::Missing;
        out.eos = Ptd::Missing;
        out.gsl = Ptd::Missing;
        return Ok(out);
    };

    let crossings = Crossings {
        own: threshold_crossings(values, &range, threshold),
        previous: neighbors
            .previous
            .map(|p| threshold_crossings(p, &range, threshold))
            .unwrap_or_default(),
        next: neighbors
            .next
            .map(|n| threshold_crossings(n, &range, threshold))
            .unwrap_or_default(),
    };

    let cases = matching_cases(&crossings.own, pos);
    for case in &cases {
        apply_threshold_case(*case, &crossings, pos, &mut out);
    }
    out.cases = cases;
    out.gsl = threshold_season_length(out.sos, pos, out.eos);

    let derivative = DerivativeDates::compute(values, neighbors, &crossings, &out, pos)?;
    out.sos_der = derivative.sos;
    out.eos_der = derivative.eos;
    out.gsl_der = derivative_season_length(out.sos_der, out.eos_der);

    debug!(
        pos,
        crossings = ?crossings.own,
        cases = ?out.cases,
        sos = ?out.sos,
        eos = ?out.eos,
        "year transitions"
    );
    Ok(out)
}

/// Every case whose condition holds, in evaluation order.
fn matching_cases(own: &[usize], pos: i64) -> Vec<SeasonCase> {
    let (Some(&first), Some(&last)) = (own.first(), own.last()) else {
        return Vec::new();
    };
    let (first, last) = (first as i64, last as i64);

    let mut cases = Vec::new();
    if own.len() == 2 && first < pos && last > pos {
        cases.push(SeasonCase::Interior);
    }
    if last < pos {
        cases.push(SeasonCase::EndsNextYear);
    }
    if first > pos {
        cases.push(SeasonCase::StartedPreviousYear);
    }
    if own.len() >= 2 && first < pos && last > pos {
        cases.push(SeasonCase::MultipleCrossings);
    }
    cases
}

fn apply_threshold_case(
    case: SeasonCase,
    crossings: &Crossings,
    pos: i64,
    out: &mut YearTransitions,
) {
    let day = |i: usize| Ptd::Resolved(i as i64 + 1);
    let own = &crossings.own;

    match case {
        SeasonCase::Interior => {
            out.sos = day(own[0]);
            out.eos = day(own[1]);
        }
        SeasonCase::EndsNextYear => {
            if let Some(&last) = own.last() {
                out.sos = day(last);
            }
            if let Some(&first_next) = crossings.next.first() {
                out.eos = day(first_next);
            }
        }
        SeasonCase::StartedPreviousYear => {
            if let Some(&first) = own.first() {
                out.eos = day(first);
            }
            if let Some(&last_previous) = crossings.previous.last() {
                out.sos = day(last_previous);
            }
        }
        SeasonCase::MultipleCrossings => {
            let below = own.iter().copied().filter(|&c| (c as i64) < pos).max();
            let above = own.iter().copied().filter(|&c| (c as i64) > pos).min();
            if let (Some(below), Some(above)) = (below, above) {
                out.sos = day(below);
                out.eos = day(above);
            }
        }
    }
}

/// Season length from threshold dates in raw (unwrapped) numbering.
fn threshold_season_length(sos: Ptd, pos: i64, eos: Ptd) -> Ptd {
    match (sos, eos) {
        (Ptd::Resolved(s), Ptd::Resolved(e)) => {
            if s < pos && e > pos {
                Ptd::Resolved(e - s)
            } else if s < pos && e <= pos {
                Ptd::Resolved(SEASON_DAYS - s + e)
            } else if s >= pos && e > pos {
                Ptd::Resolved(e + SEASON_DAYS - s)
            } else {
                Ptd::Unresolved
            }
        }
        (Ptd::Missing, _) | (_, Ptd::Missing) => Ptd::Missing,
        _ => Ptd::Unresolved,
    }
}

/// Season length from derivative dates; negative differences wrap by a year.
fn derivative_season_length(sos: Ptd, eos: Ptd) -> Ptd {
    match (sos, eos) {
        (Ptd::Resolved(s), Ptd::Resolved(e)) => {
            let gsl = e - s;
            Ptd::Resolved(if gsl < 0 { gsl + SEASON_DAYS } else { gsl })
        }
        (Ptd::Missing, _) | (_, Ptd::Missing) => Ptd::Missing,
        _ => Ptd::Unresolved,
    }
}

/// Smoothed first derivative of a sequence.
fn smoothed_derivative(values: &[f64], window: usize) -> Result<Vec<f64>> {
    let filter = SavitzkyGolay::new(window, DERIVATIVE_POLYORDER)?;
    Ok(filter.apply(&gradient(values)))
}

#[derive(Debug, Clone, Copy)]
struct DerivativeDates {
    sos: Ptd,
    eos: Ptd,
}

impl DerivativeDates {
    /// Run the derivative evaluators in the same precedence as the threshold
    /// cases, after a default evaluator that applies whenever the threshold
    /// SOS precedes the peak and EOS does not.
    fn compute(
        values: &[f64],
        neighbors: &Neighbors<'_>,
        crossings: &Crossings,
        threshold: &YearTransitions,
        pos: i64,
    ) -> Result<Self> {
        let mut dates = Self {
            sos: Ptd::Unresolved,
            eos: Ptd::Unresolved,
        };
        let peak = pos as usize;

        let sos_before_peak = matches!(threshold.sos, Ptd::Resolved(s) if s < pos);
        let eos_at_or_before_peak = matches!(threshold.eos, Ptd::Resolved(e) if e <= pos);
        if sos_before_peak && !eos_at_or_before_peak {
            dates.around_peak(values, peak, DERIVATIVE_WINDOW)?;
        }

        for case in &threshold.cases {
            match case {
                // Covered by the default evaluator above
                SeasonCase::Interior => {}
                SeasonCase::EndsNextYear => {
                    let der = smoothed_derivative(values, DERIVATIVE_WINDOW)?;
                    dates.sos = steepest_rise(&der[..peak], 0);
                    if !crossings.next.is_empty() {
                        if let Some(next) = neighbors.next {
                            dates.eos = end_in_next_year(values, next, peak)?;
                        }
                    }
                }
                SeasonCase::StartedPreviousYear => {
                    let der = smoothed_derivative(values, DERIVATIVE_WINDOW)?;
                    dates.eos = steepest_fall(&der, 0);
                    if !crossings.previous.is_empty() {
                        if let Some(previous) = neighbors.previous {
                            dates.sos = start_in_previous_year(previous, values, peak)?;
                        }
                    }
                }
                SeasonCase::MultipleCrossings => {
                    dates.around_peak(values, peak, WIDE_DERIVATIVE_WINDOW)?;
                }
            }
        }

        Ok(dates)
    }

    /// Steepest rise up to and including the peak day, steepest fall after it.
    fn around_peak(&mut self, values: &[f64], peak: usize, window: usize) -> Result<()> {
        let der = smoothed_derivative(values, window)?;
        self.sos = steepest_rise(&der[..peak], 0);
        self.eos = steepest_fall(&der[peak..], peak);
        Ok(())
    }
}

/// 1-based day of the derivative maximum, with `offset` days skipped before `der`.
fn steepest_rise(der: &[f64], offset: usize) -> Ptd {
    argmax(der).map_or(Ptd::Unresolved, |i| Ptd::Resolved((offset + i) as i64 + 1))
}

/// 1-based day of the derivative minimum, with `offset` days skipped before `der`.
fn steepest_fall(der: &[f64], offset: usize) -> Ptd {
    argmin(der).map_or(Ptd::Unresolved, |i| Ptd::Resolved((offset + i) as i64 + 1))
}

/// EOS_der for a season that runs past December 31.
///
/// The post-peak tail of the current year is joined to the next year, the
/// joined sequence is differentiated and smoothed, and the steepest fall is
/// searched up to the next year's own peak. A result inside the next year is
/// returned in that year's day numbering.
fn end_in_next_year(values: &[f64], next: &[f64], peak: usize) -> Result<Ptd> {
    let tail = &values[peak..];
    let joined: Vec<f64> = tail.iter().chain(next).copied().collect();
    let der = smoothed_derivative(&joined, DERIVATIVE_WINDOW)?;

    let next_peak = argmax(next).unwrap_or(next.len().saturating_sub(1));
    let search_end = (tail.len() + next_peak + 1).min(der.len());

    Ok(match argmin(&der[..search_end]) {
        Some(i) if i < tail.len() => Ptd::Resolved((peak + i) as i64 + 1),
        Some(i) => Ptd::Resolved((i - tail.len()) as i64 + 1),
        None => Ptd::Unresolved,
    })
}

/// SOS_der for a season that started before January 1.
///
/// The previous year is cut at the steepest fall of its smoothed derivative
/// over the whole year, joined to the current year up to the peak, and the
/// steepest rise of the joined sequence is located. The whole-year minimum
/// stands in for the previous year's reported EOS_der; the two agree only
/// when that year itself started in the year before it. Days that fall in
/// the previous year come back as zero or negative numbers, counted back from
/// January 1 of the current year.
fn start_in_previous_year(previous: &[f64], values: &[f64], peak: usize) -> Result<Ptd> {
    let previous_der = smoothed_derivative(previous, DERIVATIVE_WINDOW)?;
    let Some(previous_end) = argmin(&previous_der) else {
        return Ok(Ptd::Unresolved);
    };

    let tail = &previous[previous_end..];
    let joined: Vec<f64> = tail.iter().chain(&values[..peak]).copied().collect();
    let der = smoothed_derivative(&joined, DERIVATIVE_WINDOW)?;

    Ok(argmax(&der).map_or(Ptd::Unresolved, |i| {
        Ptd::Resolved(i as i64 - tail.len() as i64 + 1)
    }))
}

/// Move dates found in a neighboring year onto the current year's extended
/// day axis: EOS at or before the peak is in the next year, SOS at or after
/// the peak is in the previous year.
pub fn wrap_to_extended_axis(t: &YearTransitions) -> (Ptd, Ptd) {
    let Some(pos) = t.pos.value() else {
        return (t.sos, t.eos);
    };
    let sos = match t.sos {
        Ptd::Resolved(s) if s >= pos => t.sos.map(|s| s - SEASON_DAYS),
        other => other,
    };
    let eos = match t.eos {
        Ptd::Resolved(e) if e <= pos => t.eos.map(|e| e + SEASON_DAYS),
        other => other,
    };
    (sos, eos)
}
