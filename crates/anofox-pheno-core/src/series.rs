//! Daily observations and per-year segmentation.
//!
//! A record is an ordered sequence of [`DailyObservation`]s covering whole
//! calendar years. [`YearIndex`] maps each year to the contiguous index range
//! it occupies, so neighboring years can be looked up without filtering.

use crate::error::{PhenologyError, Result};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use std::ops::Range;

/// One day of the input (or smoothed) series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyObservation {
    /// Microseconds since the Unix epoch
    pub timestamp: i64,
    /// Calendar year
    pub year: i32,
    /// 1-based day of year (1..=365, or 366 in leap years)
    pub day_of_year: u32,
    /// Observed value, `None` when missing
    pub value: Option<f64>,
}

impl DailyObservation {
    /// Build an observation for a calendar date at midnight UTC.
    pub fn from_date(date: NaiveDate, value: Option<f64>) -> Self {
        Self {
            timestamp: datetime_to_micros(date.and_time(NaiveTime::MIN)),
            year: date.year(),
            day_of_year: date.ordinal(),
            value,
        }
    }

    /// Build an observation from days since 1970-01-01.
    pub fn from_epoch_days(days: i64, value: Option<f64>) -> Result<Self> {
        let epoch = NaiveDate::default();
        let date = if days >= 0 {
            epoch.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            epoch.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        date.map(|d| Self::from_date(d, value))
            .ok_or_else(|| PhenologyError::InvalidDateFormat(format!("{days} days since epoch")))
    }

    /// Calendar date of the timestamp.
    pub fn date(&self) -> Option<NaiveDate> {
        micros_to_datetime(self.timestamp).map(|dt| dt.date())
    }

    /// Same day, different value.
    pub fn with_value(&self, value: Option<f64>) -> Self {
        Self { value, ..*self }
    }
}

/// Convert microseconds since epoch to NaiveDateTime.
fn micros_to_datetime(micros: i64) -> Option<NaiveDateTime> {
    let secs = micros.div_euclid(1_000_000);
    let nsecs = (micros.rem_euclid(1_000_000) * 1000) as u32;
    DateTime::from_timestamp(secs, nsecs).map(|dt| dt.naive_utc())
}

/// Convert NaiveDateTime to microseconds since epoch.
fn datetime_to_micros(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_micros()
}

/// Build a contiguous daily series starting at `start`, one value per day.
pub fn daily_series(start: NaiveDate, values: &[Option<f64>]) -> Vec<DailyObservation> {
    start
        .iter_days()
        .zip(values)
        .map(|(date, v)| DailyObservation::from_date(date, *v))
        .collect()
}

/// Number of days in a calendar year.
pub fn days_in_year(year: i32) -> usize {
    NaiveDate::from_ymd_opt(year, 12, 31)
        .map(|d| d.ordinal() as usize)
        .unwrap_or(365)
}

/// Number of missing values in a run of observations.
pub fn count_missing(observations: &[DailyObservation]) -> usize {
    observations.iter().filter(|o| o.value.is_none()).count()
}

/// Location of one calendar year inside the master series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSlice {
    pub year: i32,
    pub range: Range<usize>,
}

impl YearSlice {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Year → index-range mapping over a validated series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearIndex {
    slices: Vec<YearSlice>,
}

impl YearIndex {
    /// Validate the series and group it into whole calendar years.
    ///
    /// Rows must be strictly increasing in time, one per day, with the
    /// `(year, day_of_year)` fields agreeing with the timestamp. Every year
    /// must be complete and years must follow each other without gaps;
    /// missing days are expressed as `value: None`, not as absent rows.
    pub fn build(series: &[DailyObservation]) -> Result<Self> {
        if series.is_empty() {
            return Err(PhenologyError::InsufficientData { needed: 1, got: 0 });
        }

        let mut slices: Vec<YearSlice> = Vec::new();

        for (i, obs) in series.iter().enumerate() {
            check_calendar_fields(i, obs)?;

            if let Some(v) = obs.value {
                if !v.is_finite() {
                    return Err(PhenologyError::InvalidInput(format!(
                        "row {i}: value {v} is not finite"
                    )));
                }
            }

            let Some(prev) = i.checked_sub(1).map(|p| &series[p]) else {
                if obs.day_of_year != 1 {
                    return Err(PhenologyError::InvalidInput(format!(
                        "series must start on January 1, got day {} of {}",
                        obs.day_of_year, obs.year
                    )));
                }
                slices.push(YearSlice {
                    year: obs.year,
                    range: 0..1,
                });
                continue;
            };

            if obs.timestamp <= prev.timestamp {
                return Err(PhenologyError::InvalidInput(format!(
                    "row {i}: timestamps must be strictly increasing"
                )));
            }

            if obs.year == prev.year {
                if obs.day_of_year == prev.day_of_year {
                    return Err(PhenologyError::InvalidInput(format!(
                        "duplicate day {} of {}",
                        obs.day_of_year, obs.year
                    )));
                }
                if obs.day_of_year != prev.day_of_year + 1 {
                    return Err(PhenologyError::InvalidInput(format!(
                        "days {}..{} of {} are absent; encode gaps as missing values",
                        prev.day_of_year + 1,
                        obs.day_of_year,
                        obs.year
                    )));
                }
                if let Some(current) = slices.last_mut() {
                    current.range.end = i + 1;
                }
                continue;
            }

            if obs.year != prev.year + 1 || obs.day_of_year != 1 {
                return Err(PhenologyError::InvalidInput(format!(
                    "row {i}: series jumps from {}-{:03} to {}-{:03}",
                    prev.year, prev.day_of_year, obs.year, obs.day_of_year
                )));
            }
            slices.push(YearSlice {
                year: obs.year,
                range: i..i + 1,
            });
        }

        for slice in &slices {
            let expected = days_in_year(slice.year);
            if slice.len() != expected {
                return Err(PhenologyError::InvalidInput(format!(
                    "year {} has {} days, expected {}",
                    slice.year,
                    slice.len(),
                    expected
                )));
            }
        }

        Ok(Self { slices })
    }

    /// All years in chronological order.
    pub fn slices(&self) -> &[YearSlice] {
        &self.slices
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn get(&self, j: usize) -> Option<&YearSlice> {
        self.slices.get(j)
    }

    /// The year before position `j`, if any.
    pub fn previous(&self, j: usize) -> Option<&YearSlice> {
        j.checked_sub(1).and_then(|p| self.slices.get(p))
    }

    /// The year after position `j`, if any.
    pub fn next(&self, j: usize) -> Option<&YearSlice> {
        self.slices.get(j + 1)
    }

    /// Observations of year `j`.
    pub fn observations<'a>(
        &self,
        series: &'a [DailyObservation],
        j: usize,
    ) -> &'a [DailyObservation] {
        self.slices
            .get(j)
            .map(|s| &series[s.range.clone()])
            .unwrap_or(&[])
    }
}

fn check_calendar_fields(i: usize, obs: &DailyObservation) -> Result<()> {
    let date = obs.date().ok_or_else(|| {
        PhenologyError::InvalidDateFormat(format!("row {i}: timestamp {}", obs.timestamp))
    })?;
    if date.year() != obs.year || date.ordinal() != obs.day_of_year {
        return Err(PhenologyError::InvalidInput(format!(
            "row {i}: year/day_of_year {}-{:03} disagree with timestamp date {}",
            obs.year, obs.day_of_year, date
        )));
    }
    Ok(())
}
