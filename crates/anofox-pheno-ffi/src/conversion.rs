//! Parameter and input conversion utilities for FFI functions.

use anofox_pheno_core::{DailyObservation, PhenologyError, Result};
use core::ffi::{c_char, c_double, c_int};
use libc::size_t;
use std::ffi::CStr;

/// Convert a `c_int` to `Option<usize>`, where values <= 0 become None.
#[inline]
pub fn to_option_usize(value: c_int) -> Option<usize> {
    if value > 0 {
        Some(value as usize)
    } else {
        None
    }
}

/// Knot count from a C integer; zero and negative counts are rejected.
pub fn knots_from_c(value: c_int) -> Result<usize> {
    to_option_usize(value).ok_or_else(|| PhenologyError::InvalidParameter {
        param: "knots".to_string(),
        value: value.to_string(),
        reason: "must be positive".to_string(),
    })
}

/// Convert a C string pointer to a Rust `&str` with a default value.
///
/// # Safety
/// The pointer must be null or point to a valid null-terminated string.
#[inline]
pub unsafe fn c_str_to_str<'a>(ptr: *const c_char, default: &'a str) -> &'a str {
    if ptr.is_null() {
        default
    } else {
        CStr::from_ptr(ptr).to_str().unwrap_or(default)
    }
}

/// Parse a C string to an enum with a default, using case-insensitive matching.
///
/// # Safety
/// The pointer must be null or point to a valid null-terminated string.
pub unsafe fn c_str_to_enum<T>(ptr: *const c_char, default_str: &str, default_val: T) -> T
where
    T: std::str::FromStr,
{
    let s = c_str_to_str(ptr, default_str);
    s.parse().unwrap_or(default_val)
}

/// Build a series with NULL handling from raw pointers.
///
/// # Safety
/// `data` must point to `length` values; `validity` must be null (all valid)
/// or point to `length.div_ceil(64)` words.
pub unsafe fn build_series(
    data: *const c_double,
    validity: *const u64,
    length: size_t,
) -> Vec<Option<f64>> {
    if length == 0 {
        return vec![];
    }
    let data_slice = std::slice::from_raw_parts(data, length);

    if validity.is_null() {
        data_slice.iter().map(|&v| Some(v)).collect()
    } else {
        let validity_len = length.div_ceil(64);
        let validity_slice = std::slice::from_raw_parts(validity, validity_len);

        (0..length)
            .map(|i| {
                let word = validity_slice[i / 64];
                let is_valid = (word >> (i % 64)) & 1 == 1;
                if is_valid {
                    Some(data_slice[i])
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Build daily observations from DuckDB `DATE` values (days since
/// 1970-01-01) and a nullable value column.
///
/// # Safety
/// Same as [`build_series`]; `dates` must point to `length` values.
pub unsafe fn build_observations(
    dates: *const i32,
    values: *const c_double,
    validity: *const u64,
    length: size_t,
) -> Result<Vec<DailyObservation>> {
    if length == 0 {
        return Ok(vec![]);
    }
    let dates = std::slice::from_raw_parts(dates, length);
    let values = build_series(values, validity, length);

    dates
        .iter()
        .zip(values)
        .map(|(&days, value)| DailyObservation::from_epoch_days(i64::from(days), value))
        .collect()
}
