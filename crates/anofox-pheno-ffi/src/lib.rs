//! FFI boundary layer for the anofox-phenology DuckDB extension.
//!
//! This crate provides C-compatible functions that can be called from the
//! C++ DuckDB extension wrapper.

pub mod allocation;
pub mod conversion;
pub mod error_handling;
pub mod types;

use allocation::{alloc_and_copy_array, alloc_optional_values};
use anofox_pheno_core::{PhenologyOutput, SmoothingMode};
use conversion::{build_observations, c_str_to_enum, knots_from_c};
use error_handling::{check_null_pointers, ffi_try, init_error};
use libc::{c_char, c_double, c_int, size_t};

pub use types::*;

// ============================================================================
// Helper Functions
// ============================================================================

/// Copy extraction output into a `PhenologyResult`.
///
/// On allocation failure everything copied so far is released again.
unsafe fn write_phenology(
    output: &PhenologyOutput,
    out_result: *mut PhenologyResult,
    out_error: *mut AnofoxError,
) -> bool {
    let records = &output.records;
    let years: Vec<c_int> = records.iter().map(|r| r.year).collect();
    let columns: Vec<Vec<c_double>> = (0..7)
        .map(|k| {
            records
                .iter()
                .map(|r| r.dates()[k].map_or(f64::NAN, |v| v as f64))
                .collect()
        })
        .collect();
    let smoothed: Vec<Option<f64>> = output.smoothed.iter().map(|o| o.value).collect();

    *out_result = PhenologyResult::default();
    let r = &mut *out_result;
    r.n_years = records.len();
    r.n_smoothed = smoothed.len();

    let ok = alloc_and_copy_array(&years, &mut r.years, out_error)
        && alloc_and_copy_array(&columns[0], &mut r.sos, out_error)
        && alloc_and_copy_array(&columns[1], &mut r.pos, out_error)
        && alloc_and_copy_array(&columns[2], &mut r.eos, out_error)
        && alloc_and_copy_array(&columns[3], &mut r.gsl, out_error)
        && alloc_and_copy_array(&columns[4], &mut r.sos_der, out_error)
        && alloc_and_copy_array(&columns[5], &mut r.eos_der, out_error)
        && alloc_and_copy_array(&columns[6], &mut r.gsl_der, out_error)
        && alloc_optional_values(
            &smoothed,
            &mut r.smoothed,
            &mut r.smoothed_validity,
            out_error,
        );

    if !ok {
        anofox_free_phenology_result(out_result);
    }
    ok
}

// ============================================================================
// Phenology Functions
// ============================================================================

/// Smooth a multi-year daily series year by year.
///
/// `dates` are DuckDB `DATE` values (days since 1970-01-01), one row per day
/// covering whole calendar years. `smoothing` is "integral" (default when
/// null) or "direct".
///
/// # Safety
/// All pointer arguments except `validity` and `smoothing` must be valid and
/// non-null. Arrays must have the specified lengths.
#[no_mangle]
pub unsafe extern "C" fn anofox_pheno_smooth(
    dates: *const i32,
    values: *const c_double,
    validity: *const u64,
    length: size_t,
    smoothing: *const c_char,
    knots: c_int,
    out_result: *mut SmoothResult,
    out_error: *mut AnofoxError,
) -> bool {
    init_error(out_error);

    if check_null_pointers(
        out_error,
        &[
            dates as *const core::ffi::c_void,
            values as *const core::ffi::c_void,
            out_result as *const core::ffi::c_void,
        ],
    ) {
        return false;
    }

    let smoothed = ffi_try(out_error, || {
        let series = build_observations(dates, values, validity, length)?;
        let mode = c_str_to_enum(smoothing, "integral", SmoothingMode::Integral);
        anofox_pheno_core::smooth(&series, mode, knots_from_c(knots)?)
    });
    let Some(smoothed) = smoothed else {
        return false;
    };

    let data: Vec<Option<f64>> = smoothed.iter().map(|o| o.value).collect();
    *out_result = SmoothResult::default();
    let r = &mut *out_result;
    r.length = data.len();
    alloc_optional_values(&data, &mut r.values, &mut r.validity, out_error)
}

/// Extract per-year transition dates (SOS, POS, EOS, GSL and their
/// derivative-method counterparts) from a multi-year daily series.
///
/// # Safety
/// All pointer arguments except `validity` must be valid and non-null.
/// Arrays must have the specified lengths.
#[no_mangle]
pub unsafe extern "C" fn anofox_pheno_extract(
    dates: *const i32,
    values: *const c_double,
    validity: *const u64,
    length: size_t,
    options: *const PhenologyOptions,
    out_result: *mut PhenologyResult,
    out_error: *mut AnofoxError,
) -> bool {
    init_error(out_error);

    if check_null_pointers(
        out_error,
        &[
            dates as *const core::ffi::c_void,
            values as *const core::ffi::c_void,
            options as *const core::ffi::c_void,
            out_result as *const core::ffi::c_void,
        ],
    ) {
        return false;
    }

    let output = ffi_try(out_error, || {
        let series = build_observations(dates, values, validity, length)?;
        let opts = &*options;

        let core_opts = anofox_pheno_core::PhenologyOptions {
            threshold: opts.threshold,
            mode: c_str_to_enum(opts.smoothing.as_ptr(), "integral", SmoothingMode::Integral),
            knots: knots_from_c(opts.knots)?,
        };

        anofox_pheno_core::extract_phenology(&series, &core_opts)
    });
    let Some(output) = output else {
        return false;
    };

    write_phenology(&output, out_result, out_error)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a SmoothResult.
///
/// # Safety
/// The result pointer must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn anofox_free_smooth_result(result: *mut SmoothResult) {
    if result.is_null() {
        return;
    }
    let r = &mut *result;
    crate::free_fields!(r, values, validity);
    r.length = 0;
}

/// Free a PhenologyResult.
///
/// # Safety
/// The result pointer must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn anofox_free_phenology_result(result: *mut PhenologyResult) {
    if result.is_null() {
        return;
    }
    let r = &mut *result;
    crate::free_fields!(
        r,
        years,
        sos,
        pos,
        eos,
        gsl,
        sos_der,
        eos_der,
        gsl_der,
        smoothed,
        smoothed_validity,
    );
    r.n_years = 0;
    r.n_smoothed = 0;
}

// ============================================================================
// Version
// ============================================================================

#[no_mangle]
pub extern "C" fn anofox_pheno_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_version_matches_package() {
        let version = unsafe { CStr::from_ptr(anofox_pheno_version()) };
        assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_null_pointers_rejected() {
        let mut result = PhenologyResult::default();
        let mut error = AnofoxError::default();
        let ok = unsafe {
            anofox_pheno_extract(
                std::ptr::null(),
                std::ptr::null(),
                std::ptr::null(),
                0,
                std::ptr::null(),
                &mut result,
                &mut error,
            )
        };
        assert!(!ok);
        assert_eq!(error.code, ErrorCode::NullPointer);
    }

    #[test]
    fn test_free_null_is_noop() {
        unsafe {
            anofox_free_smooth_result(std::ptr::null_mut());
            anofox_free_phenology_result(std::ptr::null_mut());
        }
        let mut result = SmoothResult::default();
        unsafe { anofox_free_smooth_result(&mut result) };
        assert!(result.values.is_null());
    }
}
