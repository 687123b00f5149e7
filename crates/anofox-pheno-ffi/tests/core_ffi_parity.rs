//! Core-vs-FFI parity integration tests.
//!
//! For each smoothing mode we call the Rust core directly and then the FFI
//! functions with identical inputs. Both must produce bit-identical results
//! since the FFI layer is a thin translation shim.

use std::ffi::{c_char, c_double, CStr};

use anofox_pheno_core::{
    extract_phenology, smooth, DailyObservation, PhenologyOptions, SmoothingMode,
};
use anofox_pheno_ffi::types::{
    AnofoxError, ErrorCode, PhenologyOptions as FfiPhenologyOptions, PhenologyResult,
    SmoothResult,
};
use chrono::NaiveDate;

// Defined in anofox_pheno_ffi/src/lib.rs
extern "C" {
    fn anofox_pheno_smooth(
        dates: *const i32,
        values: *const c_double,
        validity: *const u64,
        length: usize,
        smoothing: *const c_char,
        knots: i32,
        out_result: *mut SmoothResult,
        out_error: *mut AnofoxError,
    ) -> bool;

    fn anofox_pheno_extract(
        dates: *const i32,
        values: *const c_double,
        validity: *const u64,
        length: usize,
        options: *const FfiPhenologyOptions,
        out_result: *mut PhenologyResult,
        out_error: *mut AnofoxError,
    ) -> bool;

    fn anofox_free_smooth_result(result: *mut SmoothResult);
    fn anofox_free_phenology_result(result: *mut PhenologyResult);
}

// ── Synthetic data ─────────────────────────────────────────────────────

const FIRST_DAY: i32 = 11323; // 2001-01-01
const N_DAYS: usize = 3 * 365;

/// Three years of a seasonal index with a few cloudy days and one long gap.
fn ndvi_data() -> (Vec<i32>, Vec<f64>, Vec<u64>) {
    let dates: Vec<i32> = (0..N_DAYS as i32).map(|i| FIRST_DAY + i).collect();
    let values: Vec<f64> = (0..N_DAYS)
        .map(|i| {
            let d = (i % 365) as f64;
            let season = (-((d - 190.0) / 40.0).powi(2)).exp();
            let noise = ((i * 7 + 3) % 11) as f64 * 0.004 - 0.02; // deterministic "noise"
            0.2 + 0.5 * season + noise
        })
        .collect();

    let mut validity = vec![u64::MAX; N_DAYS.div_ceil(64)];
    let mut set_null = |i: usize| validity[i / 64] &= !(1u64 << (i % 64));
    for i in (0..N_DAYS).step_by(23) {
        set_null(i);
    }
    // 55 missing days in the third year excludes it
    for i in 2 * 365 + 120..2 * 365 + 175 {
        set_null(i);
    }
    (dates, values, validity)
}

fn core_series(values: &[f64], validity: &[u64]) -> Vec<DailyObservation> {
    let start = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
    let data: Vec<Option<f64>> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| ((validity[i / 64] >> (i % 64)) & 1 == 1).then_some(v))
        .collect();
    anofox_pheno_core::daily_series(start, &data)
}

fn ffi_options(smoothing: &str, threshold: f64, knots: i32) -> FfiPhenologyOptions {
    let mut opts = FfiPhenologyOptions::default();
    opts.smoothing = [0; 16];
    for (i, &b) in smoothing.as_bytes().iter().enumerate().take(15) {
        opts.smoothing[i] = b as c_char;
    }
    opts.threshold = threshold;
    opts.knots = knots;
    opts
}

fn error_message(error: &AnofoxError) -> String {
    unsafe { CStr::from_ptr(error.message.as_ptr()) }
        .to_str()
        .unwrap_or("unknown")
        .to_string()
}

/// Both None/NaN or bit-identical.
fn assert_opt_eq(label: &str, core: Option<f64>, ffi: f64) {
    match core {
        None => assert!(ffi.is_nan(), "{label}: core=None but ffi={ffi}"),
        Some(c) => assert_eq!(c.to_bits(), ffi.to_bits(), "{label}: core={c} ffi={ffi}"),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[test]
fn smooth_parity() {
    let (dates, values, validity) = ndvi_data();
    let series = core_series(&values, &validity);

    for (name, mode) in [
        ("integral\0", SmoothingMode::Integral),
        ("direct\0", SmoothingMode::Direct),
    ] {
        let core_out = smooth(&series, mode, 10).unwrap();

        let mut result = SmoothResult::default();
        let mut error = AnofoxError::default();
        let ok = unsafe {
            anofox_pheno_smooth(
                dates.as_ptr(),
                values.as_ptr(),
                validity.as_ptr(),
                dates.len(),
                name.as_ptr() as *const c_char,
                10,
                &mut result,
                &mut error,
            )
        };
        assert!(ok, "FFI call failed: {}", error_message(&error));
        assert_eq!(result.length, core_out.len());

        let ffi_values = unsafe { std::slice::from_raw_parts(result.values, result.length) };
        let ffi_validity =
            unsafe { std::slice::from_raw_parts(result.validity, result.length.div_ceil(64)) };
        for (i, obs) in core_out.iter().enumerate() {
            let valid = (ffi_validity[i / 64] >> (i % 64)) & 1 == 1;
            assert_eq!(valid, obs.value.is_some(), "validity[{i}]");
            assert_opt_eq(&format!("{name} smoothed[{i}]"), obs.value, ffi_values[i]);
        }

        unsafe { anofox_free_smooth_result(&mut result) };
        assert!(result.values.is_null());
    }
}

#[test]
fn extract_parity() {
    let (dates, values, validity) = ndvi_data();
    let series = core_series(&values, &validity);

    for (name, mode) in [
        ("integral", SmoothingMode::Integral),
        ("direct", SmoothingMode::Direct),
    ] {
        let core_out = extract_phenology(
            &series,
            &PhenologyOptions {
                threshold: 0.4,
                mode,
                knots: 12,
            },
        )
        .unwrap();

        let opts = ffi_options(name, 0.4, 12);
        let mut result = PhenologyResult::default();
        let mut error = AnofoxError::default();
        let ok = unsafe {
            anofox_pheno_extract(
                dates.as_ptr(),
                values.as_ptr(),
                validity.as_ptr(),
                dates.len(),
                &opts,
                &mut result,
                &mut error,
            )
        };
        assert!(ok, "FFI call failed: {}", error_message(&error));
        assert_eq!(result.n_years, 3);
        assert_eq!(result.n_smoothed, N_DAYS);

        let n = result.n_years;
        let years = unsafe { std::slice::from_raw_parts(result.years, n) };
        let columns = unsafe {
            [
                std::slice::from_raw_parts(result.sos, n),
                std::slice::from_raw_parts(result.pos, n),
                std::slice::from_raw_parts(result.eos, n),
                std::slice::from_raw_parts(result.gsl, n),
                std::slice::from_raw_parts(result.sos_der, n),
                std::slice::from_raw_parts(result.eos_der, n),
                std::slice::from_raw_parts(result.gsl_der, n),
            ]
        };

        for (j, record) in core_out.records.iter().enumerate() {
            assert_eq!(years[j], record.year);
            for (k, date) in record.dates().iter().enumerate() {
                assert_opt_eq(
                    &format!("{name} year {} column {k}", record.year),
                    date.map(|v| v as f64),
                    columns[k][j],
                );
            }
        }

        // The gap year comes back empty on both sides
        assert!(core_out.records[2].is_empty());
        assert!(columns.iter().all(|c| c[2].is_nan()));

        let smoothed = unsafe { std::slice::from_raw_parts(result.smoothed, N_DAYS) };
        for (i, obs) in core_out.smoothed.iter().enumerate() {
            assert_opt_eq(&format!("{name} smoothed[{i}]"), obs.value, smoothed[i]);
        }

        unsafe { anofox_free_phenology_result(&mut result) };
        assert!(result.years.is_null());
        assert!(result.smoothed.is_null());
    }
}

#[test]
fn extract_reports_bad_input() {
    let (dates, values, _) = ndvi_data();

    // Starts mid-year
    let mut result = PhenologyResult::default();
    let mut error = AnofoxError::default();
    let ok = unsafe {
        anofox_pheno_extract(
            dates[10..].as_ptr(),
            values[10..].as_ptr(),
            std::ptr::null(),
            dates.len() - 10,
            &FfiPhenologyOptions::default(),
            &mut result,
            &mut error,
        )
    };
    assert!(!ok);
    assert_eq!(error.code, ErrorCode::InvalidInput);
    assert!(result.years.is_null());

    // Threshold outside (0, 1)
    let opts = ffi_options("integral", 1.5, 10);
    let ok = unsafe {
        anofox_pheno_extract(
            dates.as_ptr(),
            values.as_ptr(),
            std::ptr::null(),
            dates.len(),
            &opts,
            &mut result,
            &mut error,
        )
    };
    assert!(!ok);
    assert_eq!(error.code, ErrorCode::InvalidParameter);
    assert!(error_message(&error).contains("threshold"));
}

#[test]
fn smooth_rejects_zero_knots() {
    let (dates, values, _) = ndvi_data();
    let mut result = SmoothResult::default();
    let mut error = AnofoxError::default();
    let ok = unsafe {
        anofox_pheno_smooth(
            dates.as_ptr(),
            values.as_ptr(),
            std::ptr::null(),
            dates.len(),
            std::ptr::null(),
            0,
            &mut result,
            &mut error,
        )
    };
    assert!(!ok);
    assert_eq!(error.code, ErrorCode::InvalidParameter);
}
