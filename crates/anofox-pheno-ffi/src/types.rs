//! C-compatible type definitions for FFI boundary.
//!
//! These types are designed to be used across the Rust/C++ boundary of the
//! DuckDB extension.

use anofox_pheno_core::PhenologyError;
use libc::{c_char, c_double, c_int, size_t};

/// Error codes for FFI boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    NullPointer = 1,
    InvalidInput = 2,
    ComputationError = 3,
    AllocationError = 4,
    InsufficientData = 6,
    InvalidDateFormat = 7,
    InvalidParameter = 8,
    PanicCaught = 9,
    InternalError = 10,
}

impl From<&PhenologyError> for ErrorCode {
    fn from(e: &PhenologyError) -> Self {
        match e.to_code() {
            2 => ErrorCode::InvalidInput,
            3 => ErrorCode::ComputationError,
            6 => ErrorCode::InsufficientData,
            7 => ErrorCode::InvalidDateFormat,
            8 => ErrorCode::InvalidParameter,
            _ => ErrorCode::InternalError,
        }
    }
}

/// Error structure with message buffer for FFI.
#[repr(C)]
pub struct AnofoxError {
    pub code: ErrorCode,
    pub message: [c_char; 256],
}

impl AnofoxError {
    /// Create a success error (no error).
    pub fn success() -> Self {
        Self {
            code: ErrorCode::Success,
            message: [0; 256],
        }
    }

    /// Set an error with code and message.
    pub fn set_error(&mut self, code: ErrorCode, msg: &str) {
        self.code = code;
        let bytes = msg.as_bytes();
        let len = bytes.len().min(255);
        for (i, &b) in bytes[..len].iter().enumerate() {
            self.message[i] = b as c_char;
        }
        self.message[len] = 0; // Null terminator
    }
}

impl Default for AnofoxError {
    fn default() -> Self {
        Self::success()
    }
}

/// Phenology extraction options.
#[repr(C)]
pub struct PhenologyOptions {
    /// Fraction of the annual range marking SOS/EOS, in (0, 1)
    pub threshold: c_double,
    /// Smoothing mode, "integral" or "direct" (null-terminated string)
    pub smoothing: [c_char; 16],
    /// Spline knot count (must be positive)
    pub knots: c_int,
}

impl Default for PhenologyOptions {
    fn default() -> Self {
        let mut smoothing = [0 as c_char; 16];
        b"integral"
            .iter()
            .enumerate()
            .for_each(|(i, &b)| smoothing[i] = b as c_char);
        Self {
            threshold: 0.5,
            smoothing,
            knots: 10,
        }
    }
}

/// Smoothed series, aligned 1:1 with the input rows.
#[repr(C)]
pub struct SmoothResult {
    /// Smoothed values (NaN where invalid)
    pub values: *mut c_double,
    /// Validity bitmask (bit i indicates if values[i] is valid)
    pub validity: *mut u64,
    /// Number of values
    pub length: size_t,
}

impl Default for SmoothResult {
    fn default() -> Self {
        Self {
            values: std::ptr::null_mut(),
            validity: std::ptr::null_mut(),
            length: 0,
        }
    }
}

/// Per-year transition dates plus the smoothed series.
///
/// Date columns hold day numbers on each year's extended axis and are NaN
/// where the date could not be determined.
#[repr(C)]
pub struct PhenologyResult {
    /// Calendar year of each record
    pub years: *mut c_int,
    /// Start of season (threshold method)
    pub sos: *mut c_double,
    /// Peak of season
    pub pos: *mut c_double,
    /// End of season (threshold method)
    pub eos: *mut c_double,
    /// Growing season length (threshold method)
    pub gsl: *mut c_double,
    /// Start of season (derivative method)
    pub sos_der: *mut c_double,
    /// End of season (derivative method)
    pub eos_der: *mut c_double,
    /// Growing season length (derivative method)
    pub gsl_der: *mut c_double,
    /// Number of records
    pub n_years: size_t,
    /// Smoothed values aligned with the input rows
    pub smoothed: *mut c_double,
    /// Validity bitmask for smoothed values
    pub smoothed_validity: *mut u64,
    /// Number of smoothed values
    pub n_smoothed: size_t,
}

impl Default for PhenologyResult {
    fn default() -> Self {
        Self {
            years: std::ptr::null_mut(),
            sos: std::ptr::null_mut(),
            pos: std::ptr::null_mut(),
            eos: std::ptr::null_mut(),
            gsl: std::ptr::null_mut(),
            sos_der: std::ptr::null_mut(),
            eos_der: std::ptr::null_mut(),
            gsl_der: std::ptr::null_mut(),
            n_years: 0,
            smoothed: std::ptr::null_mut(),
            smoothed_validity: std::ptr::null_mut(),
            n_smoothed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_set_error_truncates() {
        let mut error = AnofoxError::default();
        let long = "x".repeat(400);
        error.set_error(ErrorCode::InvalidInput, &long);
        let msg = unsafe { CStr::from_ptr(error.message.as_ptr()) };
        assert_eq!(msg.to_bytes().len(), 255);
        assert_eq!(error.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_default_options() {
        let opts = PhenologyOptions::default();
        let smoothing = unsafe { CStr::from_ptr(opts.smoothing.as_ptr()) };
        assert_eq!(smoothing.to_str().unwrap(), "integral");
        assert_eq!(opts.threshold, 0.5);
        assert_eq!(opts.knots, 10);
    }

    #[test]
    fn test_error_code_from_core() {
        let e = PhenologyError::InsufficientData { needed: 1, got: 0 };
        assert_eq!(ErrorCode::from(&e), ErrorCode::InsufficientData);
        let e = PhenologyError::InvalidInput("x".into());
        assert_eq!(ErrorCode::from(&e), ErrorCode::InvalidInput);
    }
}
