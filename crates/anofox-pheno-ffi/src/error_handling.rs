//! Standardized error handling utilities for FFI functions.
//!
//! Every exported function initializes the error out-parameter, checks its
//! pointers, and runs the core call inside [`ffi_try`].

use crate::types::{AnofoxError, ErrorCode};
use anofox_pheno_core::PhenologyError;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Initialize error output to success state.
///
/// # Safety
/// The error pointer must be valid if non-null.
#[inline]
pub unsafe fn init_error(out_error: *mut AnofoxError) {
    if !out_error.is_null() {
        *out_error = AnofoxError::success();
    }
}

/// Set an error on the output error pointer.
///
/// # Safety
/// The error pointer must be valid if non-null.
#[inline]
pub unsafe fn set_error(out_error: *mut AnofoxError, code: ErrorCode, message: &str) {
    if !out_error.is_null() {
        (*out_error).set_error(code, message);
    }
}

/// Check if any of the given pointers are null, and set an error if so.
///
/// # Safety
/// The error pointer must be valid if non-null.
#[inline]
pub unsafe fn check_null_pointers(
    out_error: *mut AnofoxError,
    ptrs: &[*const core::ffi::c_void],
) -> bool {
    for ptr in ptrs {
        if ptr.is_null() {
            set_error(out_error, ErrorCode::NullPointer, "Null pointer argument");
            return true;
        }
    }
    false
}

/// Run a core call, translating its error or a panic into the error output.
///
/// The error code follows the core error variant, so callers can tell bad
/// input apart from a failed computation.
///
/// # Safety
/// The error pointer must be valid if non-null.
///
/// # Returns
/// `Some(value)` on success, `None` on error
pub unsafe fn ffi_try<F, T>(out_error: *mut AnofoxError, f: F) -> Option<T>
where
    F: FnOnce() -> Result<T, PhenologyError>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            set_error(out_error, ErrorCode::from(&e), &e.to_string());
            None
        }
        Err(_) => {
            set_error(out_error, ErrorCode::PanicCaught, "Panic in Rust code");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_error() {
        let mut error = AnofoxError::default();
        error.code = ErrorCode::InternalError;
        unsafe {
            init_error(&mut error);
        }
        assert_eq!(error.code, ErrorCode::Success);
    }

    #[test]
    fn test_set_error() {
        let mut error = AnofoxError::default();
        unsafe {
            set_error(&mut error, ErrorCode::NullPointer, "test error");
        }
        assert_eq!(error.code, ErrorCode::NullPointer);
    }

    #[test]
    fn test_check_null_pointers() {
        let mut error = AnofoxError::default();
        let value = 1.0f64;
        let ptrs = [&value as *const f64 as *const core::ffi::c_void, std::ptr::null()];
        unsafe {
            assert!(!check_null_pointers(&mut error, &ptrs[..1]));
            assert!(check_null_pointers(&mut error, &ptrs));
        }
        assert_eq!(error.code, ErrorCode::NullPointer);
    }

    #[test]
    fn test_ffi_try_success() {
        let mut error = AnofoxError::default();
        let result = unsafe { ffi_try(&mut error, || Ok::<_, PhenologyError>(42)) };
        assert_eq!(result, Some(42));
        assert_eq!(error.code, ErrorCode::Success);
    }

    #[test]
    fn test_ffi_try_error_keeps_code() {
        let mut error = AnofoxError::default();
        let result = unsafe {
            ffi_try(&mut error, || {
                Err::<i32, _>(PhenologyError::InvalidInput("test".to_string()))
            })
        };
        assert_eq!(result, None);
        assert_eq!(error.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_ffi_try_panic() {
        let mut error = AnofoxError::default();
        let result = unsafe {
            ffi_try(&mut error, || -> Result<i32, PhenologyError> {
                panic!("boom");
            })
        };
        assert_eq!(result, None);
        assert_eq!(error.code, ErrorCode::PanicCaught);
    }
}
