//! Memory allocation utilities for FFI functions.
//!
//! Output arrays are allocated with `malloc` so the C++ side can hold them
//! until the matching `anofox_free_*` call.

use crate::types::{AnofoxError, ErrorCode};
use core::ffi::c_double;
use std::ptr;

// Memory allocation - use libc on native, std::alloc on WASM
#[cfg(not(target_family = "wasm"))]
use libc::{free, malloc};

#[cfg(target_family = "wasm")]
unsafe fn malloc(size: usize) -> *mut core::ffi::c_void {
    use std::alloc::{alloc, Layout};
    match Layout::from_size_align(size, 8) {
        Ok(layout) => alloc(layout) as *mut core::ffi::c_void,
        Err(_) => ptr::null_mut(),
    }
}

#[cfg(target_family = "wasm")]
unsafe fn free(ptr: *mut core::ffi::c_void) {
    use std::alloc::{dealloc, Layout};
    if !ptr.is_null() {
        if let Ok(layout) = Layout::from_size_align(1, 8) {
            dealloc(ptr as *mut u8, layout);
        }
    }
}

/// Allocate a C array of doubles.
///
/// # Safety
/// Returns null on allocation failure or if n is 0.
#[inline]
pub unsafe fn alloc_double_array(n: usize) -> *mut c_double {
    if n == 0 {
        return ptr::null_mut();
    }
    malloc(n * std::mem::size_of::<c_double>()) as *mut c_double
}

/// Allocate a validity bitmask for n elements.
///
/// # Safety
/// Returns null on allocation failure or if n is 0.
#[inline]
pub unsafe fn alloc_validity(n: usize) -> *mut u64 {
    if n == 0 {
        return ptr::null_mut();
    }
    let n_words = n.div_ceil(64);
    malloc(n_words * std::mem::size_of::<u64>()) as *mut u64
}

/// Allocate and copy an array, setting error on failure.
///
/// # Safety
/// out_ptr and out_error must be valid pointers.
/// Returns true on success, false on allocation failure.
pub unsafe fn alloc_and_copy_array<T: Copy>(
    items: &[T],
    out_ptr: *mut *mut T,
    out_error: *mut AnofoxError,
) -> bool {
    if items.is_empty() {
        *out_ptr = ptr::null_mut();
        return true;
    }

    let ptr = malloc(std::mem::size_of_val(items)) as *mut T;
    if ptr.is_null() {
        if !out_error.is_null() {
            (*out_error).set_error(ErrorCode::AllocationError, "Memory allocation failed");
        }
        return false;
    }

    ptr::copy_nonoverlapping(items.as_ptr(), ptr, items.len());
    *out_ptr = ptr;
    true
}

/// Allocate a value array plus validity bitmask and fill both from
/// `Option<f64>` data.
///
/// # Safety
/// out_values, out_validity and out_error must be valid pointers.
/// Returns true on success, false on allocation failure.
pub unsafe fn alloc_optional_values(
    data: &[Option<f64>],
    out_values: *mut *mut c_double,
    out_validity: *mut *mut u64,
    out_error: *mut AnofoxError,
) -> bool {
    *out_values = ptr::null_mut();
    *out_validity = ptr::null_mut();
    if data.is_empty() {
        return true;
    }

    let values = alloc_double_array(data.len());
    let validity = alloc_validity(data.len());
    if values.is_null() || validity.is_null() {
        free_ptr(values as *mut core::ffi::c_void);
        free_ptr(validity as *mut core::ffi::c_void);
        if !out_error.is_null() {
            (*out_error).set_error(ErrorCode::AllocationError, "Memory allocation failed");
        }
        return false;
    }

    fill_optional_values(values, validity, data);
    *out_values = values;
    *out_validity = validity;
    true
}

/// Free a C pointer using platform-appropriate free function.
///
/// # Safety
/// ptr must be either null or a valid pointer allocated by malloc.
#[inline]
pub unsafe fn free_ptr(ptr: *mut core::ffi::c_void) {
    if !ptr.is_null() {
        free(ptr);
    }
}

/// Macro to free multiple struct fields.
///
/// Usage:
/// ```ignore
/// free_fields!(result, field1, field2, field3);
/// ```
#[macro_export]
macro_rules! free_fields {
    ($result:expr, $($field:ident),+ $(,)?) => {{
        $(
            if !$result.$field.is_null() {
                $crate::allocation::free_ptr($result.$field as *mut core::ffi::c_void);
                $result.$field = std::ptr::null_mut();
            }
        )+
    }};
}

/// Set a validity bit in a bitmask.
///
/// # Safety
/// The validity pointer must be valid and point to an array with sufficient
/// capacity for the given index (at least `index / 64 + 1` u64 words).
#[inline]
pub unsafe fn set_validity_bit(validity: *mut u64, index: usize, is_valid: bool) {
    if validity.is_null() {
        return;
    }
    let word_idx = index / 64;
    let bit_idx = index % 64;
    if is_valid {
        *validity.add(word_idx) |= 1u64 << bit_idx;
    } else {
        *validity.add(word_idx) &= !(1u64 << bit_idx);
    }
}

/// Fill values and validity arrays from `Option<f64>` data.
///
/// # Safety
/// result_values and result_validity must point to arrays of sufficient size.
pub unsafe fn fill_optional_values(
    result_values: *mut c_double,
    result_validity: *mut u64,
    data: &[Option<f64>],
) {
    // Initialize validity to all valid
    if !result_validity.is_null() {
        let n_words = data.len().div_ceil(64);
        for i in 0..n_words {
            *result_validity.add(i) = u64::MAX;
        }
    }

    for (i, v) in data.iter().enumerate() {
        match v {
            Some(val) => {
                *result_values.add(i) = *val;
                set_validity_bit(result_validity, i, true);
            }
            None => {
                *result_values.add(i) = f64::NAN;
                set_validity_bit(result_validity, i, false);
            }
        }
    }
}
