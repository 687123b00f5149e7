//! Error types for the phenology library.

use thiserror::Error;

/// Result type for phenology operations.
pub type Result<T> = std::result::Result<T, PhenologyError>;

/// Invocation-level errors.
///
/// Per-year outcomes (excluded years, flat signals, unresolved cases) are not
/// errors; they show up as missing fields in the output table.
#[derive(Error, Debug)]
pub enum PhenologyError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),

    #[error("Invalid parameter '{param}' = '{value}': {reason}")]
    InvalidParameter {
        param: String,
        value: String,
        reason: String,
    },
}

impl PhenologyError {
    /// Convert to an error code for FFI.
    pub fn to_code(&self) -> i32 {
        match self {
            PhenologyError::InvalidInput(_) => 2,
            PhenologyError::ComputationError(_) => 3,
            PhenologyError::InsufficientData { .. } => 6,
            PhenologyError::InvalidDateFormat(_) => 7,
            PhenologyError::InvalidParameter { .. } => 8,
        }
    }

    pub(crate) fn invalid_parameter(
        param: &str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        PhenologyError::InvalidParameter {
            param: param.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_conversion() {
        assert_eq!(PhenologyError::InvalidInput("test".into()).to_code(), 2);
        assert_eq!(PhenologyError::ComputationError("test".into()).to_code(), 3);
        assert_eq!(
            PhenologyError::InsufficientData { needed: 20, got: 5 }.to_code(),
            6
        );
        assert_eq!(PhenologyError::InvalidDateFormat("test".into()).to_code(), 7);
        assert_eq!(
            PhenologyError::invalid_parameter("knots", 0, "must be positive").to_code(),
            8
        );
    }

    #[test]
    fn test_error_display() {
        let err = PhenologyError::InvalidInput("duplicate day 2001-031".into());
        assert_eq!(format!("{}", err), "Invalid input: duplicate day 2001-031");

        let err = PhenologyError::InsufficientData { needed: 20, got: 3 };
        assert_eq!(
            format!("{}", err),
            "Insufficient data: need at least 20 observations, got 3"
        );

        let err = PhenologyError::invalid_parameter("threshold", 1.5, "must be in (0, 1)");
        assert_eq!(
            format!("{}", err),
            "Invalid parameter 'threshold' = '1.5': must be in (0, 1)"
        );
    }

    #[test]
    fn test_invalid_parameter_fields() {
        let err = PhenologyError::invalid_parameter("knots", 0, "must be positive");
        if let PhenologyError::InvalidParameter {
            param,
            value,
            reason,
        } = err
        {
            assert_eq!(param, "knots");
            assert_eq!(value, "0");
            assert_eq!(reason, "must be positive");
        } else {
            panic!("Expected InvalidParameter variant");
        }
    }
}
