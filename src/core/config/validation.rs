//! Validation helper functions for configuration types.

use crate::core::errors::{Result, ThememinerError};

/// Validate that a usize value is greater than zero.
pub fn validate_positive_usize(value: usize, field: &str) -> Result<()> {
    if value == 0 {
        return Err(ThememinerError::validation_field(
            format!("{} must be greater than 0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that a u64 value is greater than zero.
pub fn validate_positive_u64(value: u64, field: &str) -> Result<()> {
    if value == 0 {
        return Err(ThememinerError::validation_field(
            format!("{} must be greater than 0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that a u32 value is greater than zero.
pub fn validate_positive_u32(value: u32, field: &str) -> Result<()> {
    if value == 0 {
        return Err(ThememinerError::validation_field(
            format!("{} must be greater than 0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that a usize value is within a bounded range (inclusive).
pub fn validate_bounded_usize(value: usize, min: usize, max: usize, field: &str) -> Result<()> {
    if value < min || value > max {
        return Err(ThememinerError::validation_field(
            format!("{} must be between {} and {}", field, min, max),
            field,
        ));
    }
    Ok(())
}

/// Validate that a string is not blank.
pub fn validate_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ThememinerError::validation_field(
            format!("{} must not be empty", field),
            field,
        ));
    }
    Ok(())
}
