//! Validator
//!
//! Value checks applied to every command before the store is touched.

use crate::error::{GradeError, Result};

/// Lowest accepted grade
pub const MIN_GRADE: f64 = 0.0;

/// Highest accepted grade
pub const MAX_GRADE: f64 = 20.0;

/// Parse and range-check a raw grade
///
/// Edge whitespace is ignored. NaN and infinities parse but are out of range.
pub fn validate_grade(raw: &str) -> Result<f64> {
    let grade: f64 = raw.trim().parse().map_err(|_| GradeError::NotANumber)?;

    if (MIN_GRADE..=MAX_GRADE).contains(&grade) {
        Ok(grade)
    } else {
        Err(GradeError::OutOfRange)
    }
}

/// Reject an empty text field
pub fn validate_field<'a>(label: &'static str, raw: &'a str) -> Result<&'a str> {
    if raw.trim().is_empty() {
        return Err(GradeError::MissingField(label));
    }
    Ok(raw)
}
