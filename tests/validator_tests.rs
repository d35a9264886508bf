//! Validator Tests
//!
//! These tests verify:
//! - Grades parse as decimals
//! - The [0, 20] range is inclusive at both ends
//! - Non-numeric and non-finite input is rejected with the right error
//! - Empty text fields are rejected

use gradestore::validator::{validate_field, validate_grade, MAX_GRADE, MIN_GRADE};
use gradestore::GradeError;

// =============================================================================
// Grade Tests
// =============================================================================

#[test]
fn test_accepts_integers_and_decimals() {
    assert_eq!(validate_grade("18").unwrap(), 18.0);
    assert_eq!(validate_grade("12.75").unwrap(), 12.75);
    assert_eq!(validate_grade(".5").unwrap(), 0.5);
    assert_eq!(validate_grade("1e1").unwrap(), 10.0);
}

#[test]
fn test_bounds_are_inclusive() {
    assert_eq!(validate_grade("0").unwrap(), MIN_GRADE);
    assert_eq!(validate_grade("20").unwrap(), MAX_GRADE);
    assert_eq!(validate_grade("20.0").unwrap(), MAX_GRADE);
}

#[test]
fn test_edge_whitespace_ignored() {
    assert_eq!(validate_grade("  15 ").unwrap(), 15.0);
    assert_eq!(validate_grade("\t7.5\n").unwrap(), 7.5);
}

#[test]
fn test_out_of_range() {
    for raw in ["21", "20.0001", "-1", "-0.5", "100"] {
        assert!(
            matches!(validate_grade(raw), Err(GradeError::OutOfRange)),
            "{} should be out of range",
            raw
        );
    }
}

#[test]
fn test_not_a_number() {
    for raw in ["", "abc", "18a", "1,5", "dieciocho", "1 8"] {
        assert!(
            matches!(validate_grade(raw), Err(GradeError::NotANumber)),
            "{:?} should not parse",
            raw
        );
    }
}

#[test]
fn test_non_finite_is_out_of_range() {
    assert!(matches!(validate_grade("NaN"), Err(GradeError::OutOfRange)));
    assert!(matches!(validate_grade("inf"), Err(GradeError::OutOfRange)));
    assert!(matches!(validate_grade("-inf"), Err(GradeError::OutOfRange)));
}

#[test]
fn test_every_tenth_in_range_is_accepted() {
    for tenth in 0..=200 {
        let raw = format!("{}.{}", tenth / 10, tenth % 10);
        let grade = validate_grade(&raw).unwrap();
        assert!((MIN_GRADE..=MAX_GRADE).contains(&grade));
    }
}

#[test]
fn test_error_messages() {
    assert_eq!(
        validate_grade("x").unwrap_err().to_string(),
        "La calificación debe ser un número válido"
    );
    assert_eq!(
        validate_grade("21").unwrap_err().to_string(),
        "La calificación debe estar entre 0 y 20"
    );
}

// =============================================================================
// Field Tests
// =============================================================================

#[test]
fn test_field_passes_through_verbatim() {
    assert_eq!(validate_field("Nombre", " Ana ").unwrap(), " Ana ");
}

#[test]
fn test_blank_field_rejected() {
    assert!(matches!(
        validate_field("Nombre", ""),
        Err(GradeError::MissingField("Nombre"))
    ));
    assert!(matches!(
        validate_field("Materia", "   "),
        Err(GradeError::MissingField("Materia"))
    ));
}
