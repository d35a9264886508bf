//! Grade record
//!
//! One (student, subject, grade) row of the table.

use serde::{Deserialize, Serialize};

/// A single stored grade
///
/// Serialized with the column names of the table header, which are also the
/// keys clients see in `data` arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    #[serde(rename = "ID_Estudiante")]
    pub student_id: String,

    #[serde(rename = "Nombre")]
    pub student_name: String,

    #[serde(rename = "Materia")]
    pub subject: String,

    #[serde(rename = "Calificación")]
    pub grade: f64,
}

impl GradeRecord {
    pub fn new(
        student_id: impl Into<String>,
        student_name: impl Into<String>,
        subject: impl Into<String>,
        grade: f64,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            student_name: student_name.into(),
            subject: subject.into(),
            grade,
        }
    }

    /// Natural key match: exact id, case-insensitive subject
    pub fn matches_key(&self, student_id: &str, subject: &str) -> bool {
        self.student_id == student_id && same_subject(&self.subject, subject)
    }
}

/// Subjects compare case-insensitively
pub(crate) fn same_subject(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Text form of a grade, as written to the table and into messages
///
/// Always carries a fractional part (`18.0`, `18.5`).
pub fn format_grade(grade: f64) -> String {
    format!("{:?}", grade)
}
