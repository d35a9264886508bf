//! Table codec
//!
//! Encoding and decoding of the comma-delimited table file.
//!
//! Fields holding a comma, a quote or a line break are wrapped in `"` with
//! inner quotes doubled. The reader accepts LF or CRLF endings, quoted fields
//! spanning lines, a leading BOM, and skips blank lines.

use std::collections::HashSet;

use crate::error::{GradeError, Result};
use crate::validator::validate_grade;

use super::record::{format_grade, GradeRecord};

/// Column names, in file order
pub const HEADER: [&str; 4] = ["ID_Estudiante", "Nombre", "Materia", "Calificación"];

const FIELD_COUNT: usize = HEADER.len();

// =============================================================================
// Encoding
// =============================================================================

/// Encode the whole table (header + rows)
pub fn encode_table(records: &[GradeRecord]) -> String {
    let mut out = String::with_capacity(64 + records.len() * 32);
    out.push_str(&HEADER.join(","));
    out.push('\n');

    for record in records {
        let grade = format_grade(record.grade);
        let fields = [
            record.student_id.as_str(),
            record.student_name.as_str(),
            record.subject.as_str(),
            grade.as_str(),
        ];
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            push_field(&mut out, field);
        }
        out.push('\n');
    }

    out
}

fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a table file
///
/// A zero-length file decodes to an empty table. Rows are held to the same
/// rules as commands: grades in range, one row per (id, subject).
pub fn decode_table(text: &str) -> Result<Vec<GradeRecord>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rows = split_rows(text)?.into_iter();

    let Some((line, header)) = rows.next() else {
        return Ok(Vec::new());
    };
    if header.iter().map(String::as_str).ne(HEADER.iter().copied()) {
        return Err(GradeError::CorruptTable {
            line,
            reason: format!("unexpected header {:?}", header),
        });
    }

    let mut keys = HashSet::new();
    let mut records = Vec::new();
    for (line, fields) in rows {
        let record = decode_record(line, fields)?;
        if !keys.insert((record.student_id.clone(), record.subject.to_lowercase())) {
            return Err(GradeError::CorruptTable {
                line,
                reason: format!(
                    "duplicate grade for {} in {}",
                    record.student_id, record.subject
                ),
            });
        }
        records.push(record);
    }

    Ok(records)
}

fn decode_record(line: usize, fields: Vec<String>) -> Result<GradeRecord> {
    let [student_id, student_name, subject, raw_grade]: [String; FIELD_COUNT] =
        fields
            .try_into()
            .map_err(|fields: Vec<String>| GradeError::CorruptTable {
                line,
                reason: format!("expected {} fields, found {}", FIELD_COUNT, fields.len()),
            })?;

    let grade = validate_grade(&raw_grade).map_err(|e| GradeError::CorruptTable {
        line,
        reason: format!("invalid grade {:?}: {}", raw_grade, e),
    })?;

    Ok(GradeRecord {
        student_id,
        student_name,
        subject,
        grade,
    })
}

/// Split text into rows of fields, tagged with the line each row starts on
fn split_rows(text: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_start = 1;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                push_row(&mut rows, std::mem::take(&mut row), row_start);
                line += 1;
                row_start = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(GradeError::CorruptTable {
            line: row_start,
            reason: "unterminated quoted field".to_string(),
        });
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        push_row(&mut rows, row, row_start);
    }

    Ok(rows)
}

fn push_row(rows: &mut Vec<(usize, Vec<String>)>, row: Vec<String>, line: usize) {
    // blank line
    if row.len() == 1 && row[0].is_empty() {
        return;
    }
    rows.push((line, row));
}
