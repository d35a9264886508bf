//! Record Store
//!
//! The single owner of the grade table.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::config::NamePolicy;
use crate::error::{GradeError, Result};

use super::codec::{decode_table, encode_table};
use super::record::GradeRecord;

/// Behavior knobs for a [`RecordStore`]
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// Name consistency rule applied on insert
    pub name_policy: NamePolicy,

    /// fsync the rewritten file before it replaces the old one
    pub sync_writes: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            name_policy: NamePolicy::Permissive,
            sync_writes: true,
        }
    }
}

/// Grade table held in memory and mirrored to a file
///
/// ## Concurrency: Single-Writer / Multiple-Reader
///
/// - **Reads** (find/list/check): share the `rows` read lock
/// - **Writes** (insert/update/delete): hold the `rows` write lock across
///   the whole mutate → rewrite file → publish sequence, so no two
///   read-modify-write cycles interleave
///
/// ## Flush Policy: write-through
///
/// Each mutation rewrites the full table to `<file>.tmp` and renames it over
/// the table file. A failed write leaves both the file and the in-memory
/// table as they were.
pub struct RecordStore {
    /// Table file location
    path: PathBuf,

    options: StoreOptions,

    /// Records in insertion order
    rows: RwLock<Vec<GradeRecord>>,
}

impl RecordStore {
    /// Open the table at `path`, creating it (header only) if absent
    pub fn open(path: impl Into<PathBuf>, options: StoreOptions) -> Result<Self> {
        let path = path.into();

        let rows = match fs::read_to_string(&path) {
            Ok(text) if text.is_empty() => {
                write_table(&path, &[], options.sync_writes)?;
                Vec::new()
            }
            Ok(text) => decode_table(&text)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                write_table(&path, &[], options.sync_writes)?;
                tracing::info!("Created table file {}", path.display());
                Vec::new()
            }
            Err(e) => return Err(GradeError::storage(&path, e)),
        };

        tracing::debug!("Loaded {} records from {}", rows.len(), path.display());

        Ok(Self {
            path,
            options,
            rows: RwLock::new(rows),
        })
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Append a record unless its (id, subject) already exists
    pub fn insert(&self, record: GradeRecord) -> Result<GradeRecord> {
        let mut rows = self.rows.write();

        if let Some(existing) = rows
            .iter()
            .find(|r| r.matches_key(&record.student_id, &record.subject))
        {
            return Err(GradeError::DuplicateKey {
                name: existing.student_name.clone(),
                subject: record.subject,
            });
        }

        if self.options.name_policy == NamePolicy::Strict {
            if let Some(existing) = rows.iter().find(|r| {
                r.student_id == record.student_id && r.student_name != record.student_name
            }) {
                return Err(GradeError::NameMismatch {
                    id: record.student_id,
                    existing: existing.student_name.clone(),
                });
            }
        }

        rows.push(record.clone());
        if let Err(e) = self.persist(&rows) {
            rows.pop();
            return Err(e);
        }

        tracing::debug!(
            "Inserted {}/{} ({} records)",
            record.student_id,
            record.subject,
            rows.len()
        );
        Ok(record)
    }

    /// Replace the grade of one (id, subject) record in place
    pub fn update(&self, student_id: &str, subject: &str, grade: f64) -> Result<GradeRecord> {
        let mut rows = self.rows.write();

        let Some(index) = rows.iter().position(|r| r.matches_key(student_id, subject)) else {
            return Err(GradeError::NotFound(format!(
                "No se encontró la materia {} para ID {}",
                subject, student_id
            )));
        };

        let previous = std::mem::replace(&mut rows[index].grade, grade);
        if let Err(e) = self.persist(&rows) {
            rows[index].grade = previous;
            return Err(e);
        }

        tracing::debug!("Updated {}/{}: {} -> {}", student_id, subject, previous, grade);
        Ok(rows[index].clone())
    }

    /// Remove every record of a student, returning how many were removed
    pub fn delete(&self, student_id: &str) -> Result<usize> {
        let mut rows = self.rows.write();

        let remaining: Vec<GradeRecord> = rows
            .iter()
            .filter(|r| r.student_id != student_id)
            .cloned()
            .collect();

        let removed = rows.len() - remaining.len();
        if removed == 0 {
            return Err(GradeError::NotFound(format!(
                "ID {} no encontrado",
                student_id
            )));
        }

        self.persist(&remaining)?;
        *rows = remaining;

        tracing::debug!("Deleted {} records for {}", removed, student_id);
        Ok(removed)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All records of a student, in storage order
    pub fn find_by_id(&self, student_id: &str) -> Result<Vec<GradeRecord>> {
        let found: Vec<GradeRecord> = self
            .rows
            .read()
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect();

        if found.is_empty() {
            return Err(GradeError::NotFound(format!(
                "ID {} no encontrado",
                student_id
            )));
        }
        Ok(found)
    }

    /// The whole table, in storage order
    pub fn list_all(&self) -> Vec<GradeRecord> {
        self.rows.read().clone()
    }

    /// Name stored for a student id (first match), if the id is taken
    pub fn check_id(&self, student_id: &str) -> Option<String> {
        self.rows
            .read()
            .iter()
            .find(|r| r.student_id == student_id)
            .map(|r| r.student_name.clone())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Table file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Rewrite the file with `rows` (caller holds the write lock)
    fn persist(&self, rows: &[GradeRecord]) -> Result<()> {
        write_table(&self.path, rows, self.options.sync_writes)
    }
}

/// Write the full table to a sibling temp file, then rename it into place
fn write_table(path: &Path, rows: &[GradeRecord], sync: bool) -> Result<()> {
    let tmp = temp_path(path);
    let encoded = encode_table(rows);

    let write = || -> std::io::Result<()> {
        let mut file = File::create(&tmp)?;
        file.write_all(encoded.as_bytes())?;
        if sync {
            file.sync_all()?;
        }
        fs::rename(&tmp, path)
    };

    write().map_err(|e| {
        let _ = fs::remove_file(&tmp);
        GradeError::storage(path, e)
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("table"));
    name.push(".tmp");
    path.with_file_name(name)
}
