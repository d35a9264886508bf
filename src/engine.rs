//! Engine Module
//!
//! The command interpreter that coordinates validation and storage.
//!
//! ## Responsibilities
//! - Open the data directory and the record store
//! - Validate command arguments before any mutation
//! - Dispatch commands to the record store
//! - Turn every outcome, success or failure, into a response

use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{GradeError, Result};
use crate::protocol::{Command, Response};
use crate::store::{format_grade, GradeRecord, RecordStore};
use crate::validator::{validate_field, validate_grade};

/// Successful outcome of a command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Confirmation text
    Message(String),

    /// Matching records (search)
    Records(Vec<GradeRecord>),

    /// The whole table (list)
    Listing(Vec<GradeRecord>),
}

impl From<Reply> for Response {
    fn from(reply: Reply) -> Self {
        match reply {
            Reply::Message(message) => Response::ok(message),
            Reply::Records(records) => Response::records(records),
            Reply::Listing(records) => Response::listing(records),
        }
    }
}

/// The grade engine
///
/// Stateless apart from the store; all locking happens inside
/// [`RecordStore`], so an `Engine` can be shared across connection threads
/// behind an `Arc`.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// The grade table
    store: RecordStore,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data directory if missing
    /// 2. Open the table (creating it with only a header if absent)
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)
            .map_err(|e| GradeError::storage(&config.data_dir, e))?;

        let store = RecordStore::open(config.table_path(), config.store_options())?;

        Ok(Self { config, store })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Parse and execute raw command text
    ///
    /// Never fails: errors become `error`/`not_found` responses.
    pub fn process(&self, raw: &str) -> Response {
        let outcome = Command::parse(raw).and_then(|command| {
            tracing::trace!("Executing {:?}", command);
            self.execute(command)
        });

        match outcome {
            Ok(reply) => reply.into(),
            Err(e) => {
                tracing::debug!("Command failed: {}", e);
                Response::from_error(&e)
            }
        }
    }

    /// Execute a command
    ///
    /// Routes commands to appropriate handlers
    pub fn execute(&self, command: Command) -> Result<Reply> {
        match command {
            Command::Add {
                student_id,
                student_name,
                subject,
                grade,
            } => self.add(&student_id, &student_name, &subject, &grade),
            Command::Find { student_id } => self.find(&student_id),
            Command::Update {
                student_id,
                subject,
                grade,
            } => self.update(&student_id, &subject, &grade),
            Command::List => Ok(Reply::Listing(self.store.list_all())),
            Command::Delete { student_id } => self.delete(&student_id),
            Command::CheckId { student_id } => self.check_id(&student_id),
        }
    }

    /// Insert a grade
    ///
    /// Steps:
    /// 1. Validate the grade, then the text fields
    /// 2. Insert (the store enforces the natural key)
    pub fn add(
        &self,
        student_id: &str,
        student_name: &str,
        subject: &str,
        grade: &str,
    ) -> Result<Reply> {
        let grade = validate_grade(grade)?;
        let student_id = validate_field("ID_Estudiante", student_id)?;
        let student_name = validate_field("Nombre", student_name)?;
        let subject = validate_field("Materia", subject)?;

        let record = self
            .store
            .insert(GradeRecord::new(student_id, student_name, subject, grade))?;

        Ok(Reply::Message(format!(
            "Calificación agregada para {} en {}",
            record.student_name, record.subject
        )))
    }

    /// All grades of a student
    pub fn find(&self, student_id: &str) -> Result<Reply> {
        self.store.find_by_id(student_id).map(Reply::Records)
    }

    /// Change the grade of one (student, subject)
    pub fn update(&self, student_id: &str, subject: &str, grade: &str) -> Result<Reply> {
        let grade = validate_grade(grade)?;
        let record = self.store.update(student_id, subject, grade)?;

        Ok(Reply::Message(format!(
            "Calificación actualizada a {} en {}",
            format_grade(record.grade),
            subject
        )))
    }

    /// Remove every grade of a student
    pub fn delete(&self, student_id: &str) -> Result<Reply> {
        self.store.delete(student_id)?;
        Ok(Reply::Message(format!(
            "Registros eliminados para ID {}",
            student_id
        )))
    }

    /// Report whether an id is free
    ///
    /// A taken id is an `IdTaken` error carrying the stored name, so a client
    /// can reuse that name for a new subject.
    pub fn check_id(&self, student_id: &str) -> Result<Reply> {
        match self.store.check_id(student_id) {
            Some(name) => Err(GradeError::IdTaken {
                id: student_id.to_string(),
                name,
            }),
            None => Ok(Reply::Message("ID disponible".to_string())),
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the record store
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
