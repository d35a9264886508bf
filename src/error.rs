//! Error types for gradestore
//!
//! Provides a unified error type for all operations. The `Display` text of
//! the request-level variants is exactly what clients see in the `mensaje`
//! field of an error response.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using GradeError
pub type Result<T> = std::result::Result<T, GradeError>;

/// Unified error type for gradestore operations
#[derive(Debug, Error)]
pub enum GradeError {
    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    #[error("Comando inválido: {0}")]
    InvalidCommand(String),

    #[error("Comando vacío")]
    EmptyCommand,

    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    #[error("La calificación debe ser un número válido")]
    NotANumber,

    #[error("La calificación debe estar entre 0 y 20")]
    OutOfRange,

    #[error("El campo {0} no puede estar vacío")]
    MissingField(&'static str),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Ya existe una calificación para {name} en {subject}")]
    DuplicateKey { name: String, subject: String },

    #[error("El ID {id} ya está registrado para {existing}")]
    NameMismatch { id: String, existing: String },

    #[error("ID {id} ya existe para: {name}")]
    IdTaken { id: String, name: String },

    /// Carries the full client-facing message
    #[error("{0}")]
    NotFound(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Error de almacenamiento: {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error de almacenamiento: tabla corrupta en la línea {line}: {reason}")]
    CorruptTable { line: usize, reason: String },

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error de comunicación: {0}")]
    Protocol(String),

    #[error("Error de conexión: {0}")]
    ConnectionFailure(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GradeError {
    /// Wrap an I/O failure on the table file
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GradeError::Storage {
            path: path.into(),
            source,
        }
    }

    /// Whether this error maps to a `not_found` response
    pub fn is_not_found(&self) -> bool {
        matches!(self, GradeError::NotFound(_))
    }
}
