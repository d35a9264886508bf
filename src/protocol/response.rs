//! Response definitions
//!
//! Represents responses to clients. A response serializes to one JSON object:
//!
//! ```text
//! {"status": "ok", "mensaje": "ID disponible"}
//! {"status": "ok", "data": [{"ID_Estudiante": "S1", ...}], "count": 1}
//! {"status": "not_found", "mensaje": "ID S2 no encontrado"}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::GradeError;
use crate::store::GradeRecord;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Error,
    NotFound,
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Human-readable outcome (non-data responses)
    #[serde(rename = "mensaje", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Records (find and list responses)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<GradeRecord>>,

    /// Record count (list responses)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl Response {
    /// Create an OK response carrying a message
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            message: Some(message.into()),
            data: None,
            count: None,
        }
    }

    /// Create an OK response carrying records
    pub fn records(data: Vec<GradeRecord>) -> Self {
        Self {
            status: Status::Ok,
            message: None,
            data: Some(data),
            count: None,
        }
    }

    /// Create an OK response carrying the whole table and its size
    pub fn listing(data: Vec<GradeRecord>) -> Self {
        Self {
            status: Status::Ok,
            message: None,
            count: Some(data.len()),
            data: Some(data),
        }
    }

    /// Create a NOT_FOUND response
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: Status::NotFound,
            message: Some(message.into()),
            data: None,
            count: None,
        }
    }

    /// Create an ERROR response
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
            data: None,
            count: None,
        }
    }

    /// Map a failure to its response
    pub fn from_error(err: &GradeError) -> Self {
        if err.is_not_found() {
            Self::not_found(err.to_string())
        } else {
            Self::error(err.to_string())
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Message text, or empty
    pub fn text(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}
