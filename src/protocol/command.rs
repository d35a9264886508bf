//! Command definitions
//!
//! Represents commands from clients and parses their wire text.

use std::fmt;
use std::str::FromStr;

use crate::error::{GradeError, Result};

/// Field separator on the wire
pub const SEPARATOR: char = '|';

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Add,
    Find,
    Update,
    List,
    Delete,
    CheckId,
}

impl CommandType {
    pub const ALL: [CommandType; 6] = [
        CommandType::Add,
        CommandType::Find,
        CommandType::Update,
        CommandType::List,
        CommandType::Delete,
        CommandType::CheckId,
    ];

    /// Wire keyword
    pub fn keyword(self) -> &'static str {
        match self {
            CommandType::Add => "AGREGAR",
            CommandType::Find => "BUSCAR",
            CommandType::Update => "ACTUALIZAR",
            CommandType::List => "LISTAR",
            CommandType::Delete => "ELIMINAR",
            CommandType::CheckId => "VERIFICAR_ID",
        }
    }

    /// Number of arguments after the keyword
    pub fn arity(self) -> usize {
        match self {
            CommandType::Add => 4,
            CommandType::Update => 3,
            CommandType::Find | CommandType::Delete | CommandType::CheckId => 1,
            CommandType::List => 0,
        }
    }

    /// Keywords are case-sensitive
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.keyword() == keyword)
    }
}

/// A parsed command
///
/// Grades stay raw text here; the engine validates them before dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Insert a grade for a student in a subject
    Add {
        student_id: String,
        student_name: String,
        subject: String,
        grade: String,
    },

    /// All grades of a student
    Find { student_id: String },

    /// Change the grade of one (student, subject)
    Update {
        student_id: String,
        subject: String,
        grade: String,
    },

    /// The whole table
    List,

    /// Remove every grade of a student
    Delete { student_id: String },

    /// Whether a student id is already taken
    CheckId { student_id: String },
}

impl Command {
    /// Parse wire text
    ///
    /// Only whitespace at the edges of the whole string is trimmed; fields are
    /// taken verbatim. An `InvalidCommand` error carries `raw` untouched.
    pub fn parse(raw: &str) -> Result<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(GradeError::EmptyCommand);
        }

        let invalid = || GradeError::InvalidCommand(raw.to_string());

        let mut parts = text.split(SEPARATOR);
        let keyword = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        let command_type = CommandType::from_keyword(keyword).ok_or_else(invalid)?;
        if args.len() != command_type.arity() {
            return Err(invalid());
        }

        let command = match (command_type, args.as_slice()) {
            (CommandType::Add, [id, name, subject, grade]) => Command::Add {
                student_id: id.to_string(),
                student_name: name.to_string(),
                subject: subject.to_string(),
                grade: grade.to_string(),
            },
            (CommandType::Find, [id]) => Command::Find {
                student_id: id.to_string(),
            },
            (CommandType::Update, [id, subject, grade]) => Command::Update {
                student_id: id.to_string(),
                subject: subject.to_string(),
                grade: grade.to_string(),
            },
            (CommandType::List, []) => Command::List,
            (CommandType::Delete, [id]) => Command::Delete {
                student_id: id.to_string(),
            },
            (CommandType::CheckId, [id]) => Command::CheckId {
                student_id: id.to_string(),
            },
            _ => return Err(invalid()),
        };

        Ok(command)
    }

    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Add { .. } => CommandType::Add,
            Command::Find { .. } => CommandType::Find,
            Command::Update { .. } => CommandType::Update,
            Command::List => CommandType::List,
            Command::Delete { .. } => CommandType::Delete,
            Command::CheckId { .. } => CommandType::CheckId,
        }
    }

    /// Whether executing this command rewrites the table
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::Add { .. } | Command::Update { .. } | Command::Delete { .. }
        )
    }
}

impl FromStr for Command {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self> {
        Command::parse(s)
    }
}

/// Wire text, e.g. `AGREGAR|S1|Ana|Math|18`
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command_type().keyword())?;

        let args: Vec<&str> = match self {
            Command::Add {
                student_id,
                student_name,
                subject,
                grade,
            } => vec![
                student_id.as_str(),
                student_name.as_str(),
                subject.as_str(),
                grade.as_str(),
            ],
            Command::Find { student_id }
            | Command::Delete { student_id }
            | Command::CheckId { student_id } => vec![student_id.as_str()],
            Command::Update {
                student_id,
                subject,
                grade,
            } => vec![student_id.as_str(), subject.as_str(), grade.as_str()],
            Command::List => Vec::new(),
        };

        for arg in args {
            write!(f, "{}{}", SEPARATOR, arg)?;
        }
        Ok(())
    }
}
