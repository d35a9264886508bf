//! Client
//!
//! Opens one connection per command, matching the server's
//! one-command-per-connection contract.

use std::net::TcpStream;
use std::time::Duration;

use crate::error::{GradeError, Result};
use crate::protocol::{read_response, write_request, Command, Response};

/// Client for a gradestore server
#[derive(Debug, Clone)]
pub struct Client {
    /// Server address (host:port)
    addr: String,

    /// Read/write timeout on each connection
    timeout: Option<Duration>,
}

impl Client {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: None,
        }
    }

    /// Bound every read and write by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send a command and wait for its response
    pub fn send(&self, command: &Command) -> Result<Response> {
        self.send_raw(&command.to_string())
    }

    /// Send raw command text
    pub fn send_raw(&self, raw: &str) -> Result<Response> {
        let mut stream = self.connect()?;
        write_request(&mut stream, raw)?;
        read_response(&mut stream)
    }

    /// Like [`Client::send`], but a transport failure becomes an `error`
    /// response instead of an `Err`
    pub fn request(&self, command: &Command) -> Response {
        self.send(command).unwrap_or_else(|e| {
            tracing::debug!("Request to {} failed: {}", self.addr, e);
            Response::error(e.to_string())
        })
    }

    // =========================================================================
    // Command helpers
    // =========================================================================

    pub fn add(
        &self,
        student_id: &str,
        student_name: &str,
        subject: &str,
        grade: &str,
    ) -> Result<Response> {
        self.send(&Command::Add {
            student_id: student_id.to_string(),
            student_name: student_name.to_string(),
            subject: subject.to_string(),
            grade: grade.to_string(),
        })
    }

    pub fn find(&self, student_id: &str) -> Result<Response> {
        self.send(&Command::Find {
            student_id: student_id.to_string(),
        })
    }

    pub fn update(&self, student_id: &str, subject: &str, grade: &str) -> Result<Response> {
        self.send(&Command::Update {
            student_id: student_id.to_string(),
            subject: subject.to_string(),
            grade: grade.to_string(),
        })
    }

    pub fn list(&self) -> Result<Response> {
        self.send(&Command::List)
    }

    pub fn delete(&self, student_id: &str) -> Result<Response> {
        self.send(&Command::Delete {
            student_id: student_id.to_string(),
        })
    }

    pub fn check_id(&self, student_id: &str) -> Result<Response> {
        self.send(&Command::CheckId {
            student_id: student_id.to_string(),
        })
    }

    /// Name already stored for `student_id`, if any
    ///
    /// Lets a caller reuse the registered name when adding a new subject.
    pub fn existing_name(&self, student_id: &str) -> Result<Option<String>> {
        let response = self.find(student_id)?;
        Ok(response
            .data
            .and_then(|records| records.into_iter().next())
            .map(|record| record.student_name))
    }

    fn connect(&self) -> Result<TcpStream> {
        let stream = TcpStream::connect(&self.addr)
            .map_err(|e| GradeError::ConnectionFailure(format!("{}: {}", self.addr, e)))?;

        if let Some(timeout) = self.timeout {
            stream.set_read_timeout(Some(timeout))?;
            stream.set_write_timeout(Some(timeout))?;
        }
        Ok(stream)
    }
}
