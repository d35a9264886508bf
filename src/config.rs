//! Configuration for gradestore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{GradeError, Result};
use crate::store::StoreOptions;

/// File name of the grade table inside `data_dir`
pub const TABLE_FILENAME: &str = "calificaciones.csv";

/// Main configuration for a gradestore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the table file
    ///   {data_dir}/
    ///     └── calificaciones.csv
    pub data_dir: PathBuf,

    /// fsync the rewritten table before it replaces the old one
    pub sync_writes: bool,

    /// Whether one id may carry different names across subjects
    pub name_policy: NamePolicy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// How accepted connections are scheduled
    pub concurrency: ConcurrencyMode,

    /// Max connections queued for the worker pool (pooled mode only)
    pub max_connections: usize,

    /// How a request is delimited on the socket
    pub framing: FramingMode,

    /// Largest accepted command in bytes
    pub max_command_size: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

/// Connection scheduling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyMode {
    /// Accept one connection, serve it fully, then accept the next
    Sequential,

    /// Hand connections to a fixed pool of worker threads
    Pooled { workers: usize },
}

/// Request framing on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingMode {
    /// Request ends at the first `\n`, at end of stream, or at a read
    /// timeout once some bytes arrived
    Line,

    /// One `read` call of at most `max_command_size` bytes; a trailing `\n`
    /// is dropped
    SingleRead,
}

/// Name consistency rule for records sharing a student id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamePolicy {
    /// Any name is accepted for a new subject
    #[default]
    Permissive,

    /// A new subject must reuse the name already stored for the id
    Strict,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            sync_writes: true,
            name_policy: NamePolicy::Permissive,
            listen_addr: "127.0.0.1:12345".to_string(),
            concurrency: ConcurrencyMode::Sequential,
            max_connections: 1024,
            framing: FramingMode::SingleRead,
            max_command_size: 4096,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Full path of the table file
    pub fn table_path(&self) -> PathBuf {
        self.data_dir.join(TABLE_FILENAME)
    }

    /// Options handed to the record store
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            name_policy: self.name_policy,
            sync_writes: self.sync_writes,
        }
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_command_size == 0 {
            return Err(GradeError::Config(
                "max_command_size must be greater than 0".to_string(),
            ));
        }
        if let ConcurrencyMode::Pooled { workers } = self.concurrency {
            if workers == 0 {
                return Err(GradeError::Config(
                    "pooled mode needs at least one worker".to_string(),
                ));
            }
            if self.max_connections == 0 {
                return Err(GradeError::Config(
                    "max_connections must be greater than 0".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Enable or disable fsync on every table rewrite
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.config.sync_writes = sync;
        self
    }

    /// Set the name policy
    pub fn name_policy(mut self, policy: NamePolicy) -> Self {
        self.config.name_policy = policy;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the connection scheduling strategy
    pub fn concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.config.concurrency = mode;
        self
    }

    /// Set the worker queue capacity
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the request framing
    pub fn framing(mut self, framing: FramingMode) -> Self {
        self.config.framing = framing;
        self
    }

    /// Set the maximum command size (in bytes)
    pub fn max_command_size(mut self, size: usize) -> Self {
        self.config.max_command_size = size;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
