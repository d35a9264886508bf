//! # gradestore
//!
//! A network-accessible store of student grades with:
//! - A pipe-delimited text command protocol over TCP
//! - JSON responses
//! - Grade validation before any mutation
//! - A write-through CSV table guarded by a single writer lock
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │          (Sequential or Worker Pool, 1 cmd / conn)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Engine (Command Interpreter)                 │
//! │              parse → validate → dispatch                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Validator  │          │ RecordStore │
//!   │ (0..=20)    │          │  (RwLock)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │ calificac-  │
//!                           │ iones.csv   │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod validator;
pub mod store;
pub mod protocol;
pub mod engine;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{GradeError, Result};
pub use config::Config;
pub use engine::Engine;
pub use client::Client;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of gradestore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
