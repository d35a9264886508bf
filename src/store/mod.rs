//! Store Module
//!
//! Owns the grade table, in memory and on disk.
//!
//! ## Responsibilities
//! - Load the table once at open (creating it if absent)
//! - Enforce the (student_id, subject) natural key
//! - Serialize every mutation behind one write lock
//! - Rewrite the whole file on each mutation (write-through)
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ ID_Estudiante,Nombre,Materia,Calificación          │  header
//! ├────────────────────────────────────────────────────┤
//! │ S1,Ana,Math,18.0                                   │  one row per record,
//! │ S1,Ana,"Historia, Arte",15.5                       │  insertion order
//! └────────────────────────────────────────────────────┘
//! ```

mod codec;
mod record;
mod record_store;

pub use codec::{decode_table, encode_table, HEADER};
pub use record::{format_grade, GradeRecord};
pub use record_store::{RecordStore, StoreOptions};
