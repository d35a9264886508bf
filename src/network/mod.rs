//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread
//! - Connections served inline (sequential) or by a worker pool
//! - One command per connection, routed through Engine

mod connection;
mod server;

pub use connection::{Connection, ConnectionState};
pub use server::{Server, ShutdownHandle};
