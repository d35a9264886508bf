//! Connection Handler
//!
//! Serves exactly one command per client connection.

use std::io::ErrorKind;
use std::net::{Shutdown, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, FramingMode};
use crate::engine::Engine;
use crate::error::{GradeError, Result};
use crate::protocol::{decode_request, is_timeout, read_request, write_response, Response};

/// Lifecycle of a connection
///
/// `Accepted → Reading → Processing → Responding → Closed`. A connection may
/// jump to `Closed` from any state (no data, timeout, peer reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Accepted,
    Reading,
    Processing,
    Responding,
    Closed,
}

/// Handles a single client connection
///
/// The socket is shut down when the `Connection` is dropped, whatever path
/// `handle` took.
pub struct Connection {
    /// TCP stream (one request in, one response out)
    stream: TcpStream,

    /// Reference to the grade engine
    engine: Arc<Engine>,

    /// Peer address for logging
    peer_addr: String,

    state: ConnectionState,

    framing: FramingMode,

    max_command_size: usize,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Applies framing and timeouts from `config`
    pub fn new(stream: TcpStream, engine: Arc<Engine>, config: &Config) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let mut connection = Self {
            stream,
            engine,
            peer_addr,
            state: ConnectionState::Accepted,
            framing: config.framing,
            max_command_size: config.max_command_size,
        };
        connection.set_timeouts(config.read_timeout_ms, config.write_timeout_ms)?;

        Ok(connection)
    }

    /// Configure connection timeouts (0 leaves the call blocking)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.stream
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.stream
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the connection: read one command, answer it
    ///
    /// Returns once the response is written or the client is gone.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        self.transition(ConnectionState::Reading);
        let frame = match read_request(&mut self.stream, self.framing, self.max_command_size) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!("Client {} closed without sending data", self.peer_addr);
                return Ok(());
            }
            Err(GradeError::Io(ref e)) if is_timeout(e.kind()) => {
                tracing::debug!("Read timeout for client {}", self.peer_addr);
                return Ok(());
            }
            Err(GradeError::Io(ref e)) if is_disconnect(e.kind()) => {
                tracing::debug!("Client {} disconnected while sending", self.peer_addr);
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                // Best effort: the client may still be listening
                self.transition(ConnectionState::Responding);
                let _ = self.send_response(&communication_error(&e));
                return Err(e);
            }
        };

        self.transition(ConnectionState::Processing);
        let response = self.execute_frame(&frame);

        self.transition(ConnectionState::Responding);
        if let Err(e) = self.send_response(&response) {
            if let GradeError::Io(ref io_err) = e {
                if is_disconnect(io_err.kind()) {
                    tracing::debug!(
                        "Client {} disconnected before response could be sent: {}",
                        self.peer_addr,
                        e
                    );
                    return Ok(());
                }
            }
            tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
            return Err(e);
        }

        Ok(())
    }

    /// Decode and execute one frame
    fn execute_frame(&self, frame: &[u8]) -> Response {
        let raw = match decode_request(frame) {
            Ok(raw) => raw,
            Err(e) => return Response::from_error(&e),
        };

        tracing::trace!("Received command from {}: {:?}", self.peer_addr, raw);

        let engine = &self.engine;
        match panic::catch_unwind(AssertUnwindSafe(|| engine.process(raw))) {
            Ok(response) => response,
            Err(_) => {
                tracing::error!("Panic while processing command from {}", self.peer_addr);
                Response::error("Error de comunicación: fallo interno procesando el comando")
            }
        }
    }

    /// Send a response to the client
    fn send_response(&mut self, response: &Response) -> Result<()> {
        write_response(&mut self.stream, response)?;
        tracing::debug!("Response to {}: {:?}", self.peer_addr, response.status);
        Ok(())
    }

    fn transition(&mut self, next: ConnectionState) {
        tracing::trace!("{}: {:?} -> {:?}", self.peer_addr, self.state, next);
        self.state = next;
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.state
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // Fails harmlessly if the peer already closed
        let _ = self.stream.shutdown(Shutdown::Both);
        self.transition(ConnectionState::Closed);
        tracing::debug!("Client {} disconnected", self.peer_addr);
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
    )
}

/// Response for a failure outside command execution
fn communication_error(err: &GradeError) -> Response {
    match err {
        GradeError::Protocol(_) => Response::from_error(err),
        other => Response::error(format!("Error de comunicación: {}", other)),
    }
}
