//! TCP Server
//!
//! Accepts connections and serves them inline or on worker threads.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, SendTimeoutError, Sender};

use crate::config::{Config, ConcurrencyMode};
use crate::engine::Engine;
use crate::error::Result;

use super::Connection;

/// How long the acceptor waits between shutdown checks
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Flag that stops a running [`Server`]
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask the server to stop accepting connections
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// TCP server for gradestore
///
/// ## Scheduling
/// - `Sequential`: accept → serve → accept, one client in flight
/// - `Pooled`: the acceptor queues sockets on a bounded channel drained by
///   a fixed set of worker threads
///
/// Either way the record store's write lock is what keeps table rewrites
/// from interleaving.
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: TcpListener,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Bind the listening socket
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        // Polled so the accept loop can observe shutdown
        listener.set_nonblocking(true)?;

        tracing::info!(
            "Listening on {} ({:?})",
            listener.local_addr()?,
            config.concurrency
        );

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: ShutdownHandle::default(),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that stops this server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&self) -> Result<()> {
        match self.config.concurrency {
            ConcurrencyMode::Sequential => self.run_sequential(),
            ConcurrencyMode::Pooled { workers } => self.run_pooled(workers)?,
        }
        tracing::info!("Server stopped accepting connections");
        Ok(())
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    fn run_sequential(&self) {
        while let Some(stream) = self.accept_next() {
            serve(stream, Arc::clone(&self.engine), &self.config);
        }
    }

    fn run_pooled(&self, workers: usize) -> Result<()> {
        let (tx, rx) = channel::bounded::<TcpStream>(self.config.max_connections);

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let rx = rx.clone();
            let engine = Arc::clone(&self.engine);
            let config = self.config.clone();

            let handle = thread::Builder::new()
                .name(format!("gradestore-worker-{}", id))
                .spawn(move || {
                    for stream in rx.iter() {
                        serve(stream, Arc::clone(&engine), &config);
                    }
                    tracing::debug!("Worker {} exiting", id);
                })?;
            handles.push(handle);
        }
        drop(rx);

        while let Some(stream) = self.accept_next() {
            if !self.dispatch(&tx, stream) {
                break;
            }
        }

        // Workers drain what is queued, then see the channel close
        drop(tx);
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }

        Ok(())
    }

    /// Queue a connection for the workers
    ///
    /// Returns `false` when the pool can take no more work: shutdown was
    /// requested while the queue was full, or every worker has exited.
    fn dispatch(&self, tx: &Sender<TcpStream>, mut stream: TcpStream) -> bool {
        loop {
            match tx.send_timeout(stream, ACCEPT_POLL_INTERVAL) {
                Ok(()) => return true,
                Err(SendTimeoutError::Timeout(returned)) => {
                    if self.shutdown.is_shutdown() {
                        tracing::debug!("Dropping unqueued connection on shutdown");
                        return false;
                    }
                    stream = returned;
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    tracing::error!("All workers have exited");
                    return false;
                }
            }
        }
    }

    /// Wait for the next client, or `None` once shutdown is requested
    fn accept_next(&self) -> Option<TcpStream> {
        loop {
            if self.shutdown.is_shutdown() {
                return None;
            }

            match self.listener.accept() {
                Ok((stream, addr)) => {
                    tracing::debug!("Accepted connection from {}", addr);
                    match stream.set_nonblocking(false) {
                        Ok(()) => return Some(stream),
                        Err(e) => tracing::warn!("Dropping connection from {}: {}", addr, e),
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL_INTERVAL),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }
    }
}

/// Serve one connection to completion
fn serve(stream: TcpStream, engine: Arc<Engine>, config: &Config) {
    let mut connection = match Connection::new(stream, engine, config) {
        Ok(connection) => connection,
        Err(e) => {
            tracing::warn!("Failed to set up connection: {}", e);
            return;
        }
    };

    if let Err(e) = connection.handle() {
        tracing::warn!("Error serving {}: {}", connection.peer_addr(), e);
    }
}
