//! Server Tests
//!
//! End-to-end tests over real TCP sockets on an ephemeral port.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use gradestore::config::{ConcurrencyMode, Config, ConfigBuilder, FramingMode};
use gradestore::network::{Connection, ConnectionState, Server, ShutdownHandle};
use gradestore::protocol::{read_response, Command, Status};
use gradestore::store::GradeRecord;
use gradestore::{Client, Engine, GradeError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct TestServer {
    _temp: TempDir,
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    thread: Option<JoinHandle<()>>,
}

impl TestServer {
    fn client(&self) -> Client {
        Client::new(self.addr.to_string()).with_timeout(Duration::from_secs(5))
    }

    fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.shutdown.shutdown();
        if let Some(thread) = self.thread.take() {
            thread.join().unwrap();
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.halt();
    }
}

fn start_with(configure: impl FnOnce(ConfigBuilder) -> ConfigBuilder) -> TestServer {
    let temp = TempDir::new().unwrap();
    let builder = Config::builder()
        .data_dir(temp.path())
        .listen_addr("127.0.0.1:0")
        .sync_writes(false);
    let config = configure(builder).build();

    let engine = Arc::new(Engine::open(config.clone()).unwrap());
    let server = Server::bind(config, engine).unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = server.shutdown_handle();

    let thread = thread::spawn(move || {
        server.run().unwrap();
    });

    TestServer {
        _temp: temp,
        addr,
        shutdown,
        thread: Some(thread),
    }
}

fn start_server(concurrency: ConcurrencyMode, framing: FramingMode) -> TestServer {
    start_with(|builder| {
        builder
            .concurrency(concurrency)
            .framing(framing)
            .read_timeout_ms(2000)
    })
}

fn connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream
}

fn start_sequential() -> TestServer {
    start_server(ConcurrencyMode::Sequential, FramingMode::Line)
}

fn start_pooled(workers: usize) -> TestServer {
    start_server(ConcurrencyMode::Pooled { workers }, FramingMode::Line)
}

// =============================================================================
// Sequential Mode Tests
// =============================================================================

#[test]
fn test_sequential_round_trip() {
    let server = start_sequential();
    let client = server.client();

    let response = client.add("S1", "Ana", "Math", "18").unwrap();
    assert_eq!(response.status, Status::Ok);

    let response = client.find("S1").unwrap();
    assert_eq!(
        response.data,
        Some(vec![GradeRecord::new("S1", "Ana", "Math", 18.0)])
    );

    let response = client.update("S1", "math", "19.5").unwrap();
    assert_eq!(response.text(), "Calificación actualizada a 19.5 en math");

    let response = client.list().unwrap();
    assert_eq!(response.count, Some(1));

    let response = client.check_id("S1").unwrap();
    assert_eq!(response.status, Status::Error);

    let response = client.delete("S1").unwrap();
    assert_eq!(response.status, Status::Ok);

    let response = client.find("S1").unwrap();
    assert_eq!(response.status, Status::NotFound);

    server.stop();
}

#[test]
fn test_raw_text_errors_are_responses() {
    let server = start_sequential();
    let client = server.client();

    let response = client.send_raw("HOLA").unwrap();
    assert_eq!(response.status, Status::Error);
    assert_eq!(response.text(), "Comando inválido: HOLA");

    let response = client.send_raw("").unwrap();
    assert_eq!(response.text(), "Comando vacío");
}

#[test]
fn test_existing_name_lookup() {
    let server = start_sequential();
    let client = server.client();

    assert_eq!(client.existing_name("S1").unwrap(), None);
    client.add("S1", "Ana", "Math", "18").unwrap();
    assert_eq!(client.existing_name("S1").unwrap(), Some("Ana".to_string()));
}

#[test]
fn test_request_never_fails() {
    let server = start_sequential();
    let response = server.client().request(&Command::List);
    assert!(response.is_ok());
}

// =============================================================================
// Connection Handling Tests
// =============================================================================

#[test]
fn test_silent_client_gets_no_response() {
    let server = start_sequential();

    {
        let mut stream = TcpStream::connect(server.addr).unwrap();
        stream.shutdown(std::net::Shutdown::Write).unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        assert!(buf.is_empty());
    }

    // Server keeps serving afterwards
    assert!(server.client().list().unwrap().is_ok());
}

#[test]
fn test_one_command_per_connection() {
    let server = start_sequential();

    let mut stream = connect(server.addr);
    stream.write_all(b"LISTAR\n").unwrap();

    // Server closes after the single response
    let mut buf = String::new();
    stream.read_to_string(&mut buf).unwrap();
    assert_eq!(buf.lines().count(), 1);
    assert!(buf.contains("\"status\":\"ok\""));
}

#[test]
fn test_oversized_command_is_rejected() {
    let server = start_sequential();

    let mut stream = connect(server.addr);
    // One byte over the limit, no terminator
    stream.write_all(&vec![b'x'; 4097]).unwrap();

    let response = read_response(&mut stream).unwrap();
    assert_eq!(response.status, Status::Error);
    assert!(response.text().starts_with("Error de comunicación"));
}

#[test]
fn test_default_config_answers_unterminated_command() {
    let server = start_with(|builder| builder.read_timeout_ms(500));

    let mut stream = connect(server.addr);
    // Socket stays open, no terminator
    stream.write_all(b"LISTAR").unwrap();

    let response = read_response(&mut stream).unwrap();
    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.count, Some(0));
}

#[test]
fn test_line_framing_answers_after_client_goes_quiet() {
    let server = start_with(|builder| builder.framing(FramingMode::Line).read_timeout_ms(300));

    let mut stream = connect(server.addr);
    stream.write_all(b"VERIFICAR_ID|S1").unwrap();

    let response = read_response(&mut stream).unwrap();
    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.text(), "ID disponible");
}

#[test]
fn test_connection_states() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp.path())
        .sync_writes(false)
        .build();
    let engine = Arc::new(Engine::open(config.clone()).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let mut client = connect(listener.local_addr().unwrap());
    let (stream, _) = listener.accept().unwrap();

    let mut connection = Connection::new(stream, engine, &config).unwrap();
    assert_eq!(connection.state(), ConnectionState::Accepted);
    assert!(connection.peer_addr().starts_with("127.0.0.1:"));

    client.write_all(b"LISTAR").unwrap();
    connection.handle().unwrap();
    assert_eq!(connection.state(), ConnectionState::Responding);
    drop(connection);

    assert!(read_response(&mut client).unwrap().is_ok());
}

#[test]
fn test_single_read_framing() {
    let server = start_server(ConcurrencyMode::Sequential, FramingMode::SingleRead);

    let mut stream = connect(server.addr);
    // No terminator needed
    stream.write_all(b"VERIFICAR_ID|S1").unwrap();

    let response = read_response(&mut stream).unwrap();
    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.text(), "ID disponible");
}

#[test]
fn test_connection_failure() {
    // Grab a free port, then release it
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let client = Client::new(addr.to_string());
    assert!(matches!(
        client.list(),
        Err(GradeError::ConnectionFailure(_))
    ));

    let response = client.request(&Command::List);
    assert_eq!(response.status, Status::Error);
    assert!(response.text().starts_with("Error de conexión"));
}

#[test]
fn test_bind_rejects_invalid_config() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp.path())
        .listen_addr("127.0.0.1:0")
        .concurrency(ConcurrencyMode::Pooled { workers: 0 })
        .build();
    let engine = Arc::new(Engine::open(config.clone()).unwrap());

    assert!(matches!(
        Server::bind(config, engine),
        Err(GradeError::Config(_))
    ));
}

// =============================================================================
// Pooled Mode Tests
// =============================================================================

#[test]
fn test_pooled_round_trip() {
    let server = start_pooled(4);
    let client = server.client();

    assert!(client.add("S1", "Ana", "Math", "18").unwrap().is_ok());
    assert_eq!(client.list().unwrap().count, Some(1));

    server.stop();
}

#[test]
fn test_pooled_concurrent_clients() {
    let server = start_pooled(4);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let client = server.client();
            thread::spawn(move || {
                for i in 0..10 {
                    let response = client
                        .add(&format!("S{}", t), "Alumno", &format!("M{}", i), "15")
                        .unwrap();
                    assert!(response.is_ok(), "{:?}", response);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(server.client().list().unwrap().count, Some(80));
}

#[test]
fn test_pooled_duplicate_race_admits_one() {
    let server = start_pooled(4);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = server.client();
            thread::spawn(move || client.add("S1", "Ana", "Math", "12").unwrap().is_ok())
        })
        .collect();
    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(successes, 1);
    assert_eq!(server.client().list().unwrap().count, Some(1));
}

#[test]
fn test_pooled_shutdown_with_full_queue() {
    let server = start_with(|builder| {
        builder
            .concurrency(ConcurrencyMode::Pooled { workers: 1 })
            .max_connections(1)
            .read_timeout_ms(10_000)
    });
    let pause = Duration::from_millis(300);

    // Occupies the only worker
    let busy = connect(server.addr);
    thread::sleep(pause);
    // Fills the queue
    let queued = connect(server.addr);
    thread::sleep(pause);
    // Held by the acceptor, waiting for room
    let mut waiting = connect(server.addr);
    thread::sleep(pause);

    server.shutdown.shutdown();

    // The acceptor gives up on the waiting socket instead of blocking
    let mut buf = Vec::new();
    waiting.read_to_end(&mut buf).unwrap();
    assert!(buf.is_empty());

    drop(busy);
    drop(queued);
    server.stop();
}
