//! Protocol codec
//!
//! Framing and encoding for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! ┌───────────────────────────────────────────┬────┐
//! │ KEYWORD|arg|arg|...   (UTF-8)             │ \n │
//! └───────────────────────────────────────────┴────┘
//! ```
//! With [`FramingMode::SingleRead`] the request is whatever a single `read`
//! returns, less a trailing `\n`. With [`FramingMode::Line`] it ends at the
//! first `\n`, at end of stream, or when the peer goes quiet past the read
//! timeout after sending something. Both cap the request at `max_size` bytes.
//!
//! ### Response
//! ```text
//! ┌───────────────────────────────────────────┬────┐
//! │ {"status": ..., "mensaje": ...}  (JSON)   │ \n │
//! └───────────────────────────────────────────┴────┘
//! ```

use std::io::{BufRead, BufReader, ErrorKind, Read, Write};

use bytes::{Bytes, BytesMut};

use crate::config::FramingMode;
use crate::error::{GradeError, Result};
use super::Response;

/// Size of each read while scanning for the line terminator
const READ_CHUNK: usize = 1024;

// =============================================================================
// Request Framing
// =============================================================================

/// Read one request frame
///
/// Returns `Ok(None)` when the peer sent nothing before closing.
pub fn read_request<R: Read>(
    reader: &mut R,
    framing: FramingMode,
    max_size: usize,
) -> Result<Option<Bytes>> {
    match framing {
        FramingMode::Line => read_line_frame(reader, max_size),
        FramingMode::SingleRead => read_single_frame(reader, max_size),
    }
}

fn read_line_frame<R: Read>(reader: &mut R, max_size: usize) -> Result<Option<Bytes>> {
    let mut frame = BytesMut::with_capacity(max_size.min(READ_CHUNK));
    let mut chunk = [0u8; READ_CHUNK];
    let mut received = 0usize;

    loop {
        let n = match read_retrying(reader, &mut chunk) {
            Ok(n) => n,
            // Peer stopped sending without a terminator: answer what arrived
            Err(GradeError::Io(ref e)) if received > 0 && is_timeout(e.kind()) => break,
            Err(e) => return Err(e),
        };
        if n == 0 {
            break;
        }
        received += n;

        let start = frame.len();
        frame.extend_from_slice(&chunk[..n]);

        if let Some(pos) = frame[start..].iter().position(|&b| b == b'\n') {
            frame.truncate(start + pos);
            break;
        }
        if frame.len() > max_size {
            return Err(too_large(max_size));
        }
    }

    if received == 0 {
        return Ok(None);
    }
    strip_carriage_return(&mut frame);
    if frame.len() > max_size {
        return Err(too_large(max_size));
    }

    Ok(Some(frame.freeze()))
}

fn read_single_frame<R: Read>(reader: &mut R, max_size: usize) -> Result<Option<Bytes>> {
    let mut frame = BytesMut::zeroed(max_size);
    let n = read_retrying(reader, &mut frame)?;
    if n == 0 {
        return Ok(None);
    }
    frame.truncate(n);

    // A trailing terminator is framing, not command text
    if frame.last() == Some(&b'\n') {
        frame.truncate(frame.len() - 1);
        strip_carriage_return(&mut frame);
    }
    Ok(Some(frame.freeze()))
}

fn strip_carriage_return(frame: &mut BytesMut) {
    if frame.last() == Some(&b'\r') {
        frame.truncate(frame.len() - 1);
    }
}

/// Whether a read failed because its timeout elapsed
pub(crate) fn is_timeout(kind: ErrorKind) -> bool {
    // Windows reports TimedOut instead of WouldBlock
    matches!(kind, ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

fn read_retrying<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

fn too_large(max_size: usize) -> GradeError {
    GradeError::Protocol(format!("el comando excede {} bytes", max_size))
}

/// Decode a request frame as UTF-8 text
pub fn decode_request(frame: &[u8]) -> Result<&str> {
    std::str::from_utf8(frame)
        .map_err(|e| GradeError::Protocol(format!("el comando no es UTF-8 válido: {}", e)))
}

/// Write a request (command text plus terminator)
pub fn write_request<W: Write>(writer: &mut W, command: &str) -> Result<()> {
    writer.write_all(command.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes (JSON plus terminator)
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec(response)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a response from a stream
///
/// Stops at the terminator or at end of stream, whichever comes first.
pub fn read_response<R: Read>(reader: R) -> Result<Response> {
    let mut buf = Vec::new();
    BufReader::new(reader).read_until(b'\n', &mut buf)?;

    if buf.iter().all(u8::is_ascii_whitespace) {
        return Err(GradeError::Protocol(
            "conexión cerrada sin respuesta".to_string(),
        ));
    }
    decode_response(&buf)
}
