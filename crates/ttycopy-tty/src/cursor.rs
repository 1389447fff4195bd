#![forbid(unsafe_code)]

//! Cursor position report (CPR).
//!
//! Query:    ESC [ 6 n
//! Response: ESC [ Pr ; Pc R
//!
//! `Pr` and `Pc` are the 1-based row and column of the cursor.

use std::io::{self, Read, Write};

/// Device status report request for the cursor position.
pub const CURSOR_POSITION_QUERY: &[u8] = b"\x1b[6n";

/// Default bound on single-byte reads while waiting for a report.
pub const DEFAULT_MAX_REPLY_READS: usize = 32;

/// Cursor position as reported by the terminal (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorPosition {
    pub row: u16,
    pub col: u16,
}

/// Ask the terminal where the cursor is.
///
/// Reads one byte at a time until the `R` terminator, until a read returns
/// no data (a raw-mode read timeout), or until `max_reads` reads have been
/// made. A silent terminal therefore costs a single timeout. Returns
/// `Ok(None)` when the reply is missing or malformed and `Err` only when the
/// device itself fails.
pub fn query_cursor_position<T: Read + Write + ?Sized>(
    device: &mut T,
    max_reads: usize,
) -> io::Result<Option<CursorPosition>> {
    device.write_all(CURSOR_POSITION_QUERY)?;
    device.flush()?;

    let mut reply = Vec::with_capacity(16);
    let mut byte = [0u8; 1];
    for _ in 0..max_reads {
        match device.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                reply.push(byte[0]);
                if byte[0] == b'R' {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(parse_cursor_position(&reply))
}

/// Parse a cursor position report, ignoring bytes before the last CSI.
#[must_use]
pub fn parse_cursor_position(bytes: &[u8]) -> Option<CursorPosition> {
    let start = bytes.windows(2).rposition(|w| w == b"\x1b[")?;
    let payload = &bytes[start + 2..];

    let end = payload.iter().position(|&b| b == b'R')?;
    let params = &payload[..end];
    let sep = params.iter().position(|&b| b == b';')?;

    Some(CursorPosition {
        row: parse_param(&params[..sep])?,
        col: parse_param(&params[sep + 1..])?,
    })
}

fn parse_param(digits: &[u8]) -> Option<u16> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}
