#![forbid(unsafe_code)]

//! Streaming OSC 52 transfer.
//!
//! The input is read in chunks of [`TransferConfig::chunk_capacity`] raw
//! bytes. Each chunk is base64-encoded and written as soon as it is read, so
//! memory use does not depend on the input size:
//!
//! ```text
//! header  payload(chunk 0)  payload(chunk 1)  …  footer
//! ```
//!
//! Under GNU screen every payload is enclosed in `ESC P … ESC \`, and the
//! first of those strings also carries the header.
//!
//! # Reassembly
//!
//! Every chunk except the last holds a multiple of 3 bytes, so only the
//! final payload can end in `=` padding. Concatenating all payloads in order
//! yields the base64 encoding of the whole input, and each payload also
//! decodes on its own.
//!
//! # Failure handling
//!
//! Header and footer are each written exactly once. When a read or write
//! fails mid-stream the footer is still attempted, so the terminal is not
//! left inside an unterminated sequence, and the first error is returned.

use std::io::{self, BufRead, Read, Write};

use crate::base64_framer::Base64Framer;
use crate::config::{OSC52_SAFE_LIMIT, TransferConfig};
use crate::error::{Error, Result};
use crate::sequence::SequenceBuilder;

/// Summary of a completed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferReport {
    /// Raw bytes read from the input, counted before newline trimming.
    pub bytes_read: usize,
    /// Number of payload chunks written.
    pub chunks: usize,
}

impl TransferReport {
    /// The input was larger than some terminals accept in one sequence.
    #[must_use]
    pub const fn exceeds_safe_limit(&self) -> bool {
        self.bytes_read > OSC52_SAFE_LIMIT
    }
}

/// Writes OSC 52 sequences for one configuration.
#[derive(Debug, Clone)]
pub struct TransferEngine {
    config: TransferConfig,
    sequence: SequenceBuilder,
    input_label: String,
    output_label: String,
}

impl TransferEngine {
    #[must_use]
    pub fn new(config: TransferConfig) -> Self {
        Self {
            sequence: SequenceBuilder::new(&config),
            config,
            input_label: "input".to_string(),
            output_label: "output".to_string(),
        }
    }

    /// Name of the input used in error messages.
    #[must_use]
    pub fn input_label(mut self, label: impl Into<String>) -> Self {
        self.input_label = label.into();
        self
    }

    /// Name of the destination used in error messages.
    #[must_use]
    pub fn output_label(mut self, label: impl Into<String>) -> Self {
        self.output_label = label.into();
        self
    }

    /// Write the clipboard-clear sequence.
    pub fn clear(&self, output: &mut impl Write) -> Result<()> {
        crate::debug!(multiplexer = %self.config.get_multiplexer(), "clearing clipboard");
        self.sequence
            .write_clear(output)
            .map_err(|e| Error::io(&self.output_label, e))
    }

    /// Copy all of `input` to the clipboard through `output`.
    pub fn transfer(
        &self,
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> Result<TransferReport> {
        let mut report = TransferReport::default();
        self.transfer_tracked(input, output, &mut report)?;
        Ok(report)
    }

    /// Like [`transfer`](Self::transfer), but `report` is filled in on
    /// failure too, so the caller still learns how much input was read.
    pub fn transfer_tracked(
        &self,
        input: &mut impl BufRead,
        output: &mut impl Write,
        report: &mut TransferReport,
    ) -> Result<()> {
        let capacity = self.config.chunk_capacity();
        crate::debug!(
            multiplexer = %self.config.get_multiplexer(),
            capacity,
            trim_newline = self.config.trims_trailing_newline(),
            "starting transfer"
        );

        let mut state = StreamState {
            chunk: vec![0; capacity],
            framer: Base64Framer::with_chunk_capacity(capacity),
            header_written: false,
            report: TransferReport::default(),
        };

        let streamed = self.stream_chunks(&mut state, input, output);
        let finished = self.finish(&mut state, output);

        *report = state.report;
        if report.exceeds_safe_limit() {
            crate::warn!(
                bytes_read = report.bytes_read,
                limit = OSC52_SAFE_LIMIT,
                "input exceeds OSC 52 safe limit, terminal may truncate it"
            );
        }

        streamed?;
        finished.map_err(|e| Error::io(&self.output_label, e))?;
        crate::debug!(bytes_read = report.bytes_read, chunks = report.chunks, "transfer complete");
        Ok(())
    }

    /// Stream chunks until the input ends or fails.
    ///
    /// A short chunk means the input already reported its end, so it is
    /// final and nothing more is read. Only a full chunk ending in `\n` is
    /// peeked past, to learn whether that newline is the last byte.
    fn stream_chunks(
        &self,
        state: &mut StreamState,
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> Result<()> {
        let trim = self.config.trims_trailing_newline();

        loop {
            let (mut len, filled) = fill_chunk(input, &mut state.chunk);
            state.report.bytes_read += len;

            let mut last = match filled {
                Ok(at_end) => at_end,
                Err(e) => {
                    // Bytes read before the failure are still copied.
                    self.emit_chunk(state, len, output)?;
                    return Err(Error::io(&self.input_label, e));
                }
            };

            if !last && trim && state.chunk[len - 1] == b'\n' {
                match input.fill_buf() {
                    Ok(rest) => last = rest.is_empty(),
                    Err(e) => {
                        self.emit_chunk(state, len, output)?;
                        return Err(Error::io(&self.input_label, e));
                    }
                }
            }

            if last && trim && len > 0 && state.chunk[len - 1] == b'\n' {
                len -= 1;
            }

            self.emit_chunk(state, len, output)?;
            if last {
                return Ok(());
            }
        }
    }

    fn emit_chunk(
        &self,
        state: &mut StreamState,
        len: usize,
        output: &mut impl Write,
    ) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        crate::trace!(index = state.report.chunks, len, "writing chunk");
        self.write_chunk(state, len, output)
            .map_err(|e| Error::io(&self.output_label, e))?;
        state.report.chunks += 1;
        Ok(())
    }

    fn write_chunk(
        &self,
        state: &mut StreamState,
        len: usize,
        output: &mut impl Write,
    ) -> io::Result<()> {
        output.write_all(self.sequence.chunk_prefix())?;
        if !state.header_written {
            state.header_written = true;
            output.write_all(self.sequence.header())?;
        }
        output.write_all(state.framer.encode(&state.chunk[..len]))?;
        output.write_all(self.sequence.chunk_suffix())
    }

    /// Terminate the sequence. A header that was never attempted (no chunk
    /// was written) goes out first, in its own chunk wrapper.
    fn finish(&self, state: &mut StreamState, output: &mut impl Write) -> io::Result<()> {
        if !state.header_written {
            state.header_written = true;
            output.write_all(self.sequence.chunk_prefix())?;
            output.write_all(self.sequence.header())?;
            output.write_all(self.sequence.chunk_suffix())?;
        }
        output.write_all(self.sequence.footer())?;
        output.flush()
    }
}

struct StreamState {
    chunk: Vec<u8>,
    framer: Base64Framer,
    header_written: bool,
    report: TransferReport,
}

/// Read until `buf` is full, the input ends or a read fails.
///
/// Returns the number of bytes placed in `buf` along with `Ok(true)` if the
/// input ended, `Ok(false)` if `buf` is full, or the read error. The input
/// is not read again once it has reported its end.
fn fill_chunk(input: &mut impl Read, buf: &mut [u8]) -> (usize, io::Result<bool>) {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => return (filled, Ok(true)),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return (filled, Err(e)),
        }
    }
    (filled, Ok(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Multiplexer, Selection};
    use crate::error::ErrorClass;
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use std::collections::VecDeque;
    use std::io::{BufReader, Cursor};

    fn run(config: TransferConfig, input: &[u8]) -> (Vec<u8>, TransferReport) {
        let mut out = Vec::new();
        let report = TransferEngine::new(config)
            .transfer(&mut Cursor::new(input), &mut out)
            .unwrap();
        (out, report)
    }

    fn plain(payload: &str) -> Vec<u8> {
        format!("\x1b]52;c;{payload}\x07").into_bytes()
    }

    /// Reader that hands out at most `step` bytes per call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Reader that yields `data` and then fails.
    struct FailAfter<'a> {
        data: &'a [u8],
    }

    impl Read for FailAfter<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() {
                return Err(io::Error::other("read boom"));
            }
            let n = buf.len().min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Writer that accepts `budget` bytes, fails once, then accepts again.
    struct FailOnce {
        written: Vec<u8>,
        budget: usize,
        failed: bool,
    }

    impl Write for FailOnce {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.failed && self.written.len() + buf.len() > self.budget {
                self.failed = true;
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "write boom"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn small_input_single_sequence() {
        let (out, report) = run(TransferConfig::new(), b"hello");
        assert_eq!(out, plain("aGVsbG8="));
        assert_eq!(report, TransferReport { bytes_read: 5, chunks: 1 });
        assert!(!report.exceeds_safe_limit());
    }

    #[test]
    fn primary_selection() {
        let (out, _) = run(TransferConfig::new().selection(Selection::Primary), b"hi");
        assert_eq!(out, b"\x1b]52;p;aGk=\x07");
    }

    #[test]
    fn trailing_newline_kept_by_default() {
        let (out, _) = run(TransferConfig::new(), b"hello\n");
        assert_eq!(out, plain("aGVsbG8K"));
    }

    #[test]
    fn trim_drops_final_newline() {
        let config = TransferConfig::new().trim_trailing_newline(true);
        let (out, report) = run(config, b"hello\n");
        assert_eq!(out, plain("aGVsbG8="));
        assert_eq!(report.bytes_read, 6);
    }

    #[test]
    fn trim_without_newline_is_noop() {
        let config = TransferConfig::new().trim_trailing_newline(true);
        let (out, _) = run(config, b"hello");
        assert_eq!(out, plain("aGVsbG8="));
    }

    #[test]
    fn trim_drops_only_one_newline() {
        let config = TransferConfig::new().trim_trailing_newline(true);
        let (out, _) = run(config, b"a\n\n");
        assert_eq!(out, plain(&STANDARD.encode(b"a\n")));
    }

    #[test]
    fn trim_lone_newline_writes_header_and_footer_only() {
        let config = TransferConfig::new().trim_trailing_newline(true);
        let (out, report) = run(config, b"\n");
        assert_eq!(out, b"\x1b]52;c;\x07");
        assert_eq!(report.chunks, 0);
        assert_eq!(report.bytes_read, 1);
    }

    #[test]
    fn empty_input_writes_header_and_footer() {
        let (out, report) = run(TransferConfig::new(), b"");
        assert_eq!(out, b"\x1b]52;c;\x07");
        assert_eq!(report, TransferReport::default());
    }

    #[test]
    fn newline_at_chunk_boundary_is_kept_when_more_follows() {
        let config = TransferConfig::new().trim_trailing_newline(true);
        let capacity = config.chunk_capacity();
        let mut input = vec![b'x'; capacity - 1];
        input.push(b'\n');
        input.extend_from_slice(b"tail");
        let (out, report) = run(config, &input);
        assert_eq!(report.chunks, 2);
        assert_eq!(out, plain(&STANDARD.encode(&input)));
    }

    #[test]
    fn trim_newline_that_fills_last_chunk_exactly() {
        let config = TransferConfig::new().trim_trailing_newline(true);
        let capacity = config.chunk_capacity();
        let mut input = vec![b'x'; capacity];
        input.push(b'\n');
        let (out, report) = run(config, &input);
        assert_eq!(report.chunks, 1);
        assert_eq!(out, plain(&STANDARD.encode(&input[..capacity])));
    }

    #[test]
    fn tmux_wraps_whole_sequence() {
        let config = TransferConfig::new().multiplexer(Multiplexer::Tmux);
        let (out, _) = run(config, b"hello");
        assert_eq!(out, b"\x1bPtmux;\x1b\x1b]52;c;aGVsbG8=\x07\x1b\\");
    }

    #[test]
    fn screen_wraps_each_chunk() {
        let config = TransferConfig::new().multiplexer(Multiplexer::Screen);
        let input = vec![b'a'; 800];
        let (out, report) = run(config, &input);
        assert_eq!(report.chunks, 2);

        let mut expected = Vec::new();
        expected.extend_from_slice(b"\x1bP\x1b]52;c;");
        expected.extend_from_slice(STANDARD.encode(&input[..762]).as_bytes());
        expected.extend_from_slice(b"\x1b\\\x1bP");
        expected.extend_from_slice(STANDARD.encode(&input[762..]).as_bytes());
        expected.extend_from_slice(b"\x1b\\\x07");
        assert_eq!(out, expected);
    }

    #[test]
    fn screen_final_short_chunk_is_padded() {
        // 762 + 1 bytes: the last chunk holds a single byte.
        let config = TransferConfig::new().multiplexer(Multiplexer::Screen);
        let input: Vec<u8> = (0..763u32).map(|i| (i % 251) as u8).collect();
        let (out, _) = run(config, &input);
        let tail = &out[out.len() - b"\x1bP\x1b\\\x07".len() - 4..];
        assert!(tail.starts_with(b"\x1bP"));
        assert_eq!(&tail[2..6], STANDARD.encode(&input[762..]).as_bytes());
        assert!(tail[2..6].ends_with(b"=="));
    }

    #[test]
    fn screen_empty_input_wraps_header() {
        let config = TransferConfig::new().multiplexer(Multiplexer::Screen);
        let (out, _) = run(config, b"");
        assert_eq!(out, b"\x1bP\x1b]52;c;\x1b\\\x07");
    }

    #[test]
    fn short_reads_still_fill_chunks() {
        let config = TransferConfig::new().multiplexer(Multiplexer::Screen);
        let data = vec![b'z'; 1000];
        let mut input = BufReader::with_capacity(7, Trickle { data: &data, step: 5 });
        let mut out = Vec::new();
        let report = TransferEngine::new(config).transfer(&mut input, &mut out).unwrap();
        assert_eq!(report.chunks, 2);
        assert_eq!(report.bytes_read, 1000);
    }

    #[test]
    fn oversize_stream_is_only_a_warning() {
        let input = vec![b'q'; OSC52_SAFE_LIMIT + 1];
        let (out, report) = run(TransferConfig::new(), &input);
        assert!(report.exceeds_safe_limit());
        assert!(out.ends_with(b"\x07"));
    }

    #[test]
    fn at_safe_limit_is_not_oversize() {
        let input = vec![b'q'; OSC52_SAFE_LIMIT];
        let (_, report) = run(TransferConfig::new(), &input);
        assert!(!report.exceeds_safe_limit());
    }

    #[test]
    fn write_failure_still_attempts_footer() {
        let mut out = FailOnce {
            written: Vec::new(),
            budget: 10,
            failed: false,
        };
        let err = TransferEngine::new(TransferConfig::new())
            .output_label("/dev/tty")
            .transfer(&mut Cursor::new(b"hello world"), &mut out)
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Io);
        assert!(err.to_string().starts_with("/dev/tty: "));
        assert!(out.written.ends_with(b"\x07"));
        assert_eq!(out.written.iter().filter(|&&b| b == 0x07).count(), 1);
    }

    #[test]
    fn read_failure_keeps_partial_chunk_and_terminates_sequence() {
        let data = b"abc";
        let mut input = BufReader::new(FailAfter { data });
        let mut out = Vec::new();
        let err = TransferEngine::new(TransferConfig::new())
            .input_label("/dev/stdin")
            .transfer(&mut input, &mut out)
            .unwrap_err();
        assert!(matches!(err, Error::Io { ref context, .. } if context == "/dev/stdin"));
        assert_eq!(out, plain("YWJj"));
    }

    #[test]
    fn read_failure_does_not_trim_newline() {
        let config = TransferConfig::new().trim_trailing_newline(true);
        let mut input = BufReader::new(FailAfter { data: b"ab\n" });
        let mut out = Vec::new();
        TransferEngine::new(config)
            .transfer(&mut input, &mut out)
            .unwrap_err();
        assert_eq!(out, plain(&STANDARD.encode(b"ab\n")));
    }

    #[test]
    fn tracked_report_survives_read_failure() {
        let data = vec![b'r'; OSC52_SAFE_LIMIT + 10];
        let mut input = BufReader::new(FailAfter { data: &data });
        let mut out = Vec::new();
        let mut report = TransferReport::default();
        let result = TransferEngine::new(TransferConfig::new()).transfer_tracked(
            &mut input,
            &mut out,
            &mut report,
        );
        assert!(result.is_err());
        assert_eq!(report.bytes_read, OSC52_SAFE_LIMIT + 10);
        assert!(report.exceeds_safe_limit());
        assert!(out.ends_with(b"\x07"));
    }

    #[test]
    fn tracked_report_survives_write_failure() {
        let mut out = FailOnce {
            written: Vec::new(),
            budget: 10,
            failed: false,
        };
        let mut report = TransferReport::default();
        let result = TransferEngine::new(TransferConfig::new()).transfer_tracked(
            &mut Cursor::new(b"hello world"),
            &mut out,
            &mut report,
        );
        assert!(result.is_err());
        assert_eq!(report.bytes_read, 11);
        assert_eq!(report.chunks, 0);
    }

    /// Reader that plays back `parts` one per call (an empty part is an
    /// end-of-input report) and counts reads made after the first end.
    struct Bursts {
        parts: VecDeque<&'static [u8]>,
        ended: bool,
        reads_after_end: usize,
    }

    impl Bursts {
        fn new(parts: &[&'static [u8]]) -> Self {
            Self {
                parts: parts.iter().copied().collect(),
                ended: false,
                reads_after_end: 0,
            }
        }
    }

    impl Read for Bursts {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.ended {
                self.reads_after_end += 1;
            }
            let part = self.parts.pop_front().unwrap_or(b"");
            if part.is_empty() {
                self.ended = true;
            }
            let n = part.len().min(buf.len());
            buf[..n].copy_from_slice(&part[..n]);
            Ok(n)
        }
    }

    #[test]
    fn end_of_input_is_final() {
        let config = TransferConfig::new().trim_trailing_newline(true);
        let mut input = BufReader::new(Bursts::new(&[b"hello\n", b"", b"extra"]));
        let mut out = Vec::new();
        let report = TransferEngine::new(config)
            .transfer(&mut input, &mut out)
            .unwrap();
        assert_eq!(out, plain("aGVsbG8="));
        assert_eq!(report.bytes_read, 6);
        assert_eq!(input.get_ref().reads_after_end, 0);
    }

    #[test]
    fn end_of_input_is_final_without_trimming() {
        let mut input = BufReader::new(Bursts::new(&[b"hi", b"", b"more"]));
        let mut out = Vec::new();
        TransferEngine::new(TransferConfig::new())
            .transfer(&mut input, &mut out)
            .unwrap();
        assert_eq!(out, plain("aGk="));
        assert_eq!(input.get_ref().reads_after_end, 0);
    }

    #[test]
    fn full_chunk_ending_in_newline_peeks_once() {
        let config = TransferConfig::new().trim_trailing_newline(true);
        let capacity = config.chunk_capacity();
        let mut body = vec![b'x'; capacity - 1];
        body.push(b'\n');
        let body: &'static [u8] = Box::leak(body.into_boxed_slice());
        let mut input = BufReader::with_capacity(capacity, Bursts::new(&[body, b"", b"late"]));
        let mut out = Vec::new();
        let report = TransferEngine::new(config)
            .transfer(&mut input, &mut out)
            .unwrap();
        assert_eq!(out, plain(&STANDARD.encode(&body[..capacity - 1])));
        assert_eq!(report.chunks, 1);
        assert_eq!(input.get_ref().reads_after_end, 0);
    }

    #[test]
    fn clear_writes_bang_body() {
        let engine = TransferEngine::new(TransferConfig::new().multiplexer(Multiplexer::Tmux));
        let mut out = Vec::new();
        engine.clear(&mut out).unwrap();
        assert_eq!(out, b"\x1bPtmux;\x1b\x1b]52;c;!\x07\x1b\\");
    }

    #[test]
    fn clear_reports_write_error() {
        let mut out = FailOnce {
            written: Vec::new(),
            budget: 0,
            failed: false,
        };
        let err = TransferEngine::new(TransferConfig::new())
            .clear(&mut out)
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Io);
    }
}
