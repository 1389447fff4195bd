#![forbid(unsafe_code)]

//! OSC 52 support probe.
//!
//! OSC 52 has no acknowledgement, so support is inferred from a side
//! effect: a terminal that executes the sequence does not move the cursor,
//! while one that does not understand it usually prints some of its bytes.
//!
//! ```text
//! Idle → RawMode → QueryBefore → WriteClear → QueryAfter → Evaluate → Restored
//! ```
//!
//! The clipboard-clear sequence (`header ! footer`) is used as the stimulus
//! so the probe never writes clipboard content. The saved terminal mode is
//! held by a [`RawModeGuard`] and restored on every path out of
//! [`TerminalProbe::run`], including I/O failures.
//!
//! A terminal that silently swallows unknown sequences also keeps the
//! cursor in place and is reported as supported; this cannot be told apart
//! from real support without reading the clipboard back.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use ttycopy_core::config::TransferConfig;
use ttycopy_core::error::{Error, Result};
use ttycopy_core::sequence::SequenceBuilder;

use crate::cursor::{CursorPosition, DEFAULT_MAX_REPLY_READS, query_cursor_position};
use crate::{RawModeGuard, TerminalDevice};

/// Default wait for each read of a cursor report.
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Probe tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Read timeout applied to the device while in raw mode.
    pub timeout: Duration,
    /// Upper bound on reads per cursor query; the first timed-out read also
    /// ends the query.
    pub max_reply_reads: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_reply_reads: DEFAULT_MAX_REPLY_READS,
        }
    }
}

/// Verdict of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeOutcome {
    /// Both queries answered and the cursor did not move.
    Supported,
    /// Both queries answered and the cursor moved.
    Unsupported,
    /// At least one query went unanswered.
    Indeterminate,
}

impl ProbeOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Supported => "supported",
            Self::Unsupported => "unsupported",
            Self::Indeterminate => "indeterminate",
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cursor positions observed around the stimulus, and the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReport {
    pub before: Option<CursorPosition>,
    pub after: Option<CursorPosition>,
    pub outcome: ProbeOutcome,
}

impl ProbeReport {
    fn evaluate(before: Option<CursorPosition>, after: Option<CursorPosition>) -> Self {
        let outcome = match (before, after) {
            (Some(b), Some(a)) if b.col == a.col => ProbeOutcome::Supported,
            (Some(_), Some(_)) => ProbeOutcome::Unsupported,
            _ => ProbeOutcome::Indeterminate,
        };
        Self {
            before,
            after,
            outcome,
        }
    }

    #[must_use]
    pub const fn supported(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Supported)
    }
}

/// Stages of the probe that touch the device, named in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    RawMode,
    QueryBefore,
    WriteClear,
    QueryAfter,
    Restore,
}

impl Stage {
    const fn describe(self) -> &'static str {
        match self {
            Self::RawMode => "entering raw mode",
            Self::QueryBefore => "querying cursor position",
            Self::WriteClear => "writing OSC 52 sequence",
            Self::QueryAfter => "re-querying cursor position",
            Self::Restore => "restoring terminal mode",
        }
    }
}

/// Detects whether a terminal executes OSC 52 sequences.
#[derive(Debug, Clone)]
pub struct TerminalProbe {
    sequence: SequenceBuilder,
    config: ProbeConfig,
    device_label: String,
}

impl TerminalProbe {
    /// Probe with the framing `transfer` would use.
    #[must_use]
    pub fn new(transfer: &TransferConfig, config: ProbeConfig) -> Self {
        Self {
            sequence: SequenceBuilder::new(transfer),
            config,
            device_label: "terminal".to_string(),
        }
    }

    /// Name of the device used in error messages.
    #[must_use]
    pub fn device_label(mut self, label: impl Into<String>) -> Self {
        self.device_label = label.into();
        self
    }

    /// Run the probe on `device`.
    ///
    /// Fails with [`Error::Protocol`] if the device is not an interactive
    /// terminal (nothing is written in that case) and with [`Error::Io`] if
    /// the device fails mid-probe. Unanswered queries are not errors; they
    /// yield [`ProbeOutcome::Indeterminate`].
    pub fn run<D: TerminalDevice>(&self, device: &mut D) -> Result<ProbeReport> {
        if !device.is_interactive() {
            return Err(Error::Protocol(format!(
                "{}: not a terminal, cannot probe OSC 52 support",
                self.device_label
            )));
        }

        let fail = |stage: Stage| {
            move |e| Error::io(format!("{} ({})", self.device_label, stage.describe()), e)
        };

        ttycopy_core::debug!(
            timeout_ms = self.config.timeout.as_millis() as u64,
            "probe: entering raw mode"
        );
        let mut guard =
            RawModeGuard::enter(device, self.config.timeout).map_err(fail(Stage::RawMode))?;

        let before = query_cursor_position(&mut *guard, self.config.max_reply_reads)
            .map_err(fail(Stage::QueryBefore))?;
        ttycopy_core::debug!(?before, "probe: cursor before");

        guard
            .write_all(&self.sequence.clear_sequence())
            .and_then(|()| guard.flush())
            .map_err(fail(Stage::WriteClear))?;

        let after = query_cursor_position(&mut *guard, self.config.max_reply_reads)
            .map_err(fail(Stage::QueryAfter))?;
        ttycopy_core::debug!(?after, "probe: cursor after");

        guard.restore().map_err(fail(Stage::Restore))?;

        let report = ProbeReport::evaluate(before, after);
        ttycopy_core::info!(outcome = %report.outcome, "probe complete");
        Ok(report)
    }
}
