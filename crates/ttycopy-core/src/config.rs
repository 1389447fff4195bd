#![forbid(unsafe_code)]

//! Transfer configuration.
//!
//! A [`TransferConfig`] is resolved once per run (from command-line flags and
//! the environment) and passed by value into the transfer engine and the
//! terminal probe. It is never mutated after construction.
//!
//! # Example
//!
//! ```
//! use ttycopy_core::config::{Multiplexer, Selection, TransferConfig};
//!
//! let config = TransferConfig::new()
//!     .multiplexer(Multiplexer::Tmux)
//!     .selection(Selection::Primary)
//!     .trim_trailing_newline(true);
//!
//! assert_eq!(config.chunk_capacity(), 2048 * 3);
//! ```

use std::fmt;
use std::str::FromStr;

/// Largest raw input (in bytes) whose OSC 52 sequence stays within the
/// classic 100 000 byte ceiling.
///
/// The ceiling covers a 7 byte `ESC ] 5 2 ; c ;` header, a 1 byte `BEL`
/// footer and 99 992 bytes of base64, which encode 74 994 raw bytes.
pub const OSC52_SAFE_LIMIT: usize = 74_994;

/// Raw chunk size when writing through GNU screen.
///
/// Screen limits the length of a single control string, so chunks are kept
/// to 254 base64 groups (1016 encoded bytes).
pub const SCREEN_CHUNK_CAPACITY: usize = 254 * 3;

/// Raw chunk size for every other destination.
pub const DEFAULT_CHUNK_CAPACITY: usize = 2048 * 3;

/// Terminal multiplexer sitting between this process and the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Multiplexer {
    /// Direct terminal access.
    #[default]
    None,
    /// GNU screen: each chunk is wrapped in a DCS string.
    Screen,
    /// tmux: the whole sequence is wrapped in `ESC P tmux; … ESC \`.
    Tmux,
}

impl Multiplexer {
    /// Name as accepted on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "default",
            Self::Screen => "screen",
            Self::Tmux => "tmux",
        }
    }
}

impl fmt::Display for Multiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown multiplexer name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown terminal type '{0}' (expected default, screen or tmux)")]
pub struct ParseMultiplexerError(pub String);

impl FromStr for Multiplexer {
    type Err = ParseMultiplexerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::None),
            "screen" => Ok(Self::Screen),
            "tmux" => Ok(Self::Tmux),
            other => Err(ParseMultiplexerError(other.to_string())),
        }
    }
}

/// OSC 52 clipboard selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Selection {
    /// System clipboard.
    #[default]
    Clipboard,
    /// Primary selection (X11).
    Primary,
}

impl Selection {
    /// Selection parameter byte of the OSC 52 sequence.
    #[must_use]
    pub const fn osc52_code(self) -> u8 {
        match self {
            Self::Clipboard => b'c',
            Self::Primary => b'p',
        }
    }
}

/// Immutable per-run transfer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferConfig {
    multiplexer: Multiplexer,
    selection: Selection,
    trim_trailing_newline: bool,
}

impl TransferConfig {
    /// Configuration for a direct terminal, system clipboard, no trimming.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            multiplexer: Multiplexer::None,
            selection: Selection::Clipboard,
            trim_trailing_newline: false,
        }
    }

    /// Set the multiplexer.
    #[must_use]
    pub const fn multiplexer(mut self, multiplexer: Multiplexer) -> Self {
        self.multiplexer = multiplexer;
        self
    }

    /// Set the clipboard selection.
    #[must_use]
    pub const fn selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Drop a single trailing `\n` at the end of the input.
    #[must_use]
    pub const fn trim_trailing_newline(mut self, enabled: bool) -> Self {
        self.trim_trailing_newline = enabled;
        self
    }

    #[must_use]
    pub const fn get_multiplexer(&self) -> Multiplexer {
        self.multiplexer
    }

    #[must_use]
    pub const fn get_selection(&self) -> Selection {
        self.selection
    }

    #[must_use]
    pub const fn trims_trailing_newline(&self) -> bool {
        self.trim_trailing_newline
    }

    /// Raw bytes per chunk. Always a multiple of 3, so only the final chunk
    /// of a transfer can carry base64 padding.
    #[must_use]
    pub const fn chunk_capacity(&self) -> usize {
        match self.multiplexer {
            Multiplexer::Screen => SCREEN_CHUNK_CAPACITY,
            Multiplexer::None | Multiplexer::Tmux => DEFAULT_CHUNK_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TransferConfig::default();
        assert_eq!(config, TransferConfig::new());
        assert_eq!(config.get_multiplexer(), Multiplexer::None);
        assert_eq!(config.get_selection(), Selection::Clipboard);
        assert!(!config.trims_trailing_newline());
    }

    #[test]
    fn chunk_capacity_depends_on_multiplexer() {
        let base = TransferConfig::new();
        assert_eq!(base.chunk_capacity(), 6144);
        assert_eq!(base.multiplexer(Multiplexer::Tmux).chunk_capacity(), 6144);
        assert_eq!(base.multiplexer(Multiplexer::Screen).chunk_capacity(), 762);
    }

    #[test]
    fn chunk_capacities_are_base64_aligned() {
        assert_eq!(SCREEN_CHUNK_CAPACITY % 3, 0);
        assert_eq!(DEFAULT_CHUNK_CAPACITY % 3, 0);
    }

    #[test]
    fn safe_limit_matches_osc_ceiling() {
        // 7 byte header + 1 byte footer + base64 of the limit.
        assert_eq!(7 + 1 + OSC52_SAFE_LIMIT / 3 * 4, 100_000);
    }

    #[test]
    fn multiplexer_parse_roundtrip() {
        for mux in [Multiplexer::None, Multiplexer::Screen, Multiplexer::Tmux] {
            assert_eq!(mux.as_str().parse::<Multiplexer>(), Ok(mux));
        }
    }

    #[test]
    fn multiplexer_parse_rejects_unknown() {
        let err = "zellij".parse::<Multiplexer>().unwrap_err();
        assert_eq!(err, ParseMultiplexerError("zellij".into()));
        assert!(err.to_string().contains("zellij"));
    }

    #[test]
    fn selection_codes() {
        assert_eq!(Selection::Clipboard.osc52_code(), b'c');
        assert_eq!(Selection::Primary.osc52_code(), b'p');
    }
}
