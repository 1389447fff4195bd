#![forbid(unsafe_code)]

//! OSC 52 sequence framing.
//!
//! | Destination | Header                              | Footer        | Per chunk       |
//! |-------------|-------------------------------------|---------------|-----------------|
//! | Terminal    | `ESC ] 52 ; c ;`                    | `BEL`         | –               |
//! | tmux        | `ESC P tmux ; ESC ESC ] 52 ; c ;`   | `BEL ESC \`   | –               |
//! | GNU screen  | `ESC ] 52 ; c ;`                    | `BEL`         | `ESC P … ESC \` |
//!
//! tmux forwards the body of its DCS passthrough to the outer terminal with
//! doubled `ESC` bytes collapsed, so only the one `ESC` of the OSC introducer
//! needs doubling. Screen limits the length of a single control string, so
//! each chunk travels in its own DCS string.

use std::io::{self, Write};

use crate::config::{Multiplexer, TransferConfig};

const OSC52_INTRO: &[u8] = b"\x1b]52;";
const TMUX_PASSTHROUGH_START: &[u8] = b"\x1bPtmux;\x1b";

const FOOTER: &[u8] = b"\x07";
const TMUX_FOOTER: &[u8] = b"\x07\x1b\\";

const SCREEN_CHUNK_START: &[u8] = b"\x1bP";
const SCREEN_CHUNK_END: &[u8] = b"\x1b\\";

/// Body of the clear sequence. Not base64, so receivers cannot mistake it
/// for a payload.
pub const CLEAR_BODY: &[u8] = b"!";

/// Header, footer and chunk wrapper for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceBuilder {
    header: Vec<u8>,
    footer: &'static [u8],
    wrap_chunks: bool,
}

impl SequenceBuilder {
    #[must_use]
    pub fn new(config: &TransferConfig) -> Self {
        let multiplexer = config.get_multiplexer();

        let mut header = Vec::with_capacity(TMUX_PASSTHROUGH_START.len() + OSC52_INTRO.len() + 2);
        if multiplexer == Multiplexer::Tmux {
            header.extend_from_slice(TMUX_PASSTHROUGH_START);
        }
        header.extend_from_slice(OSC52_INTRO);
        header.push(config.get_selection().osc52_code());
        header.push(b';');

        let footer = match multiplexer {
            Multiplexer::Tmux => TMUX_FOOTER,
            Multiplexer::None | Multiplexer::Screen => FOOTER,
        };

        Self {
            header,
            footer,
            wrap_chunks: multiplexer == Multiplexer::Screen,
        }
    }

    #[must_use]
    pub fn header(&self) -> &[u8] {
        &self.header
    }

    #[must_use]
    pub const fn footer(&self) -> &'static [u8] {
        self.footer
    }

    /// Bytes written before each chunk (empty unless wrapping).
    #[must_use]
    pub const fn chunk_prefix(&self) -> &'static [u8] {
        if self.wrap_chunks { SCREEN_CHUNK_START } else { b"" }
    }

    /// Bytes written after each chunk (empty unless wrapping).
    #[must_use]
    pub const fn chunk_suffix(&self) -> &'static [u8] {
        if self.wrap_chunks { SCREEN_CHUNK_END } else { b"" }
    }

    /// The complete clipboard-clear sequence: `header ! footer`.
    #[must_use]
    pub fn clear_sequence(&self) -> Vec<u8> {
        let mut seq = Vec::with_capacity(self.header.len() + CLEAR_BODY.len() + self.footer.len());
        seq.extend_from_slice(&self.header);
        seq.extend_from_slice(CLEAR_BODY);
        seq.extend_from_slice(self.footer);
        seq
    }

    /// Write the clear sequence and flush.
    pub fn write_clear(&self, writer: &mut impl Write) -> io::Result<()> {
        writer.write_all(&self.clear_sequence())?;
        writer.flush()
    }
}
