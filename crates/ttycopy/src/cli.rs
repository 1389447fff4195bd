#![forbid(unsafe_code)]

//! Command-line arguments.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use clap::error::ErrorKind;
use ttycopy_core::config::{Multiplexer, Selection, TransferConfig};
use ttycopy_core::error::{Error, Result};

use crate::detect::{DetectInputs, detect_multiplexer};

/// Copy content to the system clipboard from anywhere via terminal that
/// supports ANSI OSC 52 sequence.
#[derive(Debug, Parser)]
#[command(
    name = "tty-copy",
    version,
    override_usage = "tty-copy [OPTIONS] text to copy\n       \
                      tty-copy [OPTIONS] < file-to-copy\n       \
                      tty-copy --probe [-T TERM] [-p]",
    after_help = "Homepage: https://github.com/jirutka/tty-copy"
)]
pub struct Cli {
    /// Instead of copying anything, clear the clipboard.
    #[arg(short = 'c', long)]
    pub clear: bool,

    /// Do not copy the trailing newline character.
    #[arg(short = 'n', long = "trim-newline")]
    pub trim_newline: bool,

    /// Write to FILE instead of /dev/tty.
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Use the "primary" clipboard (selection) instead of the regular
    /// clipboard.
    #[arg(short = 'p', long)]
    pub primary: bool,

    /// Type of the terminal: default, screen, or tmux.
    #[arg(short = 'T', long = "term", value_name = "TERM")]
    pub term: Option<Multiplexer>,

    /// Check whether the terminal executes OSC 52 sequences.
    #[arg(long, conflicts_with_all = ["clear", "trim_newline", "text"])]
    pub probe: bool,

    /// Text to copy; read from stdin when omitted.
    #[arg(value_name = "TEXT")]
    pub text: Vec<OsString>,
}

impl Cli {
    /// Parse `args` (program name first).
    ///
    /// `--help` and `--version` are printed here and yield `Ok(None)`; any
    /// other parse failure becomes [`Error::WrongUsage`].
    pub fn from_args<I, T>(args: I) -> Result<Option<Self>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(cli) => Ok(Some(cli)),
            Err(err) => match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = err.print();
                    Ok(None)
                }
                _ => {
                    let rendered = err.to_string();
                    let message = rendered.strip_prefix("error: ").unwrap_or(&rendered);
                    Err(Error::WrongUsage(message.trim_end().to_string()))
                }
            },
        }
    }

    /// Resolve the run's configuration; `--term` wins over detection.
    #[must_use]
    pub fn transfer_config(&self, env: &DetectInputs) -> TransferConfig {
        let multiplexer = self.term.unwrap_or_else(|| detect_multiplexer(env));
        let selection = if self.primary {
            Selection::Primary
        } else {
            Selection::Clipboard
        };
        TransferConfig::new()
            .multiplexer(multiplexer)
            .selection(selection)
            .trim_trailing_newline(self.trim_newline)
    }
}
