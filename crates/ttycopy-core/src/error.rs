#![forbid(unsafe_code)]

//! Error type shared by the transfer engine, the terminal probe and the
//! command-line front end.

use std::io;

/// Convenience alias for results carrying [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input that can never be transferred as given, such as literal
    /// arguments longer than the OSC 52 safe limit.
    #[error("{0}")]
    Usage(String),

    /// Invalid command-line usage.
    #[error("{0}")]
    WrongUsage(String),

    /// Read or write failure on the input, the destination or the terminal.
    #[error("{context}: {source}")]
    Io {
        /// Path or stream the failure concerns.
        context: String,
        #[source]
        source: io::Error,
    },

    /// The terminal did not answer the probe as expected.
    #[error("{0}")]
    Protocol(String),
}

impl Error {
    /// Wrap an I/O error with the path or stream it concerns.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Exit class of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Usage(_) | Self::Protocol(_) => ErrorClass::General,
            Self::WrongUsage(_) => ErrorClass::WrongUsage,
            Self::Io { .. } => ErrorClass::Io,
        }
    }
}

/// Process-level failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// General usage or logic error.
    General,
    /// Wrong command-line usage.
    WrongUsage,
    /// Input/output error.
    Io,
}

impl ErrorClass {
    /// Exit status of the `tty-copy` binary for this class.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::General => 1,
            Self::WrongUsage => 10,
            Self::Io => 11,
        }
    }
}
