#![forbid(unsafe_code)]

//! Core of `tty-copy`: OSC 52 framing and streaming clipboard transfer.
//!
//! ```
//! use ttycopy_core::config::{Multiplexer, TransferConfig};
//! use ttycopy_core::transfer::TransferEngine;
//!
//! let engine = TransferEngine::new(TransferConfig::new().multiplexer(Multiplexer::Tmux));
//! let mut out = Vec::new();
//! engine.transfer(&mut &b"hello"[..], &mut out)?;
//! assert_eq!(out, b"\x1bPtmux;\x1b\x1b]52;c;aGVsbG8=\x07\x1b\\");
//! # Ok::<(), ttycopy_core::Error>(())
//! ```

pub mod base64_framer;
pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod sequence;
pub mod transfer;

pub use error::{Error, ErrorClass, Result};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, info, trace, warn};
