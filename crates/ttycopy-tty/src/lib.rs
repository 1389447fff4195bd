#![forbid(unsafe_code)]
//! Terminal device control for `tty-copy`.
//!
//! This crate owns everything that talks back and forth with a terminal:
//! saving and restoring its mode, cursor-position queries, and the OSC 52
//! support probe built from them.
//!
//! ## Escape Sequence Reference
//!
//! | Purpose                  | Sent          | Reply                 |
//! |--------------------------|---------------|-----------------------|
//! | Cursor position report   | `CSI 6 n`     | `CSI <row> ; <col> R` |
//! | Clipboard clear (OSC 52) | `OSC 52;c;!`  | none                  |

use std::io::{self, Read, Write};
use std::ops::{Deref, DerefMut};
use std::time::Duration;

pub mod cursor;
pub mod probe;

pub use cursor::CursorPosition;
pub use probe::{ProbeConfig, ProbeOutcome, ProbeReport, TerminalProbe};

// ── Terminal Device ──────────────────────────────────────────────────────

/// A readable, writable terminal whose input mode can be switched.
pub trait TerminalDevice: Read + Write {
    /// Saved input mode.
    type Mode;

    /// Whether the device is an interactive terminal.
    fn is_interactive(&self) -> bool;

    /// Disable echo and line editing, returning the mode to restore later.
    ///
    /// Reads in the new mode return after at most `read_timeout`, with zero
    /// bytes when nothing arrived.
    fn enter_raw_mode(&mut self, read_timeout: Duration) -> io::Result<Self::Mode>;

    /// Put back a mode returned by [`enter_raw_mode`](Self::enter_raw_mode).
    fn restore_mode(&mut self, mode: &Self::Mode) -> io::Result<()>;
}

// ── Raw Mode Guard ───────────────────────────────────────────────────────

/// RAII guard that keeps a device in raw mode and restores the saved mode
/// on drop.
///
/// All I/O during the raw-mode window goes through the guard (it derefs to
/// the device), so the device cannot be used after the guard is gone
/// without the mode having been restored.
pub struct RawModeGuard<'a, D: TerminalDevice> {
    device: &'a mut D,
    saved: Option<D::Mode>,
}

impl<'a, D: TerminalDevice> RawModeGuard<'a, D> {
    /// Enter raw mode on `device`.
    pub fn enter(device: &'a mut D, read_timeout: Duration) -> io::Result<Self> {
        let saved = device.enter_raw_mode(read_timeout)?;
        Ok(Self {
            device,
            saved: Some(saved),
        })
    }

    /// Restore the saved mode now, reporting failure.
    pub fn restore(mut self) -> io::Result<()> {
        match self.saved.take() {
            Some(mode) => self.device.restore_mode(&mode),
            None => Ok(()),
        }
    }
}

impl<D: TerminalDevice> Deref for RawModeGuard<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.device
    }
}

impl<D: TerminalDevice> DerefMut for RawModeGuard<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.device
    }
}

impl<D: TerminalDevice> Drop for RawModeGuard<'_, D> {
    fn drop(&mut self) {
        if let Some(mode) = self.saved.take() {
            // Best-effort restore; errors cannot be reported from drop.
            let _ = self.device.restore_mode(&mode);
        }
    }
}

// ── TTY Device ───────────────────────────────────────────────────────────

/// Path of the controlling terminal.
#[cfg(unix)]
pub const CONTROLLING_TTY: &str = "/dev/tty";

/// A terminal (or any file) opened for reading and writing.
#[cfg(unix)]
#[derive(Debug)]
pub struct TtyDevice {
    file: std::fs::File,
}

#[cfg(unix)]
impl TtyDevice {
    /// Open `path` for reading and writing.
    pub fn open(path: impl AsRef<std::path::Path>) -> io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)?;
        Ok(Self { file })
    }

    /// Wrap an already open file.
    #[must_use]
    pub fn from_file(file: std::fs::File) -> Self {
        Self { file }
    }
}

#[cfg(unix)]
impl Read for TtyDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

#[cfg(unix)]
impl Write for TtyDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[cfg(unix)]
impl TerminalDevice for TtyDevice {
    type Mode = nix::sys::termios::Termios;

    fn is_interactive(&self) -> bool {
        use std::io::IsTerminal;
        self.file.is_terminal()
    }

    fn enter_raw_mode(&mut self, read_timeout: Duration) -> io::Result<Self::Mode> {
        use nix::sys::termios::{LocalFlags, SetArg, SpecialCharacterIndices, tcgetattr, tcsetattr};

        let original = tcgetattr(&self.file).map_err(io::Error::other)?;

        let mut raw = original.clone();
        raw.local_flags
            .remove(LocalFlags::ECHO | LocalFlags::ICANON | LocalFlags::IEXTEN);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = vtime(read_timeout);
        tcsetattr(&self.file, SetArg::TCSANOW, &raw).map_err(io::Error::other)?;

        Ok(original)
    }

    fn restore_mode(&mut self, mode: &Self::Mode) -> io::Result<()> {
        use nix::sys::termios::{SetArg, tcsetattr};

        tcsetattr(&self.file, SetArg::TCSANOW, mode).map_err(io::Error::other)
    }
}

/// `VTIME` is in tenths of a second, 1..=255.
#[cfg(unix)]
fn vtime(timeout: Duration) -> u8 {
    let tenths = timeout.as_millis().div_ceil(100).max(1);
    u8::try_from(tenths).unwrap_or(u8::MAX)
}
