#![forbid(unsafe_code)]

//! Literal command-line text as transfer input.

use std::io::Cursor;

use crate::config::OSC52_SAFE_LIMIT;
use crate::error::{Error, Result};

/// Join `args` with single spaces into one in-memory input stream.
///
/// Unlike streamed input, text given as arguments has no point at which a
/// partial transfer would be meaningful, so anything longer than
/// [`OSC52_SAFE_LIMIT`] is rejected outright.
pub fn join_arguments<I, S>(args: I) -> Result<Cursor<Vec<u8>>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut buf = Vec::new();
    for (i, arg) in args.into_iter().enumerate() {
        let arg = arg.as_ref();
        let separator = usize::from(i > 0);
        if buf.len() + separator + arg.len() > OSC52_SAFE_LIMIT {
            return Err(Error::Usage(format!(
                "Command line is too long (limit is {OSC52_SAFE_LIMIT} bytes)"
            )));
        }
        if separator == 1 {
            buf.push(b' ');
        }
        buf.extend_from_slice(arg);
    }
    Ok(Cursor::new(buf))
}
