#![forbid(unsafe_code)]

//! Base64 payload encoding for OSC 52 frames.
//!
//! The framer owns one output buffer, sized for the transfer's chunk
//! capacity when it is created, and re-encodes every chunk into it. After
//! construction no chunk of at most that capacity allocates.

use base64::{Engine as _, engine::general_purpose::STANDARD};

/// Exact length of the padded base64 encoding of `len` raw bytes.
#[must_use]
pub const fn encoded_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}

/// Reusable RFC 4648 (`=`-padded) encoder.
#[derive(Debug, Clone)]
pub struct Base64Framer {
    out: String,
}

impl Base64Framer {
    /// Create a framer whose buffer holds the encoding of `chunk_capacity`
    /// raw bytes.
    #[must_use]
    pub fn with_chunk_capacity(chunk_capacity: usize) -> Self {
        Self {
            out: String::with_capacity(encoded_len(chunk_capacity)),
        }
    }

    /// Encode `src`, returning exactly `encoded_len(src.len())` bytes.
    ///
    /// The buffer grows if `src` is larger than the capacity given at
    /// construction, so an undersized buffer is never observable.
    pub fn encode(&mut self, src: &[u8]) -> &[u8] {
        self.out.clear();
        STANDARD.encode_string(src, &mut self.out);
        debug_assert_eq!(self.out.len(), encoded_len(src.len()));
        self.out.as_bytes()
    }

    /// Bytes the buffer holds without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.out.capacity()
    }
}
