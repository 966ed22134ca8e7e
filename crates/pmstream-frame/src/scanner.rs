//! Header search over arbitrary byte buffers.

use crate::error::{FrameError, Result};

/// Offset of the first occurrence of `header` in `buffer`.
///
/// The first match is not necessarily the start of a valid frame; the
/// stream reader pairs this with a one-byte resync when validation fails.
pub fn find(buffer: &[u8], header: &[u8]) -> Result<usize> {
    if header.is_empty() {
        return Ok(0);
    }
    buffer
        .windows(header.len())
        .position(|window| window == header)
        .ok_or(FrameError::NotFound)
}

/// Offset of the last occurrence of `header` that still has `length` bytes
/// after it, i.e. the start of the last complete frame candidate.
pub fn rfind_complete(buffer: &[u8], header: &[u8], length: usize) -> Result<usize> {
    if header.is_empty() || length < header.len() || buffer.len() < length {
        return Err(FrameError::NotFound);
    }
    let last_start = buffer.len() - length;
    buffer[..last_start + header.len()]
        .windows(header.len())
        .rposition(|window| window == header)
        .ok_or(FrameError::NotFound)
}
