use bytes::{Buf, Bytes};

use crate::error::{FrameError, Result};
use crate::scanner::rfind_complete;
use crate::variant::{ByteOrder, SensorVariant};

/// A frame whose length, header, tail and checksum have been validated.
///
/// Only [`validate`], [`decode_buffer`] and the stream reader create these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    variant: SensorVariant,
    bytes: Bytes,
}

impl RawFrame {
    pub(crate) fn from_validated(variant: SensorVariant, bytes: Bytes) -> Self {
        debug_assert_eq!(bytes.len(), variant.spec().length);
        Self { variant, bytes }
    }

    /// The family this frame was validated against.
    pub fn variant(&self) -> SensorVariant {
        self.variant
    }

    /// The complete frame, header and checksum included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The data words section (header and trailer stripped).
    pub fn payload(&self) -> &[u8] {
        &self.bytes[self.variant.spec().payload_range()]
    }

    /// The payload split into 16-bit words. See [`decode_fields`].
    pub fn fields(&self) -> Vec<u16> {
        decode_fields(self)
    }

    /// Lowercase hex of the complete frame, as stored in capture files.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

/// Check `bytes` against the variant's wire rules without copying.
///
/// Checks run in order: length, header, tail, checksum, warm-up.
pub(crate) fn check(bytes: &[u8], variant: SensorVariant) -> Result<()> {
    let spec = variant.spec();

    if bytes.len() != spec.length {
        return Err(FrameError::Length {
            observed: bytes.len(),
            expected: spec.length,
        });
    }

    let header = &bytes[..spec.header.len()];
    if header != spec.header {
        return Err(FrameError::Header {
            observed: header.to_vec(),
        });
    }

    if let Some(tail) = spec.tail {
        let observed = bytes[spec.length - 1];
        if observed != tail {
            return Err(FrameError::Tail { observed });
        }
    }

    let (Some(actual), Some(expected)) =
        (spec.stored_checksum(bytes), spec.computed_checksum(bytes))
    else {
        return Err(FrameError::Length {
            observed: bytes.len(),
            expected: spec.length,
        });
    };
    if actual != expected {
        return Err(FrameError::Checksum { actual, expected });
    }

    let payload = &bytes[spec.payload_range()];
    if payload[..spec.measurement_bytes].iter().all(|&b| b == 0) {
        return Err(FrameError::WarmingUp);
    }

    Ok(())
}

/// Validate one candidate frame.
///
/// `bytes` must be exactly one frame long. The returned frame holds an
/// unchanged copy of the input.
pub fn validate(bytes: &[u8], variant: SensorVariant) -> Result<RawFrame> {
    check(bytes, variant)?;
    Ok(RawFrame::from_validated(
        variant,
        Bytes::copy_from_slice(bytes),
    ))
}

/// Split a frame's payload into 16-bit words, in wire order.
///
/// Plantower words are big-endian, Nova words little-endian.
pub fn decode_fields(frame: &RawFrame) -> Vec<u16> {
    let spec = frame.variant.spec();
    let mut payload = frame.payload();
    let mut fields = Vec::with_capacity(spec.word_count());
    while payload.remaining() >= 2 {
        let word = match spec.byte_order {
            ByteOrder::BigEndian => payload.get_u16(),
            ByteOrder::LittleEndian => payload.get_u16_le(),
        };
        fields.push(word);
    }
    fields
}

/// Validate a buffer holding one frame, possibly preceded by unrelated bytes.
///
/// The whole buffer is tried first. If that fails, the last complete header
/// occurrence is validated instead; if there is none, the first error is
/// returned.
pub fn decode_buffer(buffer: &[u8], variant: SensorVariant) -> Result<RawFrame> {
    let err = match validate(buffer, variant) {
        Ok(frame) => return Ok(frame),
        Err(err) => err,
    };

    let spec = variant.spec();
    match rfind_complete(buffer, spec.header, spec.length) {
        Ok(start) => validate(&buffer[start..start + spec.length], variant),
        Err(_) => Err(err),
    }
}
