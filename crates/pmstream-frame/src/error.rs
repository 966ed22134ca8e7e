/// Errors that can occur while scanning or validating a single frame.
///
/// All of these are recoverable from the point of view of a stream: the
/// reader logs them and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The candidate does not have the variant's fixed length.
    #[error("frame length {observed} (expected {expected})")]
    Length { observed: usize, expected: usize },

    /// The leading bytes do not match the variant's header.
    #[error("frame header b\"{}\"", .observed.escape_ascii())]
    Header { observed: Vec<u8> },

    /// The trailing byte does not match the variant's tail marker.
    #[error("frame tail {observed:#04x}")]
    Tail { observed: u8 },

    /// The stored checksum does not match the computed one.
    #[error("frame checksum {actual} != {expected}")]
    Checksum { actual: u16, expected: u16 },

    /// A well-formed frame with an all-zero payload; the sensor is warming up.
    #[error("frame empty: warming up sensor")]
    WarmingUp,

    /// The header byte sequence does not occur in the buffer.
    #[error("frame header not found")]
    NotFound,

    /// The name does not match any supported sensor family.
    #[error("unknown sensor model {0:?}")]
    UnknownVariant(String),
}

impl FrameError {
    /// Whether this is the expected warm-up condition rather than corruption.
    pub fn is_warming_up(&self) -> bool {
        matches!(self, FrameError::WarmingUp)
    }

    /// Whether this is a header/length/tail/checksum mismatch.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            FrameError::Length { .. }
                | FrameError::Header { .. }
                | FrameError::Tail { .. }
                | FrameError::Checksum { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// Fatal errors that end a stream.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The byte source failed.
    #[error("source I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reading or writing capture files.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// An I/O error on the capture file.
    #[error("capture I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A row that does not have the `time,sensor,hex` shape.
    #[error("capture line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    /// The hex column could not be decoded.
    #[error("capture line {line}: invalid hex: {source}")]
    Hex {
        line: usize,
        source: hex::FromHexError,
    },
}
