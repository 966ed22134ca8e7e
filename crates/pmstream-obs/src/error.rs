use pmstream_frame::{CaptureError, ReadError, SensorVariant};

/// Errors from formatting or projecting an observation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The code string could not be parsed.
    #[error("unknown format code {0:?}")]
    InvalidSpec(String),

    /// The code is valid but the family lacks the fields it needs.
    #[error("format code {code:?} not supported by {variant}")]
    Unsupported {
        code: String,
        variant: SensorVariant,
    },
}

/// Errors a sink can fail with.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Writing to the sink's target failed.
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The observation cannot be rendered in the sink's format.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// JSON serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing a capture row failed.
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    /// An external publisher refused the item.
    #[error("publish rejected: {0}")]
    Rejected(String),

    /// The observation time cannot be expressed as a point timestamp.
    #[error("timestamp error: {0}")]
    Timestamp(#[from] jiff::Error),
}

/// Reasons a broker message is not a sensor reading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopicError {
    /// Readings live exactly four levels deep: `root/location/measurement/property`.
    #[error("topic {topic:?} has {levels} levels, expected 4")]
    Depth { topic: String, levels: usize },

    /// A `$`-prefixed level marks device metadata.
    #[error("system topic {0:?}")]
    System(String),

    #[error("non numeric payload {0:?}")]
    NonNumeric(String),
}

/// Errors that end a [`pump`](crate::sink::pump).
#[derive(Debug, thiserror::Error)]
pub enum PumpError {
    /// The producing stream failed.
    #[error("read failed: {0}")]
    Read(#[from] ReadError),

    /// The sink failed.
    #[error("sink failed: {0}")]
    Sink(#[from] SinkError),
}
