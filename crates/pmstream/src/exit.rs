use std::fmt;
use std::io;

use pmstream_frame::{CaptureError, ReadError};
use pmstream_obs::{FormatError, PumpError, SinkError};
use pmstream_source::SourceError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const SOURCE_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound | io::ErrorKind::UnexpectedEof => SOURCE_ERROR,
        io::ErrorKind::BrokenPipe => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn source_error(context: &str, err: SourceError) -> CliError {
    match err {
        SourceError::UnsupportedBaudRate(_) => CliError::new(USAGE, format!("{context}: {err}")),
        SourceError::Open { ref source, .. } | SourceError::Configure { ref source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        other => CliError::new(SOURCE_ERROR, format!("{context}: {other}")),
    }
}

pub fn read_error(context: &str, err: ReadError) -> CliError {
    match err {
        ReadError::Io(source) if source.kind() == io::ErrorKind::PermissionDenied => {
            CliError::new(PERMISSION_DENIED, format!("{context}: {source}"))
        }
        ReadError::Io(source) => CliError::new(SOURCE_ERROR, format!("{context}: {source}")),
    }
}

pub fn capture_error(context: &str, err: CaptureError) -> CliError {
    match err {
        CaptureError::Io(source) => io_error(context, source),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn format_error(context: &str, err: FormatError) -> CliError {
    CliError::new(USAGE, format!("{context}: {err}"))
}

pub fn sink_error(context: &str, err: SinkError) -> CliError {
    match err {
        SinkError::Io(source) => io_error(context, source),
        SinkError::Format(err) => format_error(context, err),
        SinkError::Capture(err) => capture_error(context, err),
        SinkError::Json(err) => CliError::new(INTERNAL, format!("{context}: {err}")),
        SinkError::Rejected(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        SinkError::Timestamp(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
    }
}

pub fn pump_error(err: PumpError) -> CliError {
    match err {
        PumpError::Read(err) => read_error("read failed", err),
        PumpError::Sink(err) => sink_error("write failed", err),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pmstream_frame::SensorVariant;

    use super::*;

    #[test]
    fn missing_port_is_a_source_error() {
        let err = SourceError::Open {
            path: PathBuf::from("/dev/ttyUSB9"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let cli = source_error("open failed", err);
        assert_eq!(cli.code, SOURCE_ERROR);
        assert!(cli.message.contains("/dev/ttyUSB9"), "{}", cli.message);
    }

    #[test]
    fn permission_denied_is_reported_distinctly() {
        let err = SourceError::Open {
            path: PathBuf::from("/dev/ttyS0"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(source_error("open failed", err).code, PERMISSION_DENIED);

        let err = ReadError::Io(io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(read_error("read failed", err).code, PERMISSION_DENIED);
    }

    #[test]
    fn unsupported_format_is_usage() {
        let err = SinkError::Format(FormatError::Unsupported {
            code: "num".to_string(),
            variant: SensorVariant::Pms3003,
        });
        let cli = pump_error(PumpError::Sink(err));
        assert_eq!(cli.code, USAGE);
        assert!(cli.message.contains("PMS3003"), "{}", cli.message);
    }

    #[test]
    fn malformed_capture_is_data_invalid() {
        let err = CaptureError::Malformed {
            line: 3,
            reason: "expected 3 columns".to_string(),
        };
        assert_eq!(capture_error("decode failed", err).code, DATA_INVALID);
    }
}
