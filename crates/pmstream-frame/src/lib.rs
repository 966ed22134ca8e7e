//! Frame scanning, validation and decoding for particulate-matter sensors.
//!
//! Every supported sensor family emits fixed-length binary frames:
//! - A fixed header (`BM` plus payload length for Plantower, `AA C0` for Nova)
//! - A payload of 16-bit data words
//! - A trailing checksum (and a tail byte on Nova sensors)
//!
//! [`StreamReader`] recovers validated [`RawFrame`]s from a continuous,
//! possibly corrupted byte stream. Decoding frames into named measurements
//! happens one layer up.

pub mod capture;
pub mod codec;
pub mod error;
pub mod reader;
pub mod scanner;
pub mod stop;
pub mod variant;

pub use capture::{CaptureReader, CaptureRecord, CaptureWriter, CAPTURE_HEADER};
pub use codec::{decode_buffer, decode_fields, validate, RawFrame};
pub use error::{CaptureError, FrameError, ReadError, Result};
pub use reader::{ReaderConfig, ReaderStats, StreamReader, DEFAULT_READ_CHUNK};
pub use scanner::{find, rfind_complete};
pub use stop::StopSignal;
pub use variant::{ByteOrder, Checksum, SensorVariant, VariantSpec, TRAILER_SIZE};
