//! Byte sources for particulate-matter sensor streams.
//!
//! The decoding layers only need a blocking [`std::io::Read`] plus the small
//! [`ByteSource`] extension defined here. Two concrete sources are provided:
//! - [`SerialPort`]: a TTY configured for raw 8N1 reads with a short timeout,
//!   or a plain file replayed as-is when the path is not a terminal
//! - any in-memory buffer (`&[u8]`, `Cursor<T>`), mostly for tests
//!
//! This is the lowest layer of pmstream. Everything else builds on top of
//! the [`ByteSource`] trait provided here.

pub mod error;
pub mod serial;
pub mod traits;

pub use error::{Result, SourceError};
pub use serial::{SerialConfig, SerialPort, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT};
pub use traits::ByteSource;
