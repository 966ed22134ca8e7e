use std::io::{Cursor, Read};

/// A blocking byte stream a sensor reader can drive.
///
/// `read` follows the `std::io::Read` contract: `Ok(0)` means the stream has
/// ended. Sources with a read timeout report an idle line as
/// `ErrorKind::TimedOut` instead, so callers can check for cancellation and
/// retry. Closing a source is dropping it.
pub trait ByteSource: Read {
    /// Drop any input the device buffered while nobody was reading.
    ///
    /// Readers call this after a pacing sleep so the next frame is fresh.
    /// The default does nothing, which is right for files and buffers.
    fn discard_pending(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl ByteSource for std::fs::File {}

impl ByteSource for &[u8] {}

impl<T: AsRef<[u8]>> ByteSource for Cursor<T> {}

impl ByteSource for std::io::Stdin {}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn discard_pending(&mut self) -> std::io::Result<()> {
        (**self).discard_pending()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn discard_pending(&mut self) -> std::io::Result<()> {
        (**self).discard_pending()
    }
}
