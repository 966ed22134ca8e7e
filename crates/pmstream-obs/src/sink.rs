//! Destinations for observations and raw frames.

use std::io::Write;

use tracing::debug;

use pmstream_frame::{CaptureWriter, RawFrame, ReadError};

use crate::error::{PumpError, SinkError};
use crate::format::{FormatKind, FormatSpec};
use crate::observation::{now, Observation};

/// Something that accepts items one at a time.
pub trait Sink<T: ?Sized> {
    fn publish(&mut self, item: &T) -> Result<(), SinkError>;

    /// Push out anything buffered. Called once a [`pump`] drains its input.
    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<T: ?Sized, K: Sink<T> + ?Sized> Sink<T> for &mut K {
    fn publish(&mut self, item: &T) -> Result<(), SinkError> {
        (**self).publish(item)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

impl<T: ?Sized, K: Sink<T> + ?Sized> Sink<T> for Box<K> {
    fn publish(&mut self, item: &T) -> Result<(), SinkError> {
        (**self).publish(item)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

/// Drive `items` into `sink` until the input ends or either side fails.
///
/// Returns the number of items published.
pub fn pump<T, I, K>(items: I, sink: &mut K) -> Result<usize, PumpError>
where
    I: IntoIterator<Item = Result<T, ReadError>>,
    K: Sink<T> + ?Sized,
{
    let mut published = 0;
    for item in items {
        let item = item?;
        sink.publish(&item)?;
        published += 1;
    }
    sink.flush()?;
    debug!(published, "input drained");
    Ok(published)
}

/// One formatted line per observation.
pub struct FormatSink<W> {
    inner: W,
    spec: FormatSpec,
    header_pending: bool,
}

impl<W: Write> FormatSink<W> {
    pub fn new(inner: W, spec: FormatSpec) -> Self {
        Self {
            inner,
            spec,
            header_pending: false,
        }
    }

    /// Write the column-name line before the first observation.
    pub fn with_header(mut self, header: bool) -> Self {
        self.header_pending = header;
        self
    }

    pub fn spec(&self) -> &FormatSpec {
        &self.spec
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Sink<Observation> for FormatSink<W> {
    fn publish(&mut self, obs: &Observation) -> Result<(), SinkError> {
        let line = self.spec.render(obs)?;
        if self.header_pending {
            let header = FormatSpec::new(FormatKind::Header).render(obs)?;
            writeln!(self.inner, "{header}")?;
            self.header_pending = false;
        }
        writeln!(self.inner, "{line}")?;
        self.inner.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(self.inner.flush()?)
    }
}

/// One JSON object per line.
pub struct JsonSink<W> {
    inner: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Sink<Observation> for JsonSink<W> {
    fn publish(&mut self, obs: &Observation) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.inner, obs)?;
        writeln!(self.inner)?;
        self.inner.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(self.inner.flush()?)
    }
}

/// Capture-file rows, stamped with the time each frame is published.
pub struct CaptureSink<W> {
    writer: CaptureWriter<W>,
}

impl<W: Write> CaptureSink<W> {
    pub fn new(writer: CaptureWriter<W>) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write> Sink<RawFrame> for CaptureSink<W> {
    fn publish(&mut self, frame: &RawFrame) -> Result<(), SinkError> {
        Ok(self.writer.write_frame(now(), frame)?)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(self.writer.flush()?)
    }
}

/// Raw frames as hex, one per line.
///
/// In hexdump mode each line is `OFFSET: BYTES  ASCII`, with the offset
/// counting bytes since the first frame and non-printable bytes shown as `.`.
pub struct HexSink<W> {
    inner: W,
    hexdump: bool,
    offset: usize,
}

impl<W: Write> HexSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hexdump: false,
            offset: 0,
        }
    }

    pub fn hexdump(inner: W) -> Self {
        Self {
            inner,
            hexdump: true,
            offset: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Sink<RawFrame> for HexSink<W> {
    fn publish(&mut self, frame: &RawFrame) -> Result<(), SinkError> {
        if self.hexdump {
            let bytes = frame.as_bytes();
            let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
            let ascii: String = bytes
                .iter()
                .map(|&b| {
                    if (0x20..0x7e).contains(&b) {
                        char::from(b)
                    } else {
                        '.'
                    }
                })
                .collect();
            writeln!(self.inner, "{:08x}: {}  {ascii}", self.offset, hex.join(" "))?;
            self.offset += bytes.len();
        } else {
            writeln!(self.inner, "{}", frame.to_hex())?;
        }
        self.inner.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(self.inner.flush()?)
    }
}
