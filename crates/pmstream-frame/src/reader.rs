use std::io::ErrorKind;
use std::time::{Duration, Instant};

use bytes::{Buf, BytesMut};
use pmstream_source::ByteSource;
use tracing::{debug, error, trace, warn, Span};

use crate::codec::{check, RawFrame};
use crate::error::{FrameError, ReadError};
use crate::scanner::find;
use crate::stop::StopSignal;
use crate::variant::SensorVariant;

const INITIAL_BUFFER_CAPACITY: usize = 1024;
const MAX_READ_CHUNK: usize = 4 * 1024;

/// Default bytes requested per read.
pub const DEFAULT_READ_CHUNK: usize = 256;

/// Configuration for a [`StreamReader`].
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Minimum time between emitted frames. `None` emits as fast as the
    /// sensor sends.
    pub interval: Option<Duration>,
    /// Bytes requested per read, capped at 4 KiB.
    pub read_chunk_size: usize,
    /// After a pacing sleep, drop buffered bytes and device input so the
    /// next frame is fresh. Only meaningful for live serial ports.
    pub discard_stale: bool,
    /// Span every reader event is recorded in.
    pub span: Span,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            interval: None,
            read_chunk_size: DEFAULT_READ_CHUNK,
            discard_stale: false,
            span: Span::none(),
        }
    }
}

/// Counters kept by a reader, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Validated frames emitted.
    pub frames: u64,
    /// Candidates rejected with a framing error.
    pub resyncs: u64,
    /// Warm-up frames consumed.
    pub warm_ups: u64,
    /// Bytes thrown away while searching for a header.
    pub discarded_bytes: u64,
}

enum Fill {
    Data,
    Idle,
    Eof,
}

/// Recovers validated frames of one sensor family from a byte source.
///
/// Handles partial reads, garbage, desynchronisation and warm-up frames
/// internally; callers only ever see complete, validated frames. The reader
/// is an iterator that ends when the source ends or the stop signal fires,
/// and yields at most one `Err` (a failing source) before ending.
pub struct StreamReader<S> {
    source: S,
    variant: SensorVariant,
    buf: BytesMut,
    config: ReaderConfig,
    stop: StopSignal,
    last_emit: Option<Instant>,
    stats: ReaderStats,
    done: bool,
}

impl<S: ByteSource> StreamReader<S> {
    /// Create a reader with default configuration.
    pub fn new(source: S, variant: SensorVariant) -> Self {
        Self::with_config(source, variant, ReaderConfig::default())
    }

    /// Create a reader with explicit configuration.
    pub fn with_config(source: S, variant: SensorVariant, config: ReaderConfig) -> Self {
        Self {
            source,
            variant,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            stop: StopSignal::new(),
            last_emit: None,
            stats: ReaderStats::default(),
            done: false,
        }
    }

    /// Use an externally owned stop signal.
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// A handle that stops this reader.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Read the next validated frame (blocking).
    ///
    /// Returns `Ok(None)` at end of stream or after a stop request.
    pub fn next_frame(&mut self) -> Result<Option<RawFrame>, ReadError> {
        let span = self.config.span.clone();
        let _entered = span.enter();

        if self.done {
            return Ok(None);
        }
        if !self.pace() {
            self.done = true;
            return Ok(None);
        }

        loop {
            if self.stop.is_stopped() {
                debug!(sensor = %self.variant, "stop requested");
                self.done = true;
                return Ok(None);
            }

            if let Some(frame) = self.scan() {
                self.stats.frames += 1;
                self.last_emit = Some(Instant::now());
                return Ok(Some(frame));
            }

            match self.fill() {
                Ok(Fill::Data) | Ok(Fill::Idle) => continue,
                Ok(Fill::Eof) => {
                    debug!(
                        sensor = %self.variant,
                        buffered = self.buf.len(),
                        "source ended"
                    );
                    self.done = true;
                    return Ok(None);
                }
                Err(err) => {
                    error!(sensor = %self.variant, error = %err, "source failed");
                    self.done = true;
                    return Err(err);
                }
            }
        }
    }

    /// Sleep out the rest of the pacing interval. Returns `false` if stopped.
    fn pace(&mut self) -> bool {
        let (Some(interval), Some(last)) = (self.config.interval, self.last_emit) else {
            return true;
        };

        let remaining = interval.saturating_sub(last.elapsed());
        if !remaining.is_zero() {
            trace!(?remaining, "pacing");
            if self.stop.wait(remaining) {
                return false;
            }
        }

        if self.config.discard_stale {
            self.buf.clear();
            if let Err(err) = self.source.discard_pending() {
                warn!(error = %err, "failed to discard stale input");
            }
        }
        true
    }

    /// Run the scan/validate/resync steps over the buffered bytes.
    fn scan(&mut self) -> Option<RawFrame> {
        let spec = self.variant.spec();
        let header_len = spec.header.len();

        loop {
            if self.buf.len() < header_len {
                return None;
            }

            let offset = match find(&self.buf, spec.header) {
                Ok(offset) => offset,
                Err(_) => {
                    // Keep a possibly split header for the next read.
                    let discard = self.buf.len() - (header_len - 1);
                    self.discard(discard);
                    return None;
                }
            };
            if offset > 0 {
                self.discard(offset);
            }

            if self.buf.len() < spec.length {
                return None;
            }

            match check(&self.buf[..spec.length], self.variant) {
                Ok(()) => {
                    let bytes = self.buf.split_to(spec.length).freeze();
                    return Some(RawFrame::from_validated(self.variant, bytes));
                }
                Err(FrameError::WarmingUp) => {
                    debug!(sensor = %self.variant, "empty frame, sensor warming up");
                    self.stats.warm_ups += 1;
                    self.buf.advance(spec.length);
                }
                Err(err) => {
                    warn!(sensor = %self.variant, error = %err, "dropping one byte to resync");
                    self.stats.resyncs += 1;
                    self.buf.advance(1);
                }
            }
        }
    }

    fn discard(&mut self, count: usize) {
        trace!(count, "discarding bytes before header");
        self.buf.advance(count);
        self.stats.discarded_bytes += count as u64;
    }

    fn fill(&mut self) -> Result<Fill, ReadError> {
        let mut chunk = [0u8; MAX_READ_CHUNK];
        let want = self.config.read_chunk_size.clamp(1, MAX_READ_CHUNK);

        let read = match self.source.read(&mut chunk[..want]) {
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => return Ok(Fill::Idle),
            Err(err)
                if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) =>
            {
                return Ok(Fill::Idle)
            }
            Err(err) => return Err(ReadError::Io(err)),
        };

        if read == 0 {
            return Ok(Fill::Eof);
        }

        self.buf.extend_from_slice(&chunk[..read]);
        Ok(Fill::Data)
    }

    /// The family this reader decodes.
    pub fn variant(&self) -> SensorVariant {
        self.variant
    }

    /// Counters since construction.
    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    /// Bytes read but not yet consumed.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Current reader configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the reader and return the source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: ByteSource> Iterator for StreamReader<S> {
    type Item = Result<RawFrame, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}
