//! Named observations decoded from particulate-matter sensor frames.
//!
//! A validated [`RawFrame`](pmstream_frame::RawFrame) becomes an immutable
//! [`Observation`]: a timestamp plus the family's named measurements. From
//! there an observation can be projected ([`Observation::subset`]), rendered
//! as text ([`FormatSpec`]) or handed to a [`Sink`]: a writer, a broker
//! ([`HomieSink`]) or a time-series database ([`PointSink`]).

pub mod error;
pub mod format;
pub mod homie;
pub mod observation;
pub mod points;
pub mod reader;
pub mod sink;

pub use error::{FormatError, PumpError, SinkError, TopicError};
pub use format::{FormatKind, FormatSpec};
pub use homie::{HomieSink, Publish, TopicReading, PM_UNIT};
pub use observation::{
    collection_factor, MassConcentration, Observation, ParticleCounts, Reading,
};
pub use points::{Point, PointFields, PointSink, WritePoints};
pub use reader::ObservationReader;
pub use sink::{pump, CaptureSink, FormatSink, HexSink, JsonSink, Sink};
