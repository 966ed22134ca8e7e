//! Particulate-matter sensor readings from a serial byte stream.
//!
//! pmstream recovers validated frames from Plantower PMSx003/PMS3003/PMS5003S
//! and NovaFitness SDS01x sensors, names their measurements and renders them
//! as text, JSON or capture files.
//!
//! # Crate Structure
//!
//! - [`source`]: byte sources (serial ports, files)
//! - [`frame`]: frame scanning, validation and the resynchronising stream reader
//! - [`obs`]: observations, formatting and sinks

/// Re-export source types.
pub mod source {
    pub use pmstream_source::*;
}

/// Re-export frame types.
pub mod frame {
    pub use pmstream_frame::*;
}

/// Re-export observation types.
pub mod obs {
    pub use pmstream_obs::*;
}
