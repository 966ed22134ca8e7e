//! Per-family wire constants.
//!
//! Each sensor family is a [`SensorVariant`] resolving to a constant
//! [`VariantSpec`]. Everything downstream (scanner, validator, decoder,
//! reader) is parametrised by the table; nothing branches on the family
//! except through it.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::error::FrameError;

/// Checksum (plus tail, where present) occupies the last two bytes of every frame.
pub const TRAILER_SIZE: usize = 2;

/// Byte order of the 16-bit data words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

/// Checksum convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checksum {
    /// Sum of every byte before the checksum, mod 65536, stored big-endian
    /// in the last two bytes (Plantower).
    Sum16,
    /// Sum of the payload bytes, mod 256, stored in the byte before the
    /// tail (Nova).
    Sum8,
}

/// Constant description of one sensor family's frame.
#[derive(Debug, PartialEq, Eq)]
pub struct VariantSpec {
    /// Display name, also used in capture files.
    pub name: &'static str,
    /// Fixed leading bytes.
    pub header: &'static [u8],
    /// Total frame length in bytes.
    pub length: usize,
    /// Fixed last byte, if the family has one.
    pub tail: Option<u8>,
    pub byte_order: ByteOrder,
    pub checksum: Checksum,
    /// Leading payload bytes that are all zero while the sensor warms up.
    pub measurement_bytes: usize,
    /// Data words mapped to measurements.
    pub data_words: usize,
}

impl VariantSpec {
    /// Byte range of the payload inside a frame.
    pub const fn payload_range(&self) -> Range<usize> {
        self.header.len()..self.length - TRAILER_SIZE
    }

    /// Number of 16-bit words in the payload.
    pub const fn word_count(&self) -> usize {
        (self.length - TRAILER_SIZE - self.header.len()) / 2
    }

    /// The checksum stored in `frame`, or `None` if `frame` is shorter
    /// than `self.length`.
    pub(crate) fn stored_checksum(&self, frame: &[u8]) -> Option<u16> {
        let end = self.length;
        let trailer = frame.get(end - TRAILER_SIZE..end)?;
        Some(match self.checksum {
            Checksum::Sum16 => u16::from_be_bytes([trailer[0], trailer[1]]),
            Checksum::Sum8 => u16::from(trailer[0]),
        })
    }

    /// The checksum computed over `frame`, or `None` if `frame` is shorter
    /// than `self.length`.
    pub(crate) fn computed_checksum(&self, frame: &[u8]) -> Option<u16> {
        let sum = match self.checksum {
            Checksum::Sum16 => frame
                .get(..self.length - TRAILER_SIZE)?
                .iter()
                .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b))),
            Checksum::Sum8 => u16::from(
                frame
                    .get(self.payload_range())?
                    .iter()
                    .fold(0u8, |acc, &b| acc.wrapping_add(b)),
            ),
        };
        Some(sum)
    }
}

const PLANTOWER_32: &[u8] = b"BM\x00\x1c";
const PLANTOWER_24: &[u8] = b"BM\x00\x14";
const NOVA: &[u8] = &[0xAA, 0xC0];

static PMSX003: VariantSpec = VariantSpec {
    name: "PMSx003",
    header: PLANTOWER_32,
    length: 32,
    tail: None,
    byte_order: ByteOrder::BigEndian,
    checksum: Checksum::Sum16,
    measurement_bytes: 26,
    data_words: 12,
};

static PMS3003: VariantSpec = VariantSpec {
    name: "PMS3003",
    header: PLANTOWER_24,
    length: 24,
    tail: None,
    byte_order: ByteOrder::BigEndian,
    checksum: Checksum::Sum16,
    measurement_bytes: 18,
    data_words: 6,
};

static PMS5003S: VariantSpec = VariantSpec {
    name: "PMS5003S",
    header: PLANTOWER_32,
    length: 32,
    tail: None,
    byte_order: ByteOrder::BigEndian,
    checksum: Checksum::Sum16,
    measurement_bytes: 26,
    data_words: 13,
};

static SDS01X: VariantSpec = VariantSpec {
    name: "SDS01x",
    header: NOVA,
    length: 10,
    tail: Some(0xAB),
    byte_order: ByteOrder::LittleEndian,
    checksum: Checksum::Sum8,
    // PM2.5 and PM10; the device id that follows is never zero.
    measurement_bytes: 4,
    data_words: 2,
};

/// Supported sensor families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorVariant {
    /// Plantower PMS1003/PMS5003/PMS7003/PMSA003: 32-byte frames with particle counts.
    Pmsx003,
    /// Plantower PMS3003: 24-byte frames, mass concentrations only.
    Pms3003,
    /// Plantower PMS5003S: PMSx003 layout with formaldehyde in the last word.
    Pms5003s,
    /// NovaFitness SDS011/SDS018: 10-byte frames, PM2.5 and PM10 ×10.
    Sds01x,
}

impl SensorVariant {
    pub const ALL: [SensorVariant; 4] = [
        SensorVariant::Pmsx003,
        SensorVariant::Pms3003,
        SensorVariant::Pms5003s,
        SensorVariant::Sds01x,
    ];

    /// The constant wire description of this family.
    pub fn spec(self) -> &'static VariantSpec {
        match self {
            SensorVariant::Pmsx003 => &PMSX003,
            SensorVariant::Pms3003 => &PMS3003,
            SensorVariant::Pms5003s => &PMS5003S,
            SensorVariant::Sds01x => &SDS01X,
        }
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

impl fmt::Display for SensorVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SensorVariant {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let variant = match s.trim().to_ascii_uppercase().as_str() {
            "PMSX003" | "PMS1003" | "PMS5003" | "PMS7003" | "PMSA003" => SensorVariant::Pmsx003,
            "PMS3003" => SensorVariant::Pms3003,
            "PMS5003S" => SensorVariant::Pms5003s,
            "SDS01X" | "SDS011" | "SDS018" => SensorVariant::Sds01x,
            _ => return Err(FrameError::UnknownVariant(s.to_string())),
        };
        Ok(variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_are_consistent() {
        for variant in SensorVariant::ALL {
            let spec = variant.spec();
            let payload = spec.payload_range();
            assert_eq!(payload.len() % 2, 0, "{variant}: odd payload");
            assert_eq!(spec.word_count() * 2, payload.len());
            assert!(spec.data_words <= spec.word_count(), "{variant}");
            assert!(spec.measurement_bytes <= payload.len(), "{variant}");
        }
    }

    #[test]
    fn plantower_headers_carry_payload_length() {
        for variant in [SensorVariant::Pmsx003, SensorVariant::Pms3003] {
            let spec = variant.spec();
            let declared = u16::from_be_bytes([spec.header[2], spec.header[3]]) as usize;
            assert_eq!(declared, spec.length - 4);
        }
    }

    #[test]
    fn word_counts() {
        assert_eq!(SensorVariant::Pmsx003.spec().word_count(), 13);
        assert_eq!(SensorVariant::Pms3003.spec().word_count(), 9);
        assert_eq!(SensorVariant::Pms5003s.spec().word_count(), 13);
        assert_eq!(SensorVariant::Sds01x.spec().word_count(), 3);
    }

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("PMSx003".parse::<SensorVariant>(), Ok(SensorVariant::Pmsx003));
        assert_eq!("pms7003".parse::<SensorVariant>(), Ok(SensorVariant::Pmsx003));
        assert_eq!("PMSA003".parse::<SensorVariant>(), Ok(SensorVariant::Pmsx003));
        assert_eq!("PMS3003".parse::<SensorVariant>(), Ok(SensorVariant::Pms3003));
        assert_eq!("pms5003s".parse::<SensorVariant>(), Ok(SensorVariant::Pms5003s));
        assert_eq!("SDS011".parse::<SensorVariant>(), Ok(SensorVariant::Sds01x));
        assert_eq!(" sds01x ".parse::<SensorVariant>(), Ok(SensorVariant::Sds01x));
        assert_eq!(
            "SDS198".parse::<SensorVariant>(),
            Err(FrameError::UnknownVariant("SDS198".to_string()))
        );
    }

    #[test]
    fn display_round_trips_through_parse() {
        for variant in SensorVariant::ALL {
            assert_eq!(variant.to_string().parse::<SensorVariant>(), Ok(variant));
        }
    }

    #[test]
    fn sum16_checksum_of_known_frame() {
        let frame = [
            0x42, 0x4d, 0x00, 0x1c, 0x00, 0x05, 0x00, 0x0d, 0x00, 0x16, 0x00, 0x05, 0x00, 0x0d,
            0x00, 0x16, 0x02, 0xfd, 0x00, 0xfc, 0x00, 0x1d, 0x00, 0x0f, 0x00, 0x06, 0x00, 0x06,
            0x97, 0x00, 0x03, 0xc5,
        ];
        let spec = SensorVariant::Pmsx003.spec();
        assert_eq!(spec.computed_checksum(&frame), Some(965));
        assert_eq!(spec.stored_checksum(&frame), Some(965));
    }

    #[test]
    fn sum8_checksum_covers_payload_only() {
        let frame = [0xAA, 0xC0, 0xD4, 0x04, 0x3A, 0x0A, 0xA1, 0x60, 0x1D, 0xAB];
        let spec = SensorVariant::Sds01x.spec();
        assert_eq!(spec.computed_checksum(&frame), Some(0x1D));
        assert_eq!(spec.stored_checksum(&frame), Some(0x1D));
    }

    #[test]
    fn checksums_of_short_slices_are_none() {
        for variant in SensorVariant::ALL {
            let spec = variant.spec();
            let short = vec![0x42; spec.length - 1];
            assert_eq!(spec.stored_checksum(&short), None, "{variant}");
            assert_eq!(spec.computed_checksum(&short), None, "{variant}");
            assert_eq!(spec.stored_checksum(&[]), None, "{variant}");
        }
    }
}
