use serde::{Serialize, Serializer};

use pmstream_frame::{decode_buffer, FrameError, RawFrame, SensorVariant};

use crate::error::FormatError;

/// PM1.0, PM2.5 and PM10 mass concentrations [ug/m3].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MassConcentration {
    pub pm01: u16,
    pub pm25: u16,
    pub pm10: u16,
}

impl MassConcentration {
    fn from_words(words: &[u16]) -> Self {
        Self {
            pm01: words[0],
            pm25: words[1],
            pm10: words[2],
        }
    }

    fn values(&self) -> [u16; 3] {
        [self.pm01, self.pm25, self.pm10]
    }
}

/// Particles per 0.1 L above each size threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParticleCounts {
    pub n0_3: u16,
    pub n0_5: u16,
    pub n1_0: u16,
    pub n2_5: u16,
    pub n5_0: u16,
    pub n10_0: u16,
}

impl ParticleCounts {
    fn from_words(words: &[u16]) -> Self {
        Self {
            n0_3: words[0],
            n0_5: words[1],
            n1_0: words[2],
            n2_5: words[3],
            n5_0: words[4],
            n10_0: words[5],
        }
    }

    pub(crate) fn values(&self) -> [u16; 6] {
        [
            self.n0_3, self.n0_5, self.n1_0, self.n2_5, self.n5_0, self.n10_0,
        ]
    }
}

/// Family-specific measurements of one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reading {
    /// Plantower families.
    Plantower {
        /// cf=1 estimates.
        raw: MassConcentration,
        /// Calibrated concentrations.
        pm: MassConcentration,
        #[serde(skip_serializing_if = "Option::is_none")]
        counts: Option<ParticleCounts>,
        /// Formaldehyde [ug/m3], PMS5003S only.
        #[serde(skip_serializing_if = "Option::is_none")]
        hcho: Option<u16>,
    },
    /// NovaFitness families. Values are PM x10 as sent on the wire.
    Nova { raw25: u16, raw10: u16 },
}

/// One decoded measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    time: i64,
    #[serde(rename = "sensor", serialize_with = "serialize_variant")]
    variant: SensorVariant,
    #[serde(flatten)]
    reading: Reading,
}

fn serialize_variant<S: Serializer>(
    variant: &SensorVariant,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(variant.name())
}

impl Observation {
    /// Name the fields of a validated frame.
    ///
    /// `time` is seconds since epoch; `None` stamps the current time.
    pub fn build(frame: &RawFrame, time: Option<i64>) -> Self {
        let time = time.unwrap_or_else(now);
        let words = frame.fields();
        let variant = frame.variant();

        let reading = match variant {
            SensorVariant::Pmsx003 => Reading::Plantower {
                raw: MassConcentration::from_words(&words[0..3]),
                pm: MassConcentration::from_words(&words[3..6]),
                counts: Some(ParticleCounts::from_words(&words[6..12])),
                hcho: None,
            },
            SensorVariant::Pms3003 => Reading::Plantower {
                raw: MassConcentration::from_words(&words[0..3]),
                pm: MassConcentration::from_words(&words[3..6]),
                counts: None,
                hcho: None,
            },
            SensorVariant::Pms5003s => Reading::Plantower {
                raw: MassConcentration::from_words(&words[0..3]),
                pm: MassConcentration::from_words(&words[3..6]),
                counts: Some(ParticleCounts::from_words(&words[6..12])),
                hcho: Some(words[12]),
            },
            SensorVariant::Sds01x => Reading::Nova {
                raw25: words[0],
                raw10: words[1],
            },
        };

        Self {
            time,
            variant,
            reading,
        }
    }

    /// Validate `buffer` as one frame (see [`decode_buffer`]) and build it.
    pub fn decode(
        buffer: &[u8],
        variant: SensorVariant,
        time: Option<i64>,
    ) -> Result<Self, FrameError> {
        let frame = decode_buffer(buffer, variant)?;
        Ok(Self::build(&frame, time))
    }

    /// Seconds since epoch.
    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn variant(&self) -> SensorVariant {
        self.variant
    }

    pub fn reading(&self) -> &Reading {
        &self.reading
    }

    /// Measurement time in the local time zone, `%F %T`.
    pub fn local_time(&self) -> String {
        match jiff::Timestamp::from_second(self.time) {
            Ok(ts) => ts
                .to_zoned(jiff::tz::TimeZone::system())
                .strftime("%F %T")
                .to_string(),
            Err(_) => self.time.to_string(),
        }
    }

    /// Project a named group of fields.
    ///
    /// Codes: `pm`, `raw`, `num`, `cf`, `hcho`. SDS01x supports only `pm`,
    /// in ug/m3.
    pub fn subset(&self, code: &str) -> Result<Vec<(&'static str, f64)>, FormatError> {
        let unsupported = || FormatError::Unsupported {
            code: code.to_string(),
            variant: self.variant,
        };

        match (&self.reading, code) {
            (Reading::Plantower { pm, .. }, "pm") => {
                Ok(named(["pm01", "pm25", "pm10"], pm.values()))
            }
            (Reading::Plantower { raw, .. }, "raw") => {
                Ok(named(["raw01", "raw25", "raw10"], raw.values()))
            }
            (
                Reading::Plantower {
                    counts: Some(counts),
                    ..
                },
                "num",
            ) => Ok(named(
                ["n0_3", "n0_5", "n1_0", "n2_5", "n5_0", "n10_0"],
                counts.values(),
            )),
            (Reading::Plantower { raw, pm, .. }, "cf") => Ok(vec![
                ("cf01", collection_factor(pm.pm01, raw.pm01)),
                ("cf25", collection_factor(pm.pm25, raw.pm25)),
                ("cf10", collection_factor(pm.pm10, raw.pm10)),
            ]),
            (
                Reading::Plantower {
                    hcho: Some(hcho), ..
                },
                "hcho",
            ) => Ok(vec![("hcho", f64::from(*hcho))]),
            (Reading::Nova { raw25, raw10 }, "pm") => Ok(vec![
                ("pm25", f64::from(*raw25) / 10.0),
                ("pm10", f64::from(*raw10) / 10.0),
            ]),
            (_, "raw" | "num" | "cf" | "hcho") => Err(unsupported()),
            _ => Err(FormatError::InvalidSpec(code.to_string())),
        }
    }
}

fn named<const N: usize>(names: [&'static str; N], values: [u16; N]) -> Vec<(&'static str, f64)> {
    names
        .into_iter()
        .zip(values.into_iter().map(f64::from))
        .collect()
}

/// Ratio of calibrated to cf=1 concentration.
///
/// 1 when both are zero, 0 when only `raw` is zero.
pub fn collection_factor(pm: u16, raw: u16) -> f64 {
    match (pm, raw) {
        (0, 0) => 1.0,
        (_, 0) => 0.0,
        (pm, raw) => f64::from(pm) / f64::from(raw),
    }
}

pub(crate) fn now() -> i64 {
    jiff::Timestamp::now().as_second()
}
