//! Text rendering of observations.
//!
//! A [`FormatSpec`] is parsed once from a short code such as `csv`, `4csv`,
//! `04pm` or `.2cf`: an optional width (a leading `0` zero-pads), an
//! optional `.precision`, then the format kind.

use std::fmt;
use std::str::FromStr;

use pmstream_frame::SensorVariant;

use crate::error::FormatError;
use crate::observation::{collection_factor, Observation, Reading};

/// What a [`FormatSpec`] renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatKind {
    /// Timestamp and every numeric field, comma separated.
    Csv,
    /// Column names matching [`FormatKind::Csv`].
    Header,
    /// Calibrated mass concentrations.
    #[default]
    Pm,
    /// cf=1 mass concentrations.
    Raw,
    /// Particle counts.
    Num,
    /// Collection factors as percentages.
    Cf,
    /// Formaldehyde.
    Hcho,
}

impl FormatKind {
    pub fn code(self) -> &'static str {
        match self {
            FormatKind::Csv => "csv",
            FormatKind::Header => "header",
            FormatKind::Pm => "pm",
            FormatKind::Raw => "raw",
            FormatKind::Num => "num",
            FormatKind::Cf => "cf",
            FormatKind::Hcho => "hcho",
        }
    }
}

/// A parsed format code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatSpec {
    pub kind: FormatKind,
    /// Minimum width of each numeric value.
    pub width: Option<usize>,
    /// Pad numeric values with zeros instead of spaces.
    pub zero_pad: bool,
    /// Digits after the decimal point for fractional values.
    pub precision: Option<usize>,
}

impl FormatSpec {
    pub fn new(kind: FormatKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Whether observations of `variant` carry the fields this format needs.
    pub fn supports(&self, variant: SensorVariant) -> bool {
        match self.kind {
            FormatKind::Csv | FormatKind::Header | FormatKind::Pm => true,
            FormatKind::Raw | FormatKind::Cf => variant != SensorVariant::Sds01x,
            FormatKind::Num => matches!(
                variant,
                SensorVariant::Pmsx003 | SensorVariant::Pms5003s
            ),
            FormatKind::Hcho => variant == SensorVariant::Pms5003s,
        }
    }

    /// Render `obs`.
    pub fn render(&self, obs: &Observation) -> Result<String, FormatError> {
        if !self.supports(obs.variant()) {
            return Err(self.unsupported(obs));
        }
        match obs.reading() {
            Reading::Plantower { .. } => self.render_plantower(obs),
            Reading::Nova { .. } => self.render_nova(obs),
        }
    }

    fn render_plantower(&self, obs: &Observation) -> Result<String, FormatError> {
        let Reading::Plantower {
            raw,
            pm,
            counts,
            hcho,
        } = obs.reading()
        else {
            return Err(self.unsupported(obs));
        };

        let line = match self.kind {
            FormatKind::Csv => {
                let mut columns = vec![obs.time().to_string()];
                columns.extend([raw.pm01, raw.pm25, raw.pm10].map(|v| self.int(v)));
                columns.extend([pm.pm01, pm.pm25, pm.pm10].map(|v| self.int(v)));
                match counts {
                    Some(counts) => columns.extend(counts.values().map(|v| self.int(v))),
                    None => columns.extend(std::iter::repeat_n(String::new(), 6)),
                }
                if let Some(hcho) = hcho {
                    columns.push(self.int(*hcho));
                }
                columns.join(", ")
            }
            FormatKind::Header => {
                let mut columns = vec![
                    "time", "raw01", "raw25", "raw10", "pm01", "pm25", "pm10", "n0_3", "n0_5",
                    "n1_0", "n2_5", "n5_0", "n10_0",
                ];
                if hcho.is_some() {
                    columns.push("HCHO");
                }
                columns.join(", ")
            }
            FormatKind::Pm => format!(
                "{}: PM1 {}, PM2.5 {}, PM10 {} ug/m3",
                obs.local_time(),
                self.int(pm.pm01),
                self.int(pm.pm25),
                self.int(pm.pm10)
            ),
            FormatKind::Raw => format!(
                "{}: PM1 {}, PM2.5 {}, PM10 {} ug/m3",
                obs.local_time(),
                self.int(raw.pm01),
                self.int(raw.pm25),
                self.int(raw.pm10)
            ),
            FormatKind::Num => {
                let Some(counts) = counts else {
                    return Err(self.unsupported(obs));
                };
                let [n0_3, n0_5, n1_0, n2_5, n5_0, n10_0] = counts.values().map(|v| self.int(v));
                format!(
                    "{}: N0.3 {n0_3}, N0.5 {n0_5}, N1.0 {n1_0}, N2.5 {n2_5}, N5.0 {n5_0}, N10 {n10_0} #/100cc",
                    obs.local_time()
                )
            }
            FormatKind::Cf => format!(
                "{}: CF1 {}, CF2.5 {}, CF10 {}",
                obs.local_time(),
                self.percent(collection_factor(pm.pm01, raw.pm01)),
                self.percent(collection_factor(pm.pm25, raw.pm25)),
                self.percent(collection_factor(pm.pm10, raw.pm10))
            ),
            FormatKind::Hcho => {
                let Some(hcho) = hcho else {
                    return Err(self.unsupported(obs));
                };
                format!("{}: HCHO {} ug/m3", obs.local_time(), self.int(*hcho))
            }
        };
        Ok(line)
    }

    fn render_nova(&self, obs: &Observation) -> Result<String, FormatError> {
        let Reading::Nova { raw25, raw10 } = *obs.reading() else {
            return Err(self.unsupported(obs));
        };
        let pm25 = f64::from(raw25) / 10.0;
        let pm10 = f64::from(raw10) / 10.0;

        let line = match self.kind {
            FormatKind::Csv => format!(
                "{}, {}, {}",
                obs.time(),
                self.float(pm25, 1),
                self.float(pm10, 1)
            ),
            FormatKind::Header => "time, pm25, pm10".to_string(),
            FormatKind::Pm => format!(
                "{}: PM2.5 {}, PM10 {} ug/m3",
                obs.local_time(),
                self.float(pm25, 1),
                self.float(pm10, 1)
            ),
            FormatKind::Raw | FormatKind::Num | FormatKind::Cf | FormatKind::Hcho => {
                return Err(self.unsupported(obs));
            }
        };
        Ok(line)
    }

    fn unsupported(&self, obs: &Observation) -> FormatError {
        FormatError::Unsupported {
            code: self.to_string(),
            variant: obs.variant(),
        }
    }

    fn int(&self, value: u16) -> String {
        match self.width {
            Some(width) if self.zero_pad => format!("{value:0width$}"),
            Some(width) => format!("{value:>width$}"),
            None => value.to_string(),
        }
    }

    fn float(&self, value: f64, default_precision: usize) -> String {
        let precision = self.precision.unwrap_or(default_precision);
        match self.width {
            Some(width) if self.zero_pad => format!("{value:0width$.precision$}"),
            Some(width) => format!("{value:>width$.precision$}"),
            None => format!("{value:.precision$}"),
        }
    }

    /// `ratio` as a percentage; the width counts the `%` sign.
    fn percent(&self, ratio: f64) -> String {
        let precision = self.precision.unwrap_or(0);
        let digits = format!("{:.precision$}", ratio * 100.0);
        let width = self.width.unwrap_or(0).saturating_sub(1);
        if self.zero_pad {
            format!("{digits:0>width$}%")
        } else {
            format!("{digits:>width$}%")
        }
    }
}

impl FromStr for FormatSpec {
    type Err = FormatError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let invalid = || FormatError::InvalidSpec(code.to_string());

        let split = code
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(invalid)?;
        let (modifiers, kind) = code.split_at(split);

        let kind = match kind {
            "csv" => FormatKind::Csv,
            "header" => FormatKind::Header,
            "pm" => FormatKind::Pm,
            "raw" => FormatKind::Raw,
            "num" => FormatKind::Num,
            "cf" => FormatKind::Cf,
            "hcho" => FormatKind::Hcho,
            _ => return Err(invalid()),
        };
        if kind == FormatKind::Header && !modifiers.is_empty() {
            return Err(invalid());
        }

        let (width, precision) = match modifiers.split_once('.') {
            Some((width, precision)) => (width, Some(precision)),
            None => (modifiers, None),
        };

        let parse = |digits: &str| -> Result<usize, FormatError> {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            digits.parse().map_err(|_| invalid())
        };

        let zero_pad = width.len() > 1 && width.starts_with('0');
        let width = match width {
            "" => None,
            digits => Some(parse(digits)?),
        };
        let precision = precision.map(parse).transpose()?;

        Ok(Self {
            kind,
            width,
            zero_pad,
            precision,
        })
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.zero_pad {
            f.write_str("0")?;
        }
        if let Some(width) = self.width {
            write!(f, "{width}")?;
        }
        if let Some(precision) = self.precision {
            write!(f, ".{precision}")?;
        }
        f.write_str(self.kind.code())
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = FormatSpec::default()
            .render(self)
            .map_err(|_| fmt::Error)?;
        f.write_str(&line)
    }
}
