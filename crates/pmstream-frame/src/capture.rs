//! Capture files: raw frames as `time,sensor,hex` rows.
//!
//! ```text
//! time,sensor,hex
//! 1567201793,PMSx003,424d001c0005000d00160005000d001602fd00fc001d000f00060006970003c5
//! ```

use std::io::{BufRead, ErrorKind, Lines, Write};

use crate::codec::{decode_buffer, RawFrame};
use crate::error::{CaptureError, FrameError};
use crate::variant::SensorVariant;

/// Header row of every capture file.
pub const CAPTURE_HEADER: &str = "time,sensor,hex";

/// One row of a capture file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    /// Capture time, seconds since epoch.
    pub time: i64,
    /// Sensor family name as written by the capturing side.
    pub sensor: String,
    /// The captured frame bytes.
    pub frame: Vec<u8>,
}

impl CaptureRecord {
    pub fn new(time: i64, frame: &RawFrame) -> Self {
        Self {
            time,
            sensor: frame.variant().name().to_string(),
            frame: frame.as_bytes().to_vec(),
        }
    }

    /// The family named in the row.
    pub fn variant(&self) -> Result<SensorVariant, FrameError> {
        self.sensor.parse()
    }

    /// Re-validate the captured bytes as a `variant` frame.
    pub fn validate(&self, variant: SensorVariant) -> Result<RawFrame, FrameError> {
        decode_buffer(&self.frame, variant)
    }

    /// The row as written to a capture file, without line terminator.
    pub fn to_row(&self) -> String {
        format!("{},{},{}", self.time, self.sensor, hex::encode(&self.frame))
    }

    fn parse_row(line_no: usize, line: &str) -> Result<Self, CaptureError> {
        let malformed = |reason: &str| CaptureError::Malformed {
            line: line_no,
            reason: reason.to_string(),
        };

        let mut columns = line.trim().splitn(3, ',');
        let (Some(time), Some(sensor), Some(hex_col)) =
            (columns.next(), columns.next(), columns.next())
        else {
            return Err(malformed("expected 3 columns"));
        };

        let time = time
            .trim()
            .parse::<i64>()
            .map_err(|_| malformed("time is not an integer"))?;
        let sensor = sensor.trim();
        if sensor.is_empty() {
            return Err(malformed("empty sensor name"));
        }
        let frame = hex::decode(hex_col.trim()).map_err(|source| CaptureError::Hex {
            line: line_no,
            source,
        })?;

        Ok(Self {
            time,
            sensor: sensor.to_string(),
            frame,
        })
    }
}

/// Writes capture rows to any `Write` target.
pub struct CaptureWriter<W> {
    inner: W,
    needs_header: bool,
}

impl<W: Write> CaptureWriter<W> {
    /// A writer for a new, empty target; the header row goes first.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            needs_header: true,
        }
    }

    /// A writer appending to a target that already holds rows.
    pub fn appending(inner: W) -> Self {
        Self {
            inner,
            needs_header: false,
        }
    }

    /// Append one frame captured at `time`.
    pub fn write_frame(&mut self, time: i64, frame: &RawFrame) -> Result<(), CaptureError> {
        self.write_record(&CaptureRecord::new(time, frame))
    }

    pub fn write_record(&mut self, record: &CaptureRecord) -> Result<(), CaptureError> {
        if self.needs_header {
            writeln!(self.inner, "{CAPTURE_HEADER}")?;
            self.needs_header = false;
        }
        writeln!(self.inner, "{}", record.to_row())?;
        self.flush()
    }

    /// Flush the underlying target.
    pub fn flush(&mut self) -> Result<(), CaptureError> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(CaptureError::Io(err)),
            }
        }
    }

    /// Borrow the underlying target.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Consume the writer and return the target.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Iterates the rows of a capture file.
///
/// The header row and blank lines are skipped.
pub struct CaptureReader<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> CaptureReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            lines: inner.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for CaptureReader<R> {
    type Item = Result<CaptureRecord, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(CaptureError::Io(err))),
            };
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed == CAPTURE_HEADER {
                continue;
            }
            return Some(CaptureRecord::parse_row(self.line_no, trimmed));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::validate;

    const GOOD: &str = "424d001c0005000d00160005000d001602fd00fc001d000f00060006970003c5";

    fn good_frame() -> RawFrame {
        validate(&hex::decode(GOOD).unwrap(), SensorVariant::Pmsx003).unwrap()
    }

    #[test]
    fn writes_header_once() {
        let mut writer = CaptureWriter::new(Vec::new());
        writer.write_frame(1567201793, &good_frame()).unwrap();
        writer.write_frame(1567201794, &good_frame()).unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "time,sensor,hex");
        assert_eq!(lines[1], format!("1567201793,PMSx003,{GOOD}"));
        assert!(lines[2].starts_with("1567201794,PMSx003,"));
    }

    #[test]
    fn appending_writer_skips_header() {
        let mut writer = CaptureWriter::appending(Vec::new());
        writer.write_frame(1, &good_frame()).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert!(!text.contains(CAPTURE_HEADER));
    }

    #[test]
    fn reads_back_written_rows() {
        let mut writer = CaptureWriter::new(Vec::new());
        writer.write_frame(1567201793, &good_frame()).unwrap();
        let wire = writer.into_inner();

        let records: Vec<_> = CaptureReader::new(Cursor::new(wire))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.time, 1567201793);
        assert_eq!(record.variant(), Ok(SensorVariant::Pmsx003));
        let frame = record.validate(SensorVariant::Pmsx003).unwrap();
        assert_eq!(frame.to_hex(), GOOD);
    }

    #[test]
    fn skips_blank_lines() {
        let text = format!("time,sensor,hex\n\n1,PMSx003,{GOOD}\n\n");
        let records: Vec<_> = CaptureReader::new(Cursor::new(text))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn reports_malformed_rows_with_line_numbers() {
        let text = "time,sensor,hex\nnot-a-row\n";
        let err = CaptureReader::new(Cursor::new(text))
            .next()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, CaptureError::Malformed { line: 2, .. }), "{err:?}");

        let text = "x,PMSx003,424d\n";
        let err = CaptureReader::new(Cursor::new(text))
            .next()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, CaptureError::Malformed { line: 1, .. }), "{err:?}");

        let text = "1,PMSx003,42zz\n";
        let err = CaptureReader::new(Cursor::new(text))
            .next()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, CaptureError::Hex { line: 1, .. }), "{err:?}");
    }

    #[test]
    fn unknown_sensor_name_is_reported_on_lookup() {
        let record = CaptureRecord {
            time: 0,
            sensor: "SDS198".to_string(),
            frame: Vec::new(),
        };
        assert!(matches!(
            record.variant(),
            Err(FrameError::UnknownVariant(_))
        ));
    }
}
