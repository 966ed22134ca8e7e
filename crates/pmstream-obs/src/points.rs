//! Time-series points for a measurement database.
//!
//! Every measurement becomes its own point named after the field, with the
//! value under `fields.value`:
//!
//! ```json
//! {"measurement":"pm25","tags":{"location":"test"},"time":"2019-08-30T21:49:53Z","fields":{"value":13.0}}
//! ```
//!
//! [`PointSink`] takes observations from a sensor, or relays
//! [`TopicReading`]s recovered from broker messages.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::SinkError;
use crate::homie::TopicReading;
use crate::observation::Observation;
use crate::sink::Sink;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointFields {
    pub value: f64,
}

/// One timestamped value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    /// UTC, RFC 3339 (`%FT%TZ`).
    pub time: String,
    pub fields: PointFields,
}

impl Point {
    /// `time` is seconds since epoch.
    pub fn new(
        measurement: impl Into<String>,
        tags: BTreeMap<String, String>,
        time: i64,
        value: f64,
    ) -> Result<Self, SinkError> {
        let time = jiff::Timestamp::from_second(time)?.to_string();
        Ok(Self {
            measurement: measurement.into(),
            tags,
            time,
            fields: PointFields { value },
        })
    }
}

/// Writes a batch of points to a database.
pub trait WritePoints {
    fn write_points(&mut self, points: &[Point]) -> Result<(), SinkError>;
}

impl<F> WritePoints for F
where
    F: FnMut(&[Point]) -> Result<(), SinkError>,
{
    fn write_points(&mut self, points: &[Point]) -> Result<(), SinkError> {
        self(points)
    }
}

/// One batch of points per observation, or per relayed reading.
pub struct PointSink<W> {
    writer: W,
    tags: BTreeMap<String, String>,
}

impl<W: WritePoints> PointSink<W> {
    /// `tags` are attached to every point.
    pub fn new(writer: W, tags: BTreeMap<String, String>) -> Self {
        Self { writer, tags }
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Forward one broker message.
    ///
    /// Messages that are not readings (metadata, wrong depth, text payloads)
    /// are skipped and reported as `Ok(false)`.
    pub fn relay(&mut self, topic: &str, payload: &str) -> Result<bool, SinkError> {
        match TopicReading::decode(topic, payload, None) {
            Ok(reading) => {
                Sink::<TopicReading>::publish(self, &reading)?;
                Ok(true)
            }
            Err(err) => {
                debug!(topic, error = %err, "message skipped");
                Ok(false)
            }
        }
    }
}

impl<W: WritePoints> Sink<Observation> for PointSink<W> {
    fn publish(&mut self, obs: &Observation) -> Result<(), SinkError> {
        let points = obs
            .subset("pm")?
            .into_iter()
            .map(|(field, value)| Point::new(field, self.tags.clone(), obs.time(), value))
            .collect::<Result<Vec<_>, _>>()?;
        self.writer.write_points(&points)
    }
}

impl<W: WritePoints> Sink<TopicReading> for PointSink<W> {
    fn publish(&mut self, reading: &TopicReading) -> Result<(), SinkError> {
        let mut tags = self.tags.clone();
        tags.insert("location".to_string(), reading.location.clone());
        let point = Point::new(reading.measurement.as_str(), tags, reading.time, reading.value)?;
        self.writer.write_points(&[point])
    }
}

#[cfg(test)]
mod tests {
    use pmstream_frame::{validate, SensorVariant};

    use super::*;

    const PMSX003_GOOD: &str = "424d001c0005000d00160005000d001602fd00fc001d000f00060006970003c5";
    const SDS01X_GOOD: &str = "aac0d4043a0aa1601dab";

    #[derive(Default)]
    struct Batches(Vec<Vec<Point>>);

    impl WritePoints for Batches {
        fn write_points(&mut self, points: &[Point]) -> Result<(), SinkError> {
            self.0.push(points.to_vec());
            Ok(())
        }
    }

    fn obs(hex_str: &str, variant: SensorVariant) -> Observation {
        let frame = validate(&hex::decode(hex_str).unwrap(), variant).unwrap();
        Observation::build(&frame, Some(1567201793))
    }

    fn location(name: &str) -> BTreeMap<String, String> {
        BTreeMap::from([("location".to_string(), name.to_string())])
    }

    #[test]
    fn one_point_per_pm_field() {
        let mut sink = PointSink::new(Batches::default(), location("test"));
        sink.publish(&obs(PMSX003_GOOD, SensorVariant::Pmsx003)).unwrap();

        let batches = sink.into_inner().0;
        assert_eq!(batches.len(), 1);
        let points = &batches[0];
        let names: Vec<_> = points.iter().map(|p| p.measurement.as_str()).collect();
        assert_eq!(names, ["pm01", "pm25", "pm10"]);
        assert_eq!(points[1].fields.value, 13.0);
        assert_eq!(points[1].time, "2019-08-30T21:49:53Z");
        assert_eq!(points[1].tags, location("test"));
    }

    #[test]
    fn points_serialize_in_database_shape() {
        let mut sink = PointSink::new(Batches::default(), location("test"));
        sink.publish(&obs(SDS01X_GOOD, SensorVariant::Sds01x)).unwrap();

        let batches = sink.into_inner().0;
        let value = serde_json::to_value(&batches[0][0]).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "measurement": "pm25",
                "tags": {"location": "test"},
                "time": "2019-08-30T21:49:53Z",
                "fields": {"value": 123.6},
            })
        );
    }

    #[test]
    fn relays_readings_and_skips_other_messages() {
        let mut sink = PointSink::new(Batches::default(), BTreeMap::new());
        assert!(sink.relay("homie/kitchen/pm10/concentration", "27").unwrap());
        assert!(!sink.relay("homie/kitchen/pm10/$type", "PM10").unwrap());
        assert!(!sink.relay("homie/kitchen/pm10/unit", "ug/m3").unwrap());
        assert!(!sink.relay("homie/kitchen", "27").unwrap());

        let batches = sink.into_inner().0;
        assert_eq!(batches.len(), 1);
        let point = &batches[0][0];
        assert_eq!(point.measurement, "pm10");
        assert_eq!(point.tags, location("kitchen"));
        assert_eq!(point.fields.value, 27.0);
    }

    #[test]
    fn reading_location_overrides_configured_tag() {
        let mut tags = location("default");
        tags.insert("site".to_string(), "lab".to_string());
        let mut sink = PointSink::new(Batches::default(), tags);
        let reading =
            TopicReading::decode("homie/attic/pm25/concentration", "4", Some(0)).unwrap();
        sink.publish(&reading).unwrap();

        let batches = sink.into_inner().0;
        let point = &batches[0][0];
        assert_eq!(point.tags["location"], "attic");
        assert_eq!(point.tags["site"], "lab");
        assert_eq!(point.time, "1970-01-01T00:00:00Z");
    }

    #[test]
    fn out_of_range_time_is_an_error() {
        let err = Point::new("pm25", BTreeMap::new(), i64::MAX, 1.0).unwrap_err();
        assert!(matches!(err, SinkError::Timestamp(_)));
    }

    #[test]
    fn writer_failures_propagate() {
        let writer = |_: &[Point]| -> Result<(), SinkError> {
            Err(SinkError::Rejected("database offline".into()))
        };
        let mut sink = PointSink::new(writer, BTreeMap::new());
        let err = sink.relay("homie/test/pm25/concentration", "1").unwrap_err();
        assert!(matches!(err, SinkError::Rejected(_)));
    }
}
