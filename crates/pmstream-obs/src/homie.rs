//! Observations as Homie-convention broker topics.
//!
//! Each mass concentration becomes a node under the root topic:
//!
//! ```text
//! homie/test/pm25/$type          PM2.5
//! homie/test/pm25/$properties    sensor,unit,concentration
//! homie/test/pm25/sensor         PMSx003
//! homie/test/pm25/unit           ug/m3
//! homie/test/pm25/concentration  13
//! ```
//!
//! Connecting to a broker (credentials, retained flags, last will) is up to
//! the [`Publish`] implementation; this module only decides topics and
//! payloads, in both directions.

use tracing::debug;

use crate::error::{SinkError, TopicError};
use crate::observation::{now, Observation};
use crate::sink::Sink;

/// Unit of every published concentration.
pub const PM_UNIT: &str = "ug/m3";

/// Delivers one message to a broker.
pub trait Publish {
    fn send(&mut self, topic: &str, payload: &str) -> Result<(), SinkError>;
}

impl<F> Publish for F
where
    F: FnMut(&str, &str) -> Result<(), SinkError>,
{
    fn send(&mut self, topic: &str, payload: &str) -> Result<(), SinkError> {
        self(topic, payload)
    }
}

/// Publishes the `pm` subset of each observation under a root topic.
///
/// The first observation also announces the node metadata, so the sensor
/// name comes from the frames actually read.
pub struct HomieSink<P> {
    publisher: P,
    topic: String,
    announced: bool,
}

impl<P: Publish> HomieSink<P> {
    pub fn new(publisher: P, topic: impl Into<String>) -> Self {
        let topic = topic.into().trim_end_matches('/').to_string();
        Self {
            publisher,
            topic,
            announced: false,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn into_inner(self) -> P {
        self.publisher
    }

    fn announce(
        &mut self,
        obs: &Observation,
        fields: &[(&'static str, f64)],
    ) -> Result<(), SinkError> {
        let sensor = obs.variant().name();
        for (field, _) in fields {
            let node = format!("{}/{field}", self.topic);
            self.publisher.send(&format!("{node}/$type"), node_label(field))?;
            self.publisher
                .send(&format!("{node}/$properties"), "sensor,unit,concentration")?;
            self.publisher.send(&format!("{node}/sensor"), sensor)?;
            self.publisher.send(&format!("{node}/unit"), PM_UNIT)?;
        }
        debug!(topic = %self.topic, sensor, nodes = fields.len(), "homie nodes announced");
        Ok(())
    }
}

impl<P: Publish> Sink<Observation> for HomieSink<P> {
    fn publish(&mut self, obs: &Observation) -> Result<(), SinkError> {
        let fields = obs.subset("pm")?;
        if !self.announced {
            self.announce(obs, &fields)?;
            self.announced = true;
        }
        for (field, value) in fields {
            let topic = format!("{}/{field}/concentration", self.topic);
            self.publisher.send(&topic, &value.to_string())?;
        }
        Ok(())
    }
}

fn node_label(field: &str) -> &str {
    match field {
        "pm01" => "PM1",
        "pm25" => "PM2.5",
        "pm10" => "PM10",
        other => other,
    }
}

/// One measurement recovered from a broker message.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicReading {
    /// Seconds since epoch.
    pub time: i64,
    pub location: String,
    pub measurement: String,
    pub value: f64,
}

impl TopicReading {
    /// Parse a `root/location/measurement/property` message, e.g.
    /// `homie/kitchen/pm10/concentration` carrying `27`.
    ///
    /// `time` is seconds since epoch; `None` stamps the current time.
    pub fn decode(topic: &str, payload: &str, time: Option<i64>) -> Result<Self, TopicError> {
        let levels: Vec<&str> = topic.split('/').collect();
        let [_, location, measurement, _] = levels.as_slice() else {
            return Err(TopicError::Depth {
                topic: topic.to_string(),
                levels: levels.len(),
            });
        };
        if levels.iter().any(|level| level.starts_with('$')) {
            return Err(TopicError::System(topic.to_string()));
        }
        let value = payload
            .trim()
            .parse::<f64>()
            .map_err(|_| TopicError::NonNumeric(payload.to_string()))?;

        Ok(Self {
            time: time.unwrap_or_else(now),
            location: location.to_string(),
            measurement: measurement.to_string(),
            value,
        })
    }
}
