use pmstream_frame::{ReadError, StreamReader};
use pmstream_source::ByteSource;

use crate::observation::Observation;

/// Turns the frames of a [`StreamReader`] into timestamped observations.
///
/// Each observation is stamped with the wall-clock time at which its frame
/// was validated.
pub struct ObservationReader<S> {
    frames: StreamReader<S>,
}

impl<S: ByteSource> ObservationReader<S> {
    pub fn new(frames: StreamReader<S>) -> Self {
        Self { frames }
    }

    /// The next observation, or `None` once the stream is exhausted or stopped.
    pub fn next_observation(&mut self) -> Result<Option<Observation>, ReadError> {
        Ok(self
            .frames
            .next_frame()?
            .map(|frame| Observation::build(&frame, None)))
    }

    pub fn frames(&self) -> &StreamReader<S> {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut StreamReader<S> {
        &mut self.frames
    }

    pub fn into_inner(self) -> StreamReader<S> {
        self.frames
    }
}

impl<S: ByteSource> Iterator for ObservationReader<S> {
    type Item = Result<Observation, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_observation().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pmstream_frame::SensorVariant;

    use super::*;
    use crate::observation::Reading;

    const PMSX003_GOOD: &str = "424d001c0005000d00160005000d001602fd00fc001d000f00060006970003c5";
    const SDS01X_GOOD: &str = "aac0d4043a0aa1601dab";

    #[test]
    fn yields_observations_until_end_of_stream() {
        let mut wire = vec![0xff, 0x00, 0x42];
        wire.extend(hex::decode(PMSX003_GOOD).unwrap());
        wire.extend(hex::decode(PMSX003_GOOD).unwrap());

        let reader = StreamReader::new(Cursor::new(wire), SensorVariant::Pmsx003);
        let observations: Vec<_> = ObservationReader::new(reader)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(observations.len(), 2);
        for obs in &observations {
            assert_eq!(obs.variant(), SensorVariant::Pmsx003);
            assert!(obs.time() > 0);
        }
    }

    #[test]
    fn nova_stream() {
        let wire = hex::decode(format!("ab{SDS01X_GOOD}{SDS01X_GOOD}aa")).unwrap();
        let reader = StreamReader::new(Cursor::new(wire), SensorVariant::Sds01x);
        let mut observations = ObservationReader::new(reader);

        let first = observations.next().unwrap().unwrap();
        assert_eq!(first.reading(), &Reading::Nova { raw25: 1236, raw10: 2618 });
        assert!(observations.next().unwrap().is_ok());
        assert!(observations.next().is_none());
        assert_eq!(observations.frames().stats().frames, 2);
    }
}
