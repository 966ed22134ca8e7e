use std::io;

use pmstream_frame::SensorVariant;
use pmstream_obs::{
    pump, FormatError, FormatKind, FormatSink, FormatSpec, JsonSink, Observation,
    ObservationReader, Sink,
};

use crate::cmd::{SensorArgs, SerialArgs};
use crate::exit::{format_error, pump_error, CliResult, SUCCESS};

pub fn run(args: SerialArgs, sensor: &SensorArgs) -> CliResult<i32> {
    let mut sink = build_sink(args.format.as_deref(), sensor.sensor_model)?;

    let reader = sensor.open_reader()?;
    let observations = sensor.limit(ObservationReader::new(reader));
    pump(observations, &mut sink).map_err(pump_error)?;

    Ok(SUCCESS)
}

/// Resolve `--format` for `variant` before the port is opened.
fn build_sink(
    format: Option<&str>,
    variant: SensorVariant,
) -> CliResult<Box<dyn Sink<Observation>>> {
    let stdout = io::stdout();
    let sink: Box<dyn Sink<Observation>> = match format {
        Some("json") => Box::new(JsonSink::new(stdout)),
        Some(code) => {
            let spec: FormatSpec = code.parse().map_err(|err| format_error("--format", err))?;
            if !spec.supports(variant) {
                let err = FormatError::Unsupported {
                    code: spec.to_string(),
                    variant,
                };
                return Err(format_error("--format", err));
            }
            let header = spec.kind == FormatKind::Csv;
            Box::new(FormatSink::new(stdout, spec).with_header(header))
        }
        None => Box::new(FormatSink::new(stdout, FormatSpec::default())),
    };
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::USAGE;

    #[test]
    fn rejects_unknown_format_codes_before_opening_the_port() {
        let err = build_sink(Some("bogus"), SensorVariant::Pmsx003).err().unwrap();
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("bogus"), "{}", err.message);
    }

    #[test]
    fn rejects_formats_the_sensor_cannot_fill() {
        let err = build_sink(Some("num"), SensorVariant::Pms3003).err().unwrap();
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("PMS3003"), "{}", err.message);

        assert!(build_sink(Some("cf"), SensorVariant::Sds01x).is_err());
        assert!(build_sink(Some("hcho"), SensorVariant::Pmsx003).is_err());
        assert!(build_sink(Some("hcho"), SensorVariant::Pms5003s).is_ok());
    }

    #[test]
    fn accepts_json_and_codes() {
        assert!(build_sink(Some("json"), SensorVariant::Sds01x).is_ok());
        assert!(build_sink(Some("04pm"), SensorVariant::Pmsx003).is_ok());
        assert!(build_sink(None, SensorVariant::Pms3003).is_ok());
    }
}
