use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use pmstream_frame::{CaptureReader, SensorVariant};
use pmstream_obs::{pump, HexSink, Observation};
use tracing::{debug, warn};

use crate::cmd::{RawArgs, SensorArgs};
use crate::exit::{capture_error, io_error, pump_error, CliResult, SUCCESS};

pub fn run(args: RawArgs, sensor: &SensorArgs) -> CliResult<i32> {
    if args.decode {
        let path = args.test_file.as_deref().unwrap_or(&sensor.serial);
        return decode_capture(path, sensor);
    }

    let reader = sensor.open_reader()?;
    let mut sink = if args.hexdump {
        HexSink::hexdump(io::stdout())
    } else {
        HexSink::new(io::stdout())
    };
    pump(sensor.limit(reader), &mut sink).map_err(pump_error)?;

    Ok(SUCCESS)
}

/// Print the observations stored in a capture file.
///
/// Rows for other sensor families are skipped; rows that fail validation
/// are logged and skipped.
fn decode_capture(path: &Path, sensor: &SensorArgs) -> CliResult<i32> {
    let file = File::open(path)
        .map_err(|err| io_error(&format!("cannot open capture {}", path.display()), err))?;
    let mut out = io::stdout().lock();

    let records = CaptureReader::new(BufReader::new(file));
    let mut printed = 0usize;
    for record in records {
        if sensor.samples.is_some_and(|samples| printed >= samples) {
            break;
        }
        let record = record.map_err(|err| capture_error("decode failed", err))?;
        if !same_family(&record.sensor, sensor.sensor_model) {
            debug!(sensor = %record.sensor, "skipping row for other sensor");
            continue;
        }
        match Observation::decode(&record.frame, sensor.sensor_model, Some(record.time)) {
            Ok(obs) => {
                writeln!(out, "{obs}").map_err(|err| io_error("write failed", err))?;
                printed += 1;
            }
            Err(err) => warn!(time = record.time, error = %err, "skipping invalid frame"),
        }
    }

    Ok(SUCCESS)
}

fn same_family(name: &str, variant: SensorVariant) -> bool {
    name.parse::<SensorVariant>()
        .is_ok_and(|parsed| parsed == variant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_rows_by_family() {
        assert!(same_family("PMSx003", SensorVariant::Pmsx003));
        assert!(same_family("PMS7003", SensorVariant::Pmsx003));
        assert!(!same_family("PMS3003", SensorVariant::Pmsx003));
        assert!(!same_family("SDS198", SensorVariant::Sds01x));
    }
}
