use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use pmstream_frame::CaptureWriter;
use pmstream_obs::{pump, CaptureSink, FormatKind, FormatSink, FormatSpec, ObservationReader};
use tracing::debug;

use crate::cmd::{CsvArgs, SensorArgs};
use crate::exit::{io_error, pump_error, CliResult, SUCCESS};

pub fn run(args: CsvArgs, sensor: &SensorArgs) -> CliResult<i32> {
    let path = resolve_path(&args.path);
    let (file, is_new) = open_target(&path, args.overwrite)
        .map_err(|err| io_error(&format!("cannot open {}", path.display()), err))?;

    let reader = sensor.open_reader()?;
    if args.capture {
        debug!(path = %path.display(), sensor = %sensor.sensor_model, "capturing frames");
        let writer = if is_new {
            CaptureWriter::new(file)
        } else {
            CaptureWriter::appending(file)
        };
        let mut sink = CaptureSink::new(writer);
        pump(sensor.limit(reader), &mut sink).map_err(pump_error)?;
    } else {
        debug!(path = %path.display(), sensor = %sensor.sensor_model, "writing observations");
        let mut sink =
            FormatSink::new(file, FormatSpec::new(FormatKind::Csv)).with_header(is_new);
        let observations = sensor.limit(ObservationReader::new(reader));
        pump(observations, &mut sink).map_err(pump_error)?;
    }

    Ok(SUCCESS)
}

/// A directory becomes `<dir>/<YYYY-MM-DD>_pmstream.csv`.
fn resolve_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        let today = jiff::Zoned::now().strftime("%F").to_string();
        path.join(format!("{today}_pmstream.csv"))
    } else {
        path.to_path_buf()
    }
}

/// Open for append (or truncate). The flag is true when the file is empty.
fn open_target(path: &Path, overwrite: bool) -> std::io::Result<(File, bool)> {
    let file = if overwrite {
        File::create(path)?
    } else {
        OpenOptions::new().create(true).append(true).open(path)?
    };
    let is_new = file.metadata()?.len() == 0;
    Ok((file, is_new))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn unique_temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pmstream-csv-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn directory_gets_dated_file_name() {
        let dir = unique_temp_dir("dated");
        let path = resolve_path(&dir);
        assert_eq!(path.parent(), Some(dir.as_path()));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("_pmstream.csv"), "{name}");
        assert_eq!(name.len(), "2024-01-01_pmstream.csv".len());
    }

    #[test]
    fn files_are_kept_as_given() {
        let path = PathBuf::from("/tmp/does-not-exist/readings.csv");
        assert_eq!(resolve_path(&path), path);
    }

    #[test]
    fn append_keeps_existing_rows() {
        let dir = unique_temp_dir("append");
        let path = dir.join("out.csv");

        let (mut file, is_new) = open_target(&path, false).unwrap();
        assert!(is_new);
        writeln!(file, "row").unwrap();
        drop(file);

        let (_, is_new) = open_target(&path, false).unwrap();
        assert!(!is_new);

        let (_, is_new) = open_target(&path, true).unwrap();
        assert!(is_new);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }
}
