use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use pmstream_frame::{ReaderConfig, SensorVariant, StopSignal, StreamReader};
use pmstream_source::SerialPort;
use tracing::{info, info_span};

use crate::exit::{source_error, CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod csv;
pub mod raw;
pub mod serial;
pub mod variants;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read the sensor and print observations.
    Serial(SerialArgs),
    /// Append observations (or raw frames) to a CSV file.
    Csv(CsvArgs),
    /// Print raw frames, or decode a capture file.
    Raw(RawArgs),
    /// List supported sensor families.
    Variants(VariantsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, sensor: SensorArgs) -> CliResult<i32> {
    match command {
        Command::Serial(args) => serial::run(args, &sensor),
        Command::Csv(args) => csv::run(args, &sensor),
        Command::Raw(args) => raw::run(args, &sensor),
        Command::Variants(args) => variants::run(args),
        Command::Version(args) => version::run(args),
    }
}

/// Where and how to read the sensor.
#[derive(Args, Debug, Clone)]
pub struct SensorArgs {
    /// Serial port (or frame dump file).
    #[arg(
        long,
        short = 's',
        env = "PMS_SERIAL",
        default_value = "/dev/ttyUSB0",
        global = true
    )]
    pub serial: PathBuf,

    /// Sensor family.
    #[arg(
        long,
        short = 'm',
        env = "PMS_SENSOR_MODEL",
        default_value = "PMSx003",
        global = true
    )]
    pub sensor_model: SensorVariant,

    /// Seconds between observations; 0 reads as fast as the sensor sends.
    #[arg(
        long,
        short = 'i',
        env = "PMS_INTERVAL",
        default_value_t = 60,
        global = true
    )]
    pub interval: u64,

    /// Stop after this many observations.
    #[arg(long, short = 'n', env = "PMS_SAMPLES", global = true)]
    pub samples: Option<usize>,
}

impl SensorArgs {
    /// Open the port and wrap it in a reader stopped by Ctrl-C.
    pub fn open_reader(&self) -> CliResult<StreamReader<SerialPort>> {
        let port = SerialPort::open(&self.serial).map_err(|err| source_error("open failed", err))?;
        info!(
            sensor = %self.sensor_model,
            port = %port.path().display(),
            tty = port.is_tty(),
            "sensor port open"
        );

        let config = ReaderConfig {
            interval: (self.interval > 0).then(|| Duration::from_secs(self.interval)),
            discard_stale: port.is_tty(),
            span: info_span!(
                "sensor",
                model = %self.sensor_model,
                port = %port.path().display()
            ),
            ..ReaderConfig::default()
        };
        let reader = StreamReader::with_config(port, self.sensor_model, config);
        install_ctrlc_handler(reader.stop_signal())?;
        Ok(reader)
    }

    /// At most `--samples` items of `items`.
    pub fn limit<I: Iterator>(&self, items: I) -> std::iter::Take<I> {
        items.take(self.samples.unwrap_or(usize::MAX))
    }
}

fn install_ctrlc_handler(stop: StopSignal) -> CliResult<()> {
    ctrlc::set_handler(move || stop.stop()).map_err(|err| {
        CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
    })
}

#[derive(Args, Debug)]
pub struct SerialArgs {
    /// Output format: a format code (pm, raw, num, cf, hcho, csv, with
    /// optional width/precision such as 04pm or .2cf) or json.
    #[arg(long, short = 'f', value_name = "CODE")]
    pub format: Option<String>,
}

#[derive(Args, Debug)]
pub struct CsvArgs {
    /// Write raw frames (time,sensor,hex) instead of observations.
    #[arg(long)]
    pub capture: bool,
    /// Truncate the file instead of appending.
    #[arg(long)]
    pub overwrite: bool,
    /// Target file, or a directory for a dated file name.
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct RawArgs {
    /// Decode frames from a capture file instead of reading the sensor.
    #[arg(long)]
    pub decode: bool,
    /// Print frames as a hexdump.
    #[arg(long, conflicts_with = "decode")]
    pub hexdump: bool,
    /// Capture file to decode (defaults to --serial).
    #[arg(long, value_name = "PATH", hide = true)]
    pub test_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VariantsArgs {
    /// Output format.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
