mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, SensorArgs};
use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "pmstream",
    version,
    about = "Read particulate-matter sensors over serial"
)]
struct Cli {
    #[command(flatten)]
    sensor: SensorArgs,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    match cmd::run(cli.command, cli.sensor) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pmstream_frame::SensorVariant;

    use super::*;

    #[test]
    fn global_options_apply_to_subcommands() {
        let cli = Cli::try_parse_from([
            "pmstream",
            "serial",
            "-s",
            "/dev/ttyAMA0",
            "-m",
            "SDS011",
            "-i",
            "0",
            "-n",
            "3",
            "--format",
            "csv",
        ])
        .expect("serial args should parse");

        assert_eq!(cli.sensor.serial, Path::new("/dev/ttyAMA0"));
        assert_eq!(cli.sensor.sensor_model, SensorVariant::Sds01x);
        assert_eq!(cli.sensor.interval, 0);
        assert_eq!(cli.sensor.samples, Some(3));
        let Command::Serial(args) = cli.command else {
            panic!("expected serial command");
        };
        assert_eq!(args.format.as_deref(), Some("csv"));
    }

    #[test]
    fn defaults_match_common_wiring() {
        let cli = Cli::try_parse_from(["pmstream", "raw"]).expect("raw should parse");
        assert_eq!(cli.sensor.sensor_model, SensorVariant::Pmsx003);
        assert!(cli.sensor.interval > 0);
        assert_eq!(cli.log_level, LogLevel::Warn);
    }

    #[test]
    fn rejects_unknown_sensor_model() {
        let err = Cli::try_parse_from(["pmstream", "-m", "SDS198", "serial"])
            .expect_err("unknown model should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn hexdump_conflicts_with_decode() {
        let err = Cli::try_parse_from(["pmstream", "raw", "--decode", "--hexdump"])
            .expect_err("conflicting args should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn csv_requires_a_path() {
        let err = Cli::try_parse_from(["pmstream", "csv", "--capture"])
            .expect_err("missing path should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
