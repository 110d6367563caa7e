mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use smartlamp_attr::RegistryConfig;
use smartlamp_transport::DeviceSpec;

use crate::cmd::{Command, Context, SensorFormatArg, TimingArgs};
use crate::exit::CliResult;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "smartlamp", version, about = "SmartLamp device CLI")]
struct Cli {
    /// Device link: serial:<tty>[@<baud>] or unix:<socket>.
    #[arg(long, value_name = "SPEC", env = "SMARTLAMP_DEVICE", global = true)]
    device: Option<DeviceSpec>,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        env = "SMARTLAMP_LOG_FORMAT",
        default_value = "text",
        global = true
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "SMARTLAMP_LOG_LEVEL",
        default_value = "info",
        global = true
    )]
    log_level: LogLevel,

    /// Decoding of temperature and humidity replies.
    #[arg(long, value_name = "FORMAT", global = true)]
    sensor_format: Option<SensorFormatArg>,

    #[command(flatten)]
    timing: TimingArgs,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn context(&self) -> CliResult<Context> {
        let mut registry = RegistryConfig::default();
        if let Some(format) = self.sensor_format {
            registry.sensor_format = format.into();
        }
        Ok(Context {
            device: self.device.clone(),
            engine: self.timing.engine_config()?,
            registry,
        })
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cli
        .context()
        .and_then(|ctx| cmd::run(cli.command, &ctx, format));

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
