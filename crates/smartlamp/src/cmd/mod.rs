use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use smartlamp::DeviceHost;
use smartlamp_attr::{AttributeSurface, RegistryConfig, SensorFormat};
use smartlamp_session::EngineConfig;
use smartlamp_transport::{open_device, DeviceSpec};

use crate::exit::{host_error, transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod list;
pub mod probe;
pub mod read;
#[cfg(unix)]
pub mod simulate;
pub mod version;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read one attribute.
    Read(ReadArgs),
    /// Write one attribute.
    Write(WriteArgs),
    /// List the device attributes.
    List(ListArgs),
    /// Attach to the device and print link details.
    Probe(ProbeArgs),
    /// Run a simulated lamp on a Unix socket.
    Simulate(SimulateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, ctx: &Context, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Read(args) => read::run(args, ctx, format),
        Command::Write(args) => write::run(args, ctx, format),
        Command::List(args) => list::run(args, ctx, format),
        Command::Probe(args) => probe::run(args, ctx, format),
        #[cfg(unix)]
        Command::Simulate(args) => simulate::run(args),
        #[cfg(not(unix))]
        Command::Simulate(_) => Err(CliError::new(
            USAGE,
            "simulate needs Unix domain sockets",
        )),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Attribute name (led, ldr, temp, hum).
    pub attribute: String,
    /// Fail on device errors instead of printing the sentinel value.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Attribute name.
    pub attribute: String,
    /// Value to write.
    #[arg(allow_hyphen_values = true)]
    pub value: String,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {}

#[derive(Args, Debug, Default)]
pub struct ProbeArgs {}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Report temperature and humidity with two decimals.
    #[arg(long)]
    pub fractional: bool,
    /// Initial LED level.
    #[arg(long, default_value = "0", value_parser = clap::value_parser!(i32).range(0..=100))]
    pub led: i32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum SensorFormatArg {
    Integer,
    Raw,
}

impl From<SensorFormatArg> for SensorFormat {
    fn from(arg: SensorFormatArg) -> Self {
        match arg {
            SensorFormatArg::Integer => SensorFormat::Integer,
            SensorFormatArg::Raw => SensorFormat::RawText,
        }
    }
}

/// Transaction timing flags shared by every device command.
#[derive(Args, Debug, Default)]
pub struct TimingArgs {
    /// Pause between a command and its reply (e.g. 100ms, 0).
    #[arg(long, value_name = "DURATION", global = true)]
    pub settle: Option<String>,
    /// Timeout of each receive attempt (e.g. 1s, 500ms).
    #[arg(long, value_name = "DURATION", global = true)]
    pub receive_timeout: Option<String>,
    /// Receive attempts before giving up.
    #[arg(long, value_name = "N", global = true, value_parser = clap::value_parser!(u32).range(1..))]
    pub attempts: Option<u32>,
    /// Pause after a failed receive attempt (e.g. 50ms, 0).
    #[arg(long, value_name = "DURATION", global = true)]
    pub backoff: Option<String>,
    /// Skip the light-sensor read on attach.
    #[arg(long, global = true)]
    pub no_prime: bool,
}

impl TimingArgs {
    pub fn engine_config(&self) -> CliResult<EngineConfig> {
        let mut config = EngineConfig::default();
        if let Some(settle) = &self.settle {
            config.settle_delay = parse_delay(settle)?;
        }
        if let Some(timeout) = &self.receive_timeout {
            config.receive_timeout = parse_duration(timeout)?;
        }
        if let Some(attempts) = self.attempts {
            config.receive_attempts = attempts;
        }
        if let Some(backoff) = &self.backoff {
            config.retry_backoff = parse_delay(backoff)?;
        }
        if self.no_prime {
            config.prime_on_attach = false;
        }
        Ok(config)
    }
}

/// Resolved global options.
#[derive(Debug)]
pub struct Context {
    pub device: Option<DeviceSpec>,
    pub engine: EngineConfig,
    pub registry: RegistryConfig,
}

impl Context {
    pub fn device(&self) -> CliResult<&DeviceSpec> {
        self.device.as_ref().ok_or_else(|| {
            CliError::new(
                USAGE,
                "no device given: pass --device or set SMARTLAMP_DEVICE",
            )
        })
    }

    /// Open the device and attach it to a fresh host.
    pub fn attach(&self) -> CliResult<(DeviceHost, Arc<AttributeSurface>)> {
        let spec = self.device()?;
        let transport = open_device(spec)
            .map_err(|err| transport_error(&format!("cannot open {spec}"), err))?;
        let host = DeviceHost::new(self.engine.clone(), self.registry);
        let surface = host
            .on_attach(transport)
            .map_err(|err| host_error("attach failed", err))?;
        Ok((host, surface))
    }
}

/// Parse `<n>ms`, `<n>s` or `<n>` (seconds). Zero is rejected.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let duration = parse_delay(input)?;
    if duration.is_zero() {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }
    Ok(duration)
}

/// Like [`parse_duration`], but zero is allowed.
pub fn parse_delay(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}
