use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bgapi_driver::{Driver, DriverConfig};
use bgapi_event::Observer;
use bgapi_frame::CommandFraming;
use bgapi_transport::{open_serial, BgStream, SerialConfig, DEFAULT_BAUD_RATE};
use clap::{ArgGroup, Args, Subcommand};

use crate::exit::{driver_error, transport_error, CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod hello;
pub mod info;
pub mod monitor;
pub mod ports;
pub mod scan;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports present on this host.
    Ports(PortsArgs),
    /// Round-trip `system_hello` to check the module responds.
    Hello(HelloArgs),
    /// Print firmware version, address and connection capacity.
    Info(InfoArgs),
    /// Discover advertising devices.
    Scan(ScanArgs),
    /// Print every event the module emits.
    Monitor(MonitorArgs),
    /// Decode captured BGAPI traffic offline.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ports(args) => ports::run(args, format),
        Command::Hello(args) => hello::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Scan(args) => scan::run(args, format),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// How to reach the module.
#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// Serial device (e.g. /dev/ttyACM0, COM3).
    #[arg(long, env = "BGAPI_PORT", conflicts_with = "socket")]
    pub port: Option<PathBuf>,
    /// Unix stream socket bridged to a module (e.g. by socat).
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,
    /// Serial line speed.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Per-command response timeout (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub timeout: String,
    /// Prefix commands with the 4-byte header instead of sending them bare.
    #[arg(long)]
    pub headered: bool,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct HelloArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Number of round trips.
    #[arg(long, short = 'n', default_value = "1")]
    pub count: u32,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// How long to scan (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub duration: String,
    /// Request scan responses from advertisers.
    #[arg(long)]
    pub active: bool,
    /// Discovery mode: 0 limited, 1 generic, 2 observation.
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u8).range(0..=2))]
    pub mode: u8,
    /// Scan interval in 625 us units.
    #[arg(long, default_value = "75")]
    pub interval: u16,
    /// Scan window in 625 us units.
    #[arg(long, default_value = "50")]
    pub window: u16,
    /// Report each advertiser once.
    #[arg(long)]
    pub unique: bool,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Exit after N events.
    #[arg(long)]
    pub count: Option<usize>,
    /// Exit after this long (e.g. 30s).
    #[arg(long)]
    pub duration: Option<String>,
    /// Reset the module first so its boot event is captured.
    #[arg(long)]
    pub reset: bool,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["hex", "file"])))]
pub struct DecodeArgs {
    /// Captured bytes as hex (whitespace, ':' and '0x' are ignored).
    pub hex: Option<String>,
    /// Read raw captured bytes from a file.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open the transport named by `args` and start a driver on it.
pub fn open_device<O: Observer>(args: &DeviceArgs, observer: O) -> CliResult<Driver> {
    let timeout = parse_duration(&args.timeout)?;
    let framing = if args.headered {
        CommandFraming::Headered
    } else {
        CommandFraming::Bare
    };
    let config = DriverConfig::default()
        .with_timeout(timeout)
        .with_framing(framing);

    let stream = open_stream(args)?;
    Driver::connect(stream, observer, config).map_err(|err| driver_error("driver start failed", err))
}

fn open_stream(args: &DeviceArgs) -> CliResult<BgStream> {
    if let Some(path) = &args.socket {
        return connect_socket(path);
    }
    let Some(path) = &args.port else {
        return Err(CliError::new(
            USAGE,
            "no device given: pass --port, --socket or set BGAPI_PORT",
        ));
    };
    let serial = SerialConfig {
        baud_rate: args.baud,
        ..SerialConfig::default()
    };
    open_serial(path, &serial).map_err(|err| transport_error("open failed", err))
}

#[cfg(unix)]
fn connect_socket(path: &Path) -> CliResult<BgStream> {
    BgStream::connect_unix(path).map_err(|err| transport_error("connect failed", err))
}

#[cfg(not(unix))]
fn connect_socket(_path: &Path) -> CliResult<BgStream> {
    Err(CliError::new(USAGE, "--socket is only available on unix"))
}

/// Clear `running` on Ctrl-C.
pub fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(match unit {
        "ms" => Duration::from_millis(value),
        _ => Duration::from_secs(value),
    })
}
