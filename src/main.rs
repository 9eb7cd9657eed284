use clap::Parser;
use serial_roundtrip::error::{check, AppError, Stage};
use serial_roundtrip::{logging, run_exchange, ConfigLoader, SerialDeviceService, SystemSerialService};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Send a payload over a serial port and read the echo back.",
    long_about = "Opens a serial device, configures the line (9600 8N1 by default), writes a fixed payload and reads back up to the configured number of bytes within the timeout. A timeout is not an error: the short counts are reported."
)]
struct Args {
    /// Configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device to use, e.g. /dev/ttyUSB0 or COM3.
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Write and read timeout in milliseconds; 0 waits indefinitely.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// List available serial ports and exit.
    #[arg(long)]
    list: bool,

    /// Print the exchange report as JSON.
    #[arg(long)]
    json: bool,

    /// Log debug output to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let mut loader = ConfigLoader::load(args.config.as_deref())?;

    let config = loader.config_mut();
    if let Some(port) = args.port {
        config.serial.port = port;
    }
    if let Some(baud) = args.baud {
        config.serial.baud_rate = baud;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.serial.timeout_ms = timeout_ms;
    }
    config.validate()?;

    logging::init_logging(&config.logging, args.verbose);
    if let Some(path) = &loader.config_path {
        tracing::debug!(path = %path.display(), "loaded configuration");
    }

    let service = SystemSerialService::new();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if args.list {
        return list_ports(&service, &mut out);
    }

    let settings = loader.config().exchange_settings();
    if args.json {
        // Progress lines would corrupt the JSON document
        let report = run_exchange(&service, &settings, &mut std::io::sink())?;
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        run_exchange(&service, &settings, &mut out)?;
    }

    Ok(())
}

fn list_ports<W: Write>(service: &SystemSerialService, out: &mut W) -> Result<(), AppError> {
    let ports = service.list().map_err(check(Stage::List))?;

    if ports.is_empty() {
        writeln!(out, "No serial ports found.")?;
    }
    for port in ports {
        writeln!(out, "{port}")?;
    }
    Ok(())
}
