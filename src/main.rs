//! TankGauge — interactive tank level monitor.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  stdin reader thread ──▶ AppCommand ──┐                      │
//! │                                       ▼                      │
//! │  SerialportTransport ──▶ ConnectionController ──▶ LogEventSink│
//! │                           │ (acquisition worker)             │
//! │                           ▼                                  │
//! │                 poll() ──▶ render_spec ──▶ TextGaugeRenderer │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The main thread is the control flow: it applies operator commands and
//! refreshes the gauge every `refresh_interval_ms`.  The serial link is
//! only ever touched by the acquisition worker.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info, warn};

use tankgauge::ConnectionController;
use tankgauge::adapters::json_config::JsonConfigFile;
use tankgauge::adapters::log_sink::LogEventSink;
use tankgauge::adapters::serial::{SerialportEnumerator, SerialportTransport};
use tankgauge::adapters::text_gauge::TextGaugeRenderer;
use tankgauge::app::commands::AppCommand;
use tankgauge::app::ports::{ConfigPort, GaugeRenderer, PortEnumerator};
use tankgauge::config::MonitorConfig;
use tankgauge::error::ConfigError;
use tankgauge::gauge::render_spec;
use tankgauge::sensors::LevelPercentage;

#[derive(Parser, Debug)]
#[command(name = "tankgauge", version, about = "Serial tank level monitor")]
struct Cli {
    /// JSON config file; defaults are used when it does not exist
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Serial port to connect to at startup
    #[arg(short, long, value_name = "NAME")]
    port: Option<String>,

    /// Tank height in centimetres
    #[arg(long, value_name = "CM")]
    height: Option<String>,

    /// Print available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// More log output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Less log output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    quiet: u8,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        match i16::from(self.verbose) - i16::from(self.quiet) {
            i16::MIN..=-2 => LevelFilter::Error,
            -1 => LevelFilter::Warn,
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(cli.log_level())
        .format_timestamp_millis()
        .init();

    if cli.list_ports {
        print_ports();
        return Ok(());
    }

    let config = load_config(cli.config.as_ref())?;
    info!("TankGauge v{}", env!("CARGO_PKG_VERSION"));

    let refresh = config.refresh_interval();
    let mut sink = LogEventSink::new();
    let mut renderer = TextGaugeRenderer::new(io::stdout());
    let mut controller = ConnectionController::new(SerialportTransport, config);

    if let Some(height) = cli.height.as_deref() {
        // The error is already reported through the sink.
        let _ = controller.set_tank_height(height, &mut sink);
    }
    if let Some(port) = cli.port.as_deref() {
        if let Err(e) = controller.connect(port, &mut sink) {
            println!("connect failed: {}", e);
        }
    }

    // The dial sits at empty until the first reading arrives.
    renderer.render(&render_spec(LevelPercentage::EMPTY));
    println!("{}", LevelPercentage::placeholder_label());
    println!("commands: connect <port> | stop | height <cm> | ports | status | quit");

    let commands = spawn_stdin_reader();
    loop {
        match commands.recv_timeout(refresh) {
            Ok(line) => match AppCommand::parse(&line) {
                Some(AppCommand::Quit) => break,
                Some(command) => handle_command(command, &mut controller, &mut sink),
                None if line.trim().is_empty() => {}
                None => println!("unrecognised command: {}", line.trim()),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                info!("stdin closed");
                break;
            }
        }

        if let Some(level) = controller.poll(&mut sink) {
            renderer.render(&render_spec(level));
        }
    }

    controller.stop(&mut sink);
    info!("bye");
    Ok(())
}

fn handle_command(
    command: AppCommand,
    controller: &mut ConnectionController<SerialportTransport>,
    sink: &mut LogEventSink,
) {
    match command {
        AppCommand::Connect(port) => {
            if let Err(e) = controller.connect(&port, sink) {
                println!("connect failed: {}", e);
            }
        }
        AppCommand::Stop => controller.stop(sink),
        AppCommand::SetTankHeight(input) => match controller.set_tank_height(&input, sink) {
            Ok(tank) => println!("tank height set to {:.1} cm", tank.height_cm),
            Err(e) => println!("{}, level computation disabled", e),
        },
        AppCommand::ListPorts => print_ports(),
        AppCommand::Status => print_status(controller),
        AppCommand::Quit => {}
    }
}

fn print_ports() {
    match SerialportEnumerator.list_ports() {
        Ok(ports) if ports.is_empty() => println!("no serial ports found"),
        Ok(ports) => {
            for port in ports {
                println!("  {}", port);
            }
        }
        Err(e) => println!("port enumeration failed: {}", e),
    }
}

fn print_status(controller: &ConnectionController<SerialportTransport>) {
    let state = controller.state();
    let level = controller
        .level()
        .map_or_else(|| LevelPercentage::placeholder_label().to_owned(), LevelPercentage::label);
    println!("{} ({})", state.status_text(), controller.connected_port().unwrap_or("-"));
    println!("{}", level);
    println!("tank height: {:.1} cm", controller.tank_height().height_cm);
    match serde_json::to_string(&controller.diagnostics()) {
        Ok(json) => println!("{}", json),
        Err(e) => warn!("diagnostics serialisation failed: {}", e),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<MonitorConfig> {
    let Some(path) = path else {
        return Ok(MonitorConfig::default());
    };
    let store = JsonConfigFile::new(path);
    match store.load() {
        Ok(config) => Ok(config),
        Err(ConfigError::NotFound) => {
            warn!("{} not found, using defaults", path.display());
            Ok(MonitorConfig::default())
        }
        Err(e) => Err(e).with_context(|| format!("loading {}", path.display())),
    }
}

/// Forward stdin lines to the control flow.  The channel closes on EOF.
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
