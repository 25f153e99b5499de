use clap::Parser;
use gdiags::config::{get_default_config_path, ConfigLoader};
use gdiags::console::{Console, ConsoleCommand, Flow};
use gdiags::logging::init_logging;
use gdiags::port::list_ports;
use gdiags::transport::{Transport, TransportEvent};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How long shutdown waits for the disconnect event to come back.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "gdiags",
    version,
    about = "Operator console for tuning a serial-connected motion controller.",
    long_about = "Sends P/I/D tuning values and raw commands to a motion controller over a serial port and shows everything the device prints. Type :help at the prompt for console commands."
)]
struct Args {
    /// Serial port (or configured alias) to connect to on startup.
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate for the startup connection.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Path to a gdiags.toml config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List available serial ports and exit.
    #[arg(long)]
    list_ports: bool,

    /// Print the port list as JSON.
    #[arg(long, requires = "list_ports")]
    json: bool,

    /// Log level or filter, e.g. "debug" or "gdiags=trace". RUST_LOG wins.
    #[arg(long)]
    log_level: Option<String>,

    /// Write a default config file (to --config or the per-user path) and exit.
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.init_config {
        let path = args
            .config
            .clone()
            .or_else(get_default_config_path)
            .ok_or("cannot determine a config directory; pass --config")?;
        ConfigLoader::with_defaults().save_to(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let loader = match args.config {
        Some(ref path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let config = loader.config().clone();
    init_logging(&config.logging, args.log_level.as_deref())?;
    debug!(path = ?loader.config_path, "configuration loaded");

    if args.list_ports {
        let ports = list_ports()?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&ports)?);
        } else if ports.is_empty() {
            println!("No serial ports found");
        } else {
            for port in ports {
                println!("{port}");
            }
        }
        return Ok(());
    }

    let transport = Transport::new(config.transport.to_options());
    let mut console = Console::new(transport, &config, std::io::stdout());
    let mut events = bridge_events(&console)?;

    println!(
        "gdiags {}: type :help for commands",
        env!("CARGO_PKG_VERSION")
    );

    let startup_port = args.port.or_else(|| config.serial.default_port.clone());
    if startup_port.is_some() {
        let connect = ConsoleCommand::Connect {
            port: startup_port,
            baud: args.baud,
        };
        if let Err(e) = tokio::task::block_in_place(|| console.execute(connect)) {
            console.report_error(&e)?;
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    // Sends may wait on a full queue and connects open a device.
                    let flow = tokio::task::block_in_place(|| console.handle_line(&line))?;
                    if flow == Flow::Quit {
                        break;
                    }
                }
                None => {
                    debug!("stdin closed");
                    break;
                }
            },
            Some(event) = events.recv() => console.handle_event(event),
            _ = &mut shutdown => break,
        }
    }

    if console.transport().is_connected() {
        tokio::task::block_in_place(|| console.transport_mut().disconnect());
        drain_until_disconnected(&mut console, &mut events).await;
    }
    info!("exiting");
    Ok(())
}

/// Forward transport events onto a tokio channel so they can be selected on.
fn bridge_events<W: std::io::Write>(
    console: &Console<W>,
) -> std::io::Result<mpsc::UnboundedReceiver<TransportEvent>> {
    let source = console.transport().events();
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("gdiags-events".into())
        .spawn(move || {
            for event in source.iter() {
                if tx.send(event).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

async fn drain_until_disconnected<W: std::io::Write>(
    console: &mut Console<W>,
    events: &mut mpsc::UnboundedReceiver<TransportEvent>,
) {
    let deadline = tokio::time::sleep(SHUTDOWN_GRACE);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(TransportEvent::Disconnected) => {
                    console.handle_event(TransportEvent::Disconnected);
                    break;
                }
                Some(event) => console.handle_event(event),
                None => break,
            },
            _ = &mut deadline => break,
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, disconnecting");
}
