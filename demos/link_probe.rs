// Link probe: list serial devices, then send one neutral command
//
// The neutral line keeps the vehicle still (steering 90, motor stopped, LED off).
//
// Usage: cargo run --example link_probe -- [port]
// Example: cargo run --example link_probe -- /dev/rfcomm0

use rover_stick_runtime::config::{LinkConfig, DEFAULT_PORT};
use rover_stick_runtime::encoder::encode;
use rover_stick_runtime::link::{CommandSink, SerialLink};
use rover_stick_runtime::messages::{ControlState, WriteOutcome};
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("debug".parse().unwrap()),
        )
        .init();

    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PORT.to_string());

    println!("Step 1: Available serial devices");
    let devices = SerialLink::list()?;
    if devices.is_empty() {
        println!("  (none)");
    }
    for d in &devices {
        println!("  {} ({})", d.id, d.kind);
    }
    println!();

    println!("Step 2: Connecting to {}...", port);
    let config = LinkConfig {
        port: port.clone(),
        ..LinkConfig::default()
    };
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let (event_tx, _event_rx) = mpsc::unbounded_channel();
    let mut link = SerialLink::new(&config, done_tx, event_tx);
    if let Err(e) = link.connect(&port) {
        println!("  ✗ {}", e);
        println!();
        println!("Troubleshooting:");
        println!("  - Pair the module and bind it (e.g. rfcomm bind 0 <addr>)");
        println!("  - Check the baud rate matches the firmware ({})", config.baudrate);
        return Err(e.into());
    }
    println!("  ✓ Connected");
    println!();

    let line = encode(&ControlState::default(), config.format);
    println!("Step 3: Sending neutral command {:?}", line);
    link.submit(line)?;

    match tokio::time::timeout(Duration::from_secs(2), done_rx.recv()).await {
        Ok(Some(WriteOutcome::Sent)) => println!("  ✓ Written"),
        Ok(Some(WriteOutcome::Failed(reason))) => println!("  ✗ Write failed: {}", reason),
        Ok(None) => println!("  ✗ Writer stopped"),
        Err(_) => println!("  ✗ No completion within 2s"),
    }

    link.disconnect()?;
    Ok(())
}
