use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use rover_stick_runtime::config::{MapperConfig, Profile, RuntimeConfig};
use rover_stick_runtime::encoder::WireFormat;
use rover_stick_runtime::link::SerialLink;

/// Joystick teleop for a servo/motor/LED vehicle over a serial link
#[derive(Debug, Parser)]
#[command(name = "rover-stick", version)]
struct Args {
    /// Serial device (e.g. /dev/rfcomm0, COM5)
    #[arg(long)]
    port: Option<String>,

    #[arg(long)]
    baud: Option<u32>,

    /// JSON config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Steering coefficients and direction tolerance
    #[arg(long, value_enum)]
    profile: Option<Profile>,

    /// Minimum gap between sends
    #[arg(long)]
    min_interval_ms: Option<u64>,

    #[arg(long, value_enum)]
    format: Option<WireFormat>,

    /// List serial devices and exit
    #[arg(long)]
    list: bool,
}

impl Args {
    fn into_config(self) -> Result<RuntimeConfig, Box<dyn std::error::Error + Send + Sync>> {
        let mut config = match &self.config {
            Some(path) => RuntimeConfig::load(path)?,
            None => RuntimeConfig::default(),
        };
        if let Some(port) = self.port {
            config.link.port = port;
        }
        if let Some(baud) = self.baud {
            config.link.baudrate = baud;
        }
        if let Some(profile) = self.profile {
            config.mapper = MapperConfig::for_profile(profile);
        }
        if let Some(ms) = self.min_interval_ms {
            config.gate.min_interval_ms = ms;
        }
        if let Some(format) = self.format {
            config.link.format = format;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    if args.list {
        match SerialLink::list() {
            Ok(devices) => {
                for d in devices {
                    println!("{}\t{}", d.id, d.kind);
                }
            }
            Err(e) => {
                eprintln!("Device listing failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rover_stick_runtime::runtime::run(config).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
