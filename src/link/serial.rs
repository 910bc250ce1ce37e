// Serial channel: list, connect, disconnect, subscribe, write
//
// Bluetooth SPP devices show up as ordinary serial ports (rfcomm / COM),
// so the whole link is driven through serialport.

use serialport::{SerialPort, SerialPortType};
use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::writer::LinkWriter;
use super::{CommandSink, LinkError, LinkEvent, Result};
use crate::config::LinkConfig;
use crate::messages::WriteOutcome;

/// A port the operator can connect to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    pub kind: &'static str,
}

/// Live connection, dropped as a whole on disconnect
struct Connection {
    writer: LinkWriter,
    port: Box<dyn SerialPort>,
    reader_stop: Option<Arc<AtomicBool>>,
}

pub struct SerialLink {
    baudrate: u32,
    timeout: Duration,
    completions: mpsc::UnboundedSender<WriteOutcome>,
    events: mpsc::UnboundedSender<LinkEvent>,
    connection: Option<Connection>,
}

impl SerialLink {
    pub fn new(
        config: &LinkConfig,
        completions: mpsc::UnboundedSender<WriteOutcome>,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Self {
        Self {
            baudrate: config.baudrate,
            timeout: Duration::from_millis(config.write_timeout_ms),
            completions,
            events,
            connection: None,
        }
    }

    /// Enumerate serial ports, Bluetooth ones included
    pub fn list() -> Result<Vec<DeviceInfo>> {
        let ports = serialport::available_ports()?;
        Ok(ports
            .into_iter()
            .map(|p| DeviceInfo {
                kind: port_kind(&p.port_type),
                id: p.port_name,
            })
            .collect())
    }

    pub fn device(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.writer.device())
    }

    /// Open `device_id` and start its writer task (needs a tokio runtime)
    pub fn connect(&mut self, device_id: &str) -> Result<()> {
        let device_id = validate_device_id(device_id)?;

        if self.connection.is_some() {
            self.disconnect()?;
        }

        info!("Opening serial link on {} at {} baud", device_id, self.baudrate);
        let port = serialport::new(device_id, self.baudrate)
            .timeout(self.timeout)
            .open()?;
        let write_half = port.try_clone()?;
        let writer = LinkWriter::spawn(device_id, write_half, self.completions.clone());

        self.connection = Some(Connection {
            writer,
            port,
            reader_stop: None,
        });
        info!("Connected to {}", device_id);
        Ok(())
    }

    pub fn disconnect(&mut self) -> Result<()> {
        let connection = self.connection.take().ok_or(LinkError::NotConnected)?;
        if let Some(stop) = &connection.reader_stop {
            stop.store(true, Ordering::Relaxed);
        }
        info!("Disconnected from {}", connection.writer.device());
        // Dropping the writer closes its channel; a write already running
        // still reports its completion before the task exits.
        Ok(())
    }

    /// Deliver inbound data split on `delimiter` as LinkEvent::Data
    pub fn subscribe(&mut self, delimiter: u8) -> Result<()> {
        let connection = self.connection.as_mut().ok_or(LinkError::NotConnected)?;
        if let Some(previous) = connection.reader_stop.take() {
            previous.store(true, Ordering::Relaxed);
        }

        let mut port = connection.port.try_clone()?;
        let stop = Arc::new(AtomicBool::new(false));
        connection.reader_stop = Some(stop.clone());

        let events = self.events.clone();
        let device = connection.writer.device().to_string();

        thread::Builder::new()
            .name(format!("link-reader {}", device))
            .spawn(move || {
                let mut splitter = LineSplitter::new(delimiter);
                let mut buf = [0u8; 256];

                while !stop.load(Ordering::Relaxed) {
                    match port.read(&mut buf) {
                        Ok(0) => continue,
                        Ok(n) => {
                            for line in splitter.push(&buf[..n]) {
                                if events.send(LinkEvent::Data(line)).is_err() {
                                    return;
                                }
                            }
                        }
                        Err(e) if e.kind() == ErrorKind::TimedOut => continue,
                        Err(e) => {
                            warn!("Read from {} failed: {}", device, e);
                            let _ = events.send(LinkEvent::Error(e.to_string()));
                            return;
                        }
                    }
                }
                debug!("Reader for {} stopped", device);
            })?;

        Ok(())
    }
}

impl CommandSink for SerialLink {
    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn submit(&mut self, line: String) -> Result<()> {
        let connection = self.connection.as_ref().ok_or(LinkError::NotConnected)?;
        connection.writer.send(line)
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        if self.connection.is_some() {
            let _ = self.disconnect();
        }
    }
}

fn validate_device_id(device_id: &str) -> Result<&str> {
    let trimmed = device_id.trim();
    if trimmed.is_empty() || trimmed.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(LinkError::InvalidDeviceId(device_id.to_string()));
    }
    Ok(trimmed)
}

fn port_kind(port_type: &SerialPortType) -> &'static str {
    match port_type {
        SerialPortType::BluetoothPort => "bluetooth",
        SerialPortType::UsbPort(_) => "usb",
        SerialPortType::PciPort => "pci",
        SerialPortType::Unknown => "unknown",
    }
}

/// Accumulates bytes and yields complete delimiter-terminated lines
#[derive(Debug)]
pub struct LineSplitter {
    delimiter: u8,
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            pending: Vec::new(),
        }
    }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &b in bytes {
            if b == self.delimiter {
                let raw = std::mem::take(&mut self.pending);
                let line = String::from_utf8_lossy(&raw).trim_end_matches('\r').to_string();
                lines.push(line);
            } else {
                self.pending.push(b);
            }
        }
        lines
    }
}
