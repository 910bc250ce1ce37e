// Serial link to the vehicle
//
// Provides:
// - Device listing and connect/disconnect over serialport
// - A writer task that performs one blocking write at a time and reports completion
// - Line-delimited subscription to data coming back from the vehicle

mod serial;
pub mod writer;

pub use serial::{DeviceInfo, LineSplitter, SerialLink};
pub use writer::LinkWriter;

/// Error types for the serial link
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No device connected")]
    NotConnected,

    #[error("Invalid device identifier {0:?}")]
    InvalidDeviceId(String),

    #[error("Writer task for {device} has stopped")]
    WriterClosed { device: String },
}

pub type Result<T> = std::result::Result<T, LinkError>;

/// Something arriving from the link outside of write completions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Data(String),
    Error(String),
}

/// The only capability the control pipeline needs from the link
///
/// `submit` hands a line over and returns immediately. Its completion is
/// delivered later as a `WriteOutcome`.
pub trait CommandSink {
    fn is_connected(&self) -> bool;
    fn submit(&mut self, line: String) -> Result<()>;
}
