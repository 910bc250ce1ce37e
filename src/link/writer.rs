// Writer task: owns the write half of the port
//
// Lines arrive over a channel and are written one at a time on a blocking
// thread. Each write reports exactly one WriteOutcome back to the event loop.

use std::io::Write;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{LinkError, Result};
use crate::messages::WriteOutcome;

pub struct LinkWriter {
    device: String,
    tx: mpsc::UnboundedSender<String>,
}

impl LinkWriter {
    /// Start the writer on a blocking thread; must run inside a tokio runtime
    pub fn spawn<W>(device: &str, mut port: W, done: mpsc::UnboundedSender<WriteOutcome>) -> Self
    where
        W: Write + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let name = device.to_string();

        tokio::task::spawn_blocking(move || {
            while let Some(line) = rx.blocking_recv() {
                let outcome = match write_line(&mut port, &line) {
                    Ok(()) => {
                        debug!("Wrote {:?} to {}", line, name);
                        WriteOutcome::Sent
                    }
                    Err(e) => {
                        warn!("Write to {} failed: {}", name, e);
                        WriteOutcome::Failed(e.to_string())
                    }
                };
                if done.send(outcome).is_err() {
                    break;
                }
            }
            debug!("Writer for {} stopped", name);
        });

        Self {
            device: device.to_string(),
            tx,
        }
    }

    pub fn send(&self, line: String) -> Result<()> {
        self.tx.send(line).map_err(|_| LinkError::WriterClosed {
            device: self.device.clone(),
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

fn write_line<W: Write>(port: &mut W, line: &str) -> std::io::Result<()> {
    port.write_all(line.as_bytes())?;
    port.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPort;

    impl Write for BrokenPort {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_writes_and_reports_success() {
        let buffer = SharedBuffer::default();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let writer = LinkWriter::spawn("test", buffer.clone(), done_tx);

        writer.send("90,0,0\n".to_string()).unwrap();
        assert_eq!(done_rx.recv().await, Some(WriteOutcome::Sent));
        writer.send("45,1,0\n".to_string()).unwrap();
        assert_eq!(done_rx.recv().await, Some(WriteOutcome::Sent));

        assert_eq!(&*buffer.0.lock().unwrap(), b"90,0,0\n45,1,0\n");
    }

    #[tokio::test]
    async fn test_reports_failure() {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let writer = LinkWriter::spawn("test", BrokenPort, done_tx);

        writer.send("90,0,0\n".to_string()).unwrap();
        match done_rx.recv().await {
            Some(WriteOutcome::Failed(reason)) => assert!(reason.contains("timed out")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_after_stop_is_error() {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let writer = LinkWriter::spawn("test", SharedBuffer::default(), done_tx);
        drop(done_rx);

        // First write ends the task once its completion cannot be delivered
        writer.send("90,0,0\n".to_string()).unwrap();
        let mut closed = false;
        for _ in 0..100 {
            if writer.send("90,0,0\n".to_string()).is_err() {
                closed = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(closed);
    }
}
