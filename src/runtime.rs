// Event loop: terminal pad input, write completions, inbound link data
//
// Everything runs on one logical thread. The serial write is the only thing
// that happens elsewhere (writer task) and its completion comes back as an
// event processed here like any other.

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::io::stdout;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::config::{INBOUND_DELIMITER, POLL_INTERVAL, PadConfig, RuntimeConfig};
use crate::controller::Controller;
use crate::feedback::{completion_tone, Feedback, Severity, TracingFeedback, TEST_TONE};
use crate::gate::GateDecision;
use crate::link::{CommandSink, LinkError, LinkEvent, SerialLink};
use crate::messages::{PointerEvent, Trigger, WriteOutcome};
use crate::pad;

/// A controller bound to its link and feedback for one operator session
pub struct Session<S, F> {
    controller: Controller,
    sink: S,
    feedback: F,
    offline_notified: bool,
}

impl<S: CommandSink, F: Feedback> Session<S, F> {
    pub fn new(config: &RuntimeConfig, sink: S, feedback: F) -> Self {
        Self {
            controller: Controller::new(config),
            sink,
            feedback,
            offline_notified: false,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    pub fn on_pointer(&mut self, event: PointerEvent, now: Instant) {
        if let Some(trigger) = self.controller.on_pointer(event) {
            let state = self.controller.state();
            trace!("Servo: {}, Motor: {}", state.steering, state.direction.as_i8());
            self.transmit(trigger, now);
        }
    }

    pub fn toggle_led(&mut self, now: Instant) {
        let trigger = self.controller.toggle_led();
        self.transmit(trigger, now);
    }

    /// Explicit send of whatever is currently commanded
    pub fn send_current(&mut self, now: Instant) {
        self.transmit(Trigger::Manual, now);
    }

    pub fn test_sound(&mut self) {
        self.feedback.play(TEST_TONE);
    }

    pub fn on_write_complete(&mut self, outcome: WriteOutcome) {
        let Some(pending) = self.controller.complete(&outcome) else {
            return;
        };
        let line = self.controller.gate().last_sent().unwrap_or_default().trim_end().to_string();
        match &outcome {
            WriteOutcome::Sent => debug!("Data sent successfully: {}", line),
            WriteOutcome::Failed(reason) => {
                warn!("Error sending {}: {}", line, reason);
                self.feedback
                    .notify(Severity::Error, &format!("Failed to send {}: {}", line, reason));
            }
        }
        self.feedback
            .play(completion_tone(pending.trigger, &outcome, &pending.state));
    }

    pub fn on_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Data(line) => info!("Vehicle: {}", line),
            LinkEvent::Error(reason) => self
                .feedback
                .notify(Severity::Error, &format!("Link read error: {}", reason)),
        }
    }

    fn transmit(&mut self, trigger: Trigger, now: Instant) {
        match self.controller.transmit(trigger, &mut self.sink, now) {
            Ok(GateDecision::Send(line)) => {
                self.offline_notified = false;
                debug!("Sending {:?} ({:?})", line.trim_end(), trigger);
            }
            Ok(decision) => trace!("Not sent: {:?}", decision),
            Err(LinkError::NotConnected) => {
                // Drags fire far too often to repeat the notice every time
                if trigger != Trigger::Drag || !self.offline_notified {
                    self.feedback
                        .notify(Severity::Warning, "No device connected, command not sent");
                    self.offline_notified = true;
                }
            }
            Err(e) => {
                self.feedback
                    .notify(Severity::Error, &format!("Send failed: {}", e));
            }
        }
    }
}

impl<F: Feedback> Session<SerialLink, F> {
    pub fn connect(&mut self, device_id: &str) {
        let result = self
            .sink
            .connect(device_id)
            .and_then(|()| self.sink.subscribe(INBOUND_DELIMITER));
        match result {
            Ok(()) => {
                self.offline_notified = false;
                self.feedback
                    .notify(Severity::Info, &format!("Connected to {}", device_id.trim()));
            }
            Err(e) => self
                .feedback
                .notify(Severity::Error, &format!("Cannot connect: {}", e)),
        }
    }

    pub fn disconnect(&mut self) {
        match self.sink.disconnect() {
            Ok(()) => self.feedback.notify(Severity::Info, "Disconnected"),
            Err(e) => self.feedback.notify(Severity::Warning, &e.to_string()),
        }
    }

    pub fn refresh(&mut self) {
        match SerialLink::list() {
            Ok(devices) if devices.is_empty() => {
                self.feedback.notify(Severity::Warning, "No serial devices found")
            }
            Ok(devices) => {
                for d in devices {
                    self.feedback
                        .notify(Severity::Info, &format!("{} ({})", d.id, d.kind));
                }
            }
            Err(e) => self
                .feedback
                .notify(Severity::Error, &format!("Device listing failed: {}", e)),
        }
    }
}

pub async fn run(config: RuntimeConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let link = SerialLink::new(&config.link, done_tx, event_tx);
    let mut session = Session::new(&config, link, TracingFeedback);
    session.connect(&config.link.port);

    info!(
        "Runtime started: {:?} format, {}ms send interval",
        config.link.format, config.gate.min_interval_ms
    );
    info!("Controls: drag=steer, L=LED, T=test sound, S=send, R=refresh, C=connect, D=disconnect, Q=quit");

    enable_raw_mode()?;
    execute!(stdout(), EnableMouseCapture)?;
    let result = event_loop(&mut session, &config, &mut done_rx, &mut event_rx).await;
    execute!(stdout(), DisableMouseCapture)?;
    disable_raw_mode()?;

    result
}

async fn event_loop<F: Feedback>(
    session: &mut Session<SerialLink, F>,
    config: &RuntimeConfig,
    done_rx: &mut mpsc::UnboundedReceiver<WriteOutcome>,
    event_rx: &mut mpsc::UnboundedReceiver<LinkEvent>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        // 1. Terminal input (mouse pad + buttons)
        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Mouse(mouse) => handle_mouse(session, &mouse, &config.pad),
                Event::Key(KeyEvent { code, kind, .. }) if kind == KeyEventKind::Press => {
                    let now = Instant::now();
                    match code {
                        KeyCode::Char('l') => session.toggle_led(now),
                        KeyCode::Char('t') => session.test_sound(),
                        KeyCode::Char('s') => session.send_current(now),
                        KeyCode::Char('r') => session.refresh(),
                        KeyCode::Char('c') => session.connect(&config.link.port),
                        KeyCode::Char('d') => session.disconnect(),
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        // 2. Write completions free the gate
        while let Ok(outcome) = done_rx.try_recv() {
            session.on_write_complete(outcome);
        }

        // 3. Whatever the vehicle sent back
        while let Ok(event) = event_rx.try_recv() {
            session.on_link_event(event);
        }

        tokio::task::yield_now().await;
    }

    info!("Shutting down");
    Ok(())
}

fn handle_mouse<F: Feedback>(
    session: &mut Session<SerialLink, F>,
    mouse: &event::MouseEvent,
    pad: &PadConfig,
) {
    if let Some(pointer) = pad::pointer_event(mouse, pad) {
        session.on_pointer(pointer, Instant::now());
    }
}
