// Per-session controller state: tracker, mapped state register, LED, gate
//
// One instance per operator session. Nothing here is global; the runtime
// owns the controller and passes it events in arrival order.

use std::time::Instant;
use tracing::debug;

use crate::config::{MapperConfig, RegionConfig, RuntimeConfig};
use crate::encoder::{encode, WireFormat};
use crate::gate::{GateDecision, TransmissionGate};
use crate::link::{CommandSink, LinkError};
use crate::mapper;
use crate::messages::{ControlState, PointerEvent, Trigger, WriteOutcome};
use crate::tracker::{PointerTracker, TrackerUpdate};

/// The send that is currently waiting for its completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingSend {
    pub trigger: Trigger,
    pub state: ControlState,
}

pub struct Controller {
    mapper: MapperConfig,
    format: WireFormat,
    tracker: PointerTracker,
    state: ControlState,
    gate: TransmissionGate,
    pending: Option<PendingSend>,
}

impl Controller {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            mapper: config.mapper,
            format: config.link.format,
            tracker: PointerTracker::new(config.region),
            state: ControlState::default(),
            gate: TransmissionGate::new(config.gate.min_interval()),
            pending: None,
        }
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn gate(&self) -> &TransmissionGate {
        &self.gate
    }

    pub fn tracker(&self) -> &PointerTracker {
        &self.tracker
    }

    pub fn region(&self) -> &RegionConfig {
        self.tracker.region()
    }

    /// Feed a pointer event; returns what to transmit for, if anything changed
    pub fn on_pointer(&mut self, event: PointerEvent) -> Option<Trigger> {
        match self.tracker.handle(event) {
            TrackerUpdate::Moved(offset) => {
                self.state = mapper::map_offset(offset, self.state.led, self.region(), &self.mapper);
                Some(Trigger::Drag)
            }
            TrackerUpdate::Released(_) => {
                self.state = mapper::released(self.state.led);
                Some(Trigger::Release)
            }
            TrackerUpdate::Started | TrackerUpdate::Ignored => None,
        }
    }

    pub fn toggle_led(&mut self) -> Trigger {
        self.state.led = self.state.led.toggled();
        debug!("LED now {:?}", self.state.led);
        Trigger::Led
    }

    pub fn encoded(&self) -> String {
        encode(&self.state, self.format)
    }

    /// Run the current state through the gate and hand accepted lines to `sink`
    ///
    /// Rejected synchronously with `NotConnected` when there is no device; the
    /// gate is left untouched in that case. A line the sink refuses counts as
    /// a failed send.
    pub fn transmit<S: CommandSink>(
        &mut self,
        trigger: Trigger,
        sink: &mut S,
        now: Instant,
    ) -> Result<GateDecision, LinkError> {
        if !sink.is_connected() {
            return Err(LinkError::NotConnected);
        }

        let line = self.encoded();
        let decision = self.gate.offer(&line, now);
        if let GateDecision::Send(line) = &decision {
            self.pending = Some(PendingSend {
                trigger,
                state: self.state,
            });
            if let Err(e) = sink.submit(line.clone()) {
                self.complete(&WriteOutcome::Failed(e.to_string()));
                return Err(e);
            }
        }
        Ok(decision)
    }

    /// Completion of the outstanding write; frees the gate
    pub fn complete(&mut self, outcome: &WriteOutcome) -> Option<PendingSend> {
        self.gate.complete(outcome);
        self.pending.take()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Sink that records lines instead of writing them
    #[derive(Debug)]
    pub struct RecordingSink {
        pub connected: bool,
        pub refuse: bool,
        pub lines: Vec<String>,
    }

    impl Default for RecordingSink {
        fn default() -> Self {
            Self {
                connected: true,
                refuse: false,
                lines: Vec::new(),
            }
        }
    }

    impl CommandSink for RecordingSink {
        fn is_connected(&self) -> bool {
            self.connected
        }

        fn submit(&mut self, line: String) -> Result<(), LinkError> {
            if self.refuse {
                return Err(LinkError::WriterClosed {
                    device: "test".to_string(),
                });
            }
            self.lines.push(line);
            Ok(())
        }
    }
}
