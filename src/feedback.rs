// Operator feedback: tones and visible notices
//
// The oscillator itself lives outside this crate. `TracingFeedback` reports
// what would be played so the pipeline can run headless.

use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::messages::{ControlState, Led, Trigger, WriteOutcome};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration: Duration,
}

impl Tone {
    pub const fn new(frequency_hz: f32, duration_ms: u64) -> Self {
        Self {
            frequency_hz,
            duration: Duration::from_millis(duration_ms),
        }
    }
}

pub const TEST_TONE: Tone = Tone::new(440.0, 1000);
pub const DRAG_ERROR_TONE: Tone = Tone::new(0.0, 1000);
pub const RELEASE_TONE: Tone = Tone::new(1200.0, 100);
pub const LED_ON_TONE: Tone = Tone::new(1000.0, 100);
pub const LED_OFF_TONE: Tone = Tone::new(500.0, 100);
pub const LED_ERROR_TONE: Tone = Tone::new(1500.0, 100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

pub trait Feedback {
    fn play(&mut self, tone: Tone);
    fn notify(&mut self, severity: Severity, message: &str);
}

/// Tone for a finished write, chosen by what triggered it
pub fn completion_tone(trigger: Trigger, outcome: &WriteOutcome, state: &ControlState) -> Tone {
    match (trigger, outcome.is_ok()) {
        // Pitch follows the wheel angle
        (Trigger::Drag | Trigger::Manual, true) => Tone::new(state.steering as f32 * 10.0, 1000),
        (Trigger::Drag | Trigger::Manual, false) => DRAG_ERROR_TONE,
        (Trigger::Release, _) => RELEASE_TONE,
        (Trigger::Led, true) => match state.led {
            Led::On => LED_ON_TONE,
            Led::Off => LED_OFF_TONE,
        },
        (Trigger::Led, false) => LED_ERROR_TONE,
    }
}

#[derive(Debug, Default)]
pub struct TracingFeedback;

impl Feedback for TracingFeedback {
    fn play(&mut self, tone: Tone) {
        debug!(
            "Tone {:.0} Hz for {} ms",
            tone.frequency_hz,
            tone.duration.as_millis()
        );
    }

    fn notify(&mut self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => info!("{}", message),
            Severity::Warning => warn!("{}", message),
            Severity::Error => error!("{}", message),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records everything instead of playing it
    #[derive(Debug, Default)]
    pub struct RecordingFeedback {
        pub tones: Vec<Tone>,
        pub notices: Vec<(Severity, String)>,
    }

    impl Feedback for RecordingFeedback {
        fn play(&mut self, tone: Tone) {
            self.tones.push(tone);
        }

        fn notify(&mut self, severity: Severity, message: &str) {
            self.notices.push((severity, message.to_string()));
        }
    }
}
