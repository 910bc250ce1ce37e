// Message types flowing through the control pipeline

use serde::{Deserialize, Serialize};

use crate::config::STEERING_NEUTRAL;

/// Indicator offset inside the joystick region (top-left corner of the stick)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerOffset {
    pub x: f32,
    pub y: f32,
}

impl PointerOffset {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Three-state drive command for the motor
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward = 1,
    #[default]
    Stop = 0,
    Reverse = -1,
}

impl Direction {
    pub fn as_i8(self) -> i8 {
        self as i8
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Led {
    #[default]
    Off = 0,
    On = 1,
}

impl Led {
    pub fn toggled(self) -> Self {
        match self {
            Led::Off => Led::On,
            Led::On => Led::Off,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// What should currently be commanded to the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub steering: i32,
    pub direction: Direction,
    pub led: Led,
}

// Neutral: wheels centered, motor stopped, LED off
impl Default for ControlState {
    fn default() -> Self {
        Self {
            steering: STEERING_NEUTRAL,
            direction: Direction::Stop,
            led: Led::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Start,
    Move,
    End,
}

/// Raw pointer event in screen coordinates (same units as the region)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub source: InputSource,
    pub phase: PointerPhase,
    pub x: f32,
    pub y: f32,
}

impl PointerEvent {
    pub fn new(source: InputSource, phase: PointerPhase, x: f32, y: f32) -> Self {
        Self {
            source,
            phase,
            x,
            y,
        }
    }
}

/// What caused a send, used to pick feedback once it completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Drag,
    Release,
    Led,
    Manual,
}

/// Completion of a serial write, success or failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Sent,
    Failed(String),
}

impl WriteOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, WriteOutcome::Sent)
    }
}
