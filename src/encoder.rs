// Wire encoding of a full control state, one line per command
//
// Csv (default):  "<steering>,<direction>,<led>\n"      e.g. "90,0,0\n"
// Json:           "{\"s\":<steering>,\"m\":<direction>,\"l\":<led>}\n"
//
// Both carry every field in a single line; the receiver never has to merge
// partial updates.

use serde::{Deserialize, Serialize};

use crate::messages::ControlState;

pub const LINE_TERMINATOR: char = '\n';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    #[default]
    Csv,
    Json,
}

// Field order of the Json line follows declaration order
#[derive(Serialize)]
struct JsonLine {
    s: i32,
    m: i8,
    l: u8,
}

pub fn encode(state: &ControlState, format: WireFormat) -> String {
    match format {
        WireFormat::Csv => encode_csv(state),
        WireFormat::Json => encode_json(state),
    }
}

pub fn encode_csv(state: &ControlState) -> String {
    format!(
        "{},{},{}{}",
        state.steering,
        state.direction.as_i8(),
        state.led.as_u8(),
        LINE_TERMINATOR
    )
}

pub fn encode_json(state: &ControlState) -> String {
    let line = JsonLine {
        s: state.steering,
        m: state.direction.as_i8(),
        l: state.led.as_u8(),
    };
    // Plain integer fields cannot fail to serialize
    let mut out = serde_json::to_string(&line).unwrap_or_default();
    out.push(LINE_TERMINATOR);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Direction, Led};

    #[test]
    fn test_neutral_csv() {
        assert_eq!(encode(&ControlState::default(), WireFormat::Csv), "90,0,0\n");
    }

    #[test]
    fn test_negative_direction_csv() {
        let state = ControlState {
            steering: 137,
            direction: Direction::Reverse,
            led: Led::On,
        };
        assert_eq!(encode_csv(&state), "137,-1,1\n");
    }

    #[test]
    fn test_json_keys_and_order() {
        let state = ControlState {
            steering: 45,
            direction: Direction::Forward,
            led: Led::Off,
        };
        assert_eq!(encode(&state, WireFormat::Json), "{\"s\":45,\"m\":1,\"l\":0}\n");
    }

    #[test]
    fn test_led_changes_encoding() {
        let off = ControlState::default();
        let on = ControlState {
            led: Led::On,
            ..off
        };
        assert_ne!(encode_csv(&off), encode_csv(&on));
    }
}
