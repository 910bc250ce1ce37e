// Terminal mouse -> pointer events for the joystick pad

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::config::PadConfig;
use crate::messages::{InputSource, PointerEvent, PointerPhase};

/// Convert a crossterm mouse event; only the left button drives the stick
pub fn pointer_event(mouse: &MouseEvent, pad: &PadConfig) -> Option<PointerEvent> {
    let phase = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => PointerPhase::Start,
        MouseEventKind::Drag(MouseButton::Left) => PointerPhase::Move,
        MouseEventKind::Up(MouseButton::Left) => PointerPhase::End,
        _ => return None,
    };

    let col = mouse.column as f32 - pad.origin_col as f32;
    let row = mouse.row as f32 - pad.origin_row as f32;
    Some(PointerEvent::new(
        InputSource::Mouse,
        phase,
        col * pad.cell_width,
        row * pad.cell_height,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_left_drag_is_scaled() {
        let pad = PadConfig {
            origin_col: 2,
            origin_row: 1,
            ..PadConfig::default()
        };
        let ev = pointer_event(&mouse(MouseEventKind::Drag(MouseButton::Left), 12, 6), &pad).unwrap();
        assert_eq!(ev.phase, PointerPhase::Move);
        assert_eq!(ev.source, InputSource::Mouse);
        assert_eq!((ev.x, ev.y), (80.0, 80.0));
    }

    #[test]
    fn test_other_buttons_ignored() {
        let pad = PadConfig::default();
        assert!(pointer_event(&mouse(MouseEventKind::Down(MouseButton::Right), 0, 0), &pad).is_none());
        assert!(pointer_event(&mouse(MouseEventKind::Moved, 3, 3), &pad).is_none());
        assert!(pointer_event(&mouse(MouseEventKind::ScrollUp, 3, 3), &pad).is_none());
    }

    #[test]
    fn test_release_maps_to_end() {
        let ev = pointer_event(
            &mouse(MouseEventKind::Up(MouseButton::Left), 0, 0),
            &PadConfig::default(),
        )
        .unwrap();
        assert_eq!(ev.phase, PointerPhase::End);
    }
}
