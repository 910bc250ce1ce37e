//! Pointer tracking for the virtual joystick.
//!
//! Mouse and touch drive the same indicator. Only one input session can be
//! open at a time: starting a new one tears the previous one down.

use tracing::{debug, trace};

use crate::config::RegionConfig;
use crate::messages::{InputSource, PointerEvent, PointerOffset, PointerPhase};

/// Which input kind currently owns the drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputSession {
    NoSession,
    MouseSession { last_x: f32, last_y: f32 },
    TouchSession { last_x: f32, last_y: f32 },
}

impl InputSession {
    fn open(source: InputSource, x: f32, y: f32) -> Self {
        match source {
            InputSource::Mouse => InputSession::MouseSession {
                last_x: x,
                last_y: y,
            },
            InputSource::Touch => InputSession::TouchSession {
                last_x: x,
                last_y: y,
            },
        }
    }

    pub fn source(&self) -> Option<InputSource> {
        match self {
            InputSession::NoSession => None,
            InputSession::MouseSession { .. } => Some(InputSource::Mouse),
            InputSession::TouchSession { .. } => Some(InputSource::Touch),
        }
    }

    fn last_mut(&mut self) -> Option<(&mut f32, &mut f32)> {
        match self {
            InputSession::NoSession => None,
            InputSession::MouseSession { last_x, last_y }
            | InputSession::TouchSession { last_x, last_y } => Some((last_x, last_y)),
        }
    }
}

/// Result of feeding one event to the tracker
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerUpdate {
    /// A drag began; the indicator has not moved yet
    Started,
    /// The indicator moved to a new (clamped) offset
    Moved(PointerOffset),
    /// The drag ended and the indicator went back to rest
    Released(PointerOffset),
    /// Event did not belong to the active session
    Ignored,
}

#[derive(Debug, Clone)]
pub struct PointerTracker {
    region: RegionConfig,
    offset: PointerOffset,
    session: InputSession,
}

impl PointerTracker {
    pub fn new(region: RegionConfig) -> Self {
        let rest = rest_position(&region);
        Self {
            region,
            offset: rest,
            session: InputSession::NoSession,
        }
    }

    pub fn offset(&self) -> PointerOffset {
        self.offset
    }

    pub fn session(&self) -> InputSession {
        self.session
    }

    pub fn region(&self) -> &RegionConfig {
        &self.region
    }

    pub fn handle(&mut self, event: PointerEvent) -> TrackerUpdate {
        match event.phase {
            PointerPhase::Start => self.start(event.source, event.x, event.y),
            PointerPhase::Move => self.drag(event.source, event.x, event.y),
            PointerPhase::End => self.end(event.source),
        }
    }

    pub fn start(&mut self, source: InputSource, x: f32, y: f32) -> TrackerUpdate {
        if let Some(previous) = self.session.source() {
            debug!("Replacing {:?} session with {:?}", previous, source);
        }
        self.session = InputSession::open(source, x, y);
        TrackerUpdate::Started
    }

    pub fn drag(&mut self, source: InputSource, x: f32, y: f32) -> TrackerUpdate {
        if self.session.source() != Some(source) {
            trace!("Dropping {:?} move outside its session", source);
            return TrackerUpdate::Ignored;
        }
        let Some((last_x, last_y)) = self.session.last_mut() else {
            return TrackerUpdate::Ignored;
        };

        let dx = x - *last_x;
        let dy = y - *last_y;
        *last_x = x;
        *last_y = y;

        let (lo, hi) = bounds(&self.region);
        self.offset = PointerOffset {
            x: (self.offset.x + dx).clamp(lo, hi),
            y: (self.offset.y + dy).clamp(lo, hi),
        };
        TrackerUpdate::Moved(self.offset)
    }

    pub fn end(&mut self, source: InputSource) -> TrackerUpdate {
        if self.session.source() != Some(source) {
            return TrackerUpdate::Ignored;
        }
        self.session = InputSession::NoSession;
        self.offset = rest_position(&self.region);
        TrackerUpdate::Released(self.offset)
    }
}

/// Allowed offset range, identical on both axes
pub fn bounds(region: &RegionConfig) -> (f32, f32) {
    let hi = region.size + region.margin - region.indicator_size;
    (region.min_offset, hi.max(region.min_offset))
}

pub fn rest_position(region: &RegionConfig) -> PointerOffset {
    let center = region.size / 2.0 + region.rest_offset;
    PointerOffset::new(center, center)
}
