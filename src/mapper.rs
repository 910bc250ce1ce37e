// Joystick offset -> steering angle and motor direction
//
// Steering is a linear map of the horizontal offset over the region width,
// with the (90, 100) band flattened onto neutral. Direction is a three-way
// threshold on the vertical offset around the region center.

use crate::config::{MapperConfig, RegionConfig, DEAD_ZONE, STEERING_NEUTRAL};
use crate::messages::{ControlState, Direction, Led, PointerOffset};

/// Steering before rounding, after dead-zone flattening
pub fn steering_raw(x: f32, region: &RegionConfig, mapper: &MapperConfig) -> f32 {
    let span = mapper.steering_max - mapper.steering_min;
    let raw = (x / region.size) * span + mapper.steering_min;

    if DEAD_ZONE.0 < raw && raw < DEAD_ZONE.1 {
        STEERING_NEUTRAL as f32
    } else {
        raw
    }
}

pub fn steering(x: f32, region: &RegionConfig, mapper: &MapperConfig) -> i32 {
    steering_raw(x, region, mapper).round() as i32
}

pub fn direction(y: f32, region: &RegionConfig, mapper: &MapperConfig) -> Direction {
    let center = region.size / 2.0;
    if y < center - mapper.tolerance {
        Direction::Forward
    } else if y > center + mapper.tolerance {
        Direction::Reverse
    } else {
        Direction::Stop
    }
}

/// Map a live offset, keeping the independently toggled LED
pub fn map_offset(
    offset: PointerOffset,
    led: Led,
    region: &RegionConfig,
    mapper: &MapperConfig,
) -> ControlState {
    ControlState {
        steering: steering(offset.x, region, mapper),
        direction: direction(offset.y, region, mapper),
        led,
    }
}

/// Release always returns to neutral, whatever the last offset was
pub fn released(led: Led) -> ControlState {
    ControlState {
        steering: STEERING_NEUTRAL,
        direction: Direction::Stop,
        led,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;

    fn classic() -> (RegionConfig, MapperConfig) {
        (RegionConfig::default(), MapperConfig::for_profile(Profile::Classic))
    }

    #[test]
    fn test_center_maps_to_neutral() {
        let (region, mapper) = classic();
        let state = map_offset(PointerOffset::new(100.0, 100.0), Led::Off, &region, &mapper);
        assert_eq!(state, ControlState::default());
    }

    #[test]
    fn test_full_left_forward() {
        let (region, mapper) = classic();
        let state = map_offset(PointerOffset::new(0.0, 40.0), Led::Off, &region, &mapper);
        assert_eq!(state.steering, 45);
        assert_eq!(state.direction, Direction::Forward);
    }

    #[test]
    fn test_full_right_reverse() {
        let (region, mapper) = classic();
        let state = map_offset(PointerOffset::new(200.0, 170.0), Led::On, &region, &mapper);
        assert_eq!(state.steering, 135);
        assert_eq!(state.direction, Direction::Reverse);
        assert_eq!(state.led, Led::On);
    }

    #[test]
    fn test_dead_zone_flattens_to_neutral() {
        let (region, mapper) = classic();
        // Every x whose linear map lands strictly inside (90, 100)
        let mut x = 100.0;
        while x < 220.0 {
            let raw = (x / region.size) * 90.0 + 45.0;
            let mapped = steering(x, &region, &mapper);
            if raw > 90.0 && raw < 100.0 {
                assert_eq!(mapped, 90, "x={} raw={}", x, raw);
            }
            x += 0.25;
        }
        // Edges of the band are untouched
        assert_eq!(steering_raw(100.0, &region, &mapper), 90.0);
        assert_eq!(steering(124.0, &region, &mapper), 101);
    }

    #[test]
    fn test_no_clamping_beyond_range() {
        let (region, mapper) = classic();
        assert_eq!(steering(240.0, &region, &mapper), 153);
    }

    #[test]
    fn test_direction_tolerance_band() {
        let (region, mapper) = classic();
        assert_eq!(direction(93.4, &region, &mapper), Direction::Forward);
        assert_eq!(direction(93.5, &region, &mapper), Direction::Stop);
        assert_eq!(direction(106.5, &region, &mapper), Direction::Stop);
        assert_eq!(direction(106.6, &region, &mapper), Direction::Reverse);
    }

    #[test]
    fn test_wide_profile() {
        let region = RegionConfig::default();
        let mapper = MapperConfig::for_profile(Profile::Wide);
        assert_eq!(steering(0.0, &region, &mapper), 40);
        assert_eq!(steering(200.0, &region, &mapper), 138);
        assert_eq!(direction(85.0, &region, &mapper), Direction::Stop);
        assert_eq!(direction(79.0, &region, &mapper), Direction::Forward);
    }

    #[test]
    fn test_release_ignores_offset() {
        let state = released(Led::On);
        assert_eq!(state.steering, 90);
        assert_eq!(state.direction, Direction::Stop);
        assert_eq!(state.led, Led::On);
    }
}
