//! Input translation
//!
//! Key presses and touch gestures become discrete [`Action`] tokens that
//! the host appends to the simulation's queue. Nothing here touches game
//! state; the queue is drained synchronously inside the tick.

use glam::Vec2;
use winit::event::VirtualKeyCode;

use crate::consts::SWIPE_THRESHOLD;
use crate::sim::Action;

/// Map a pressed key to an action. Arrows, WASD, and vi keys move;
/// Space reads as "forward" so the title screen starts on any of them.
pub fn action_for_key(key: VirtualKeyCode) -> Option<Action> {
    use VirtualKeyCode::*;
    match key {
        Up | W | K | Space => Some(Action::MoveUp),
        Down | S | J => Some(Action::MoveDown),
        Left | A | H => Some(Action::MoveLeft),
        Right | D | L => Some(Action::MoveRight),
        Escape | P => Some(Action::Pause),
        _ => None,
    }
}

/// Classify a touch gesture from its start and end points.
///
/// A movement below the swipe threshold is a tap, which hops forward.
/// Otherwise the dominant axis picks the direction.
pub fn action_for_gesture(start: Vec2, end: Vec2) -> Action {
    let delta = end - start;
    if delta.length() < SWIPE_THRESHOLD {
        return Action::MoveUp;
    }
    if delta.x.abs() > delta.y.abs() {
        if delta.x > 0.0 {
            Action::MoveRight
        } else {
            Action::MoveLeft
        }
    } else if delta.y > 0.0 {
        Action::MoveDown
    } else {
        Action::MoveUp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(action_for_key(VirtualKeyCode::Up), Some(Action::MoveUp));
        assert_eq!(action_for_key(VirtualKeyCode::A), Some(Action::MoveLeft));
        assert_eq!(action_for_key(VirtualKeyCode::L), Some(Action::MoveRight));
        assert_eq!(action_for_key(VirtualKeyCode::Escape), Some(Action::Pause));
        assert_eq!(action_for_key(VirtualKeyCode::F1), None);
    }

    #[test]
    fn test_tap_is_forward() {
        let start = Vec2::new(100.0, 100.0);
        let end = Vec2::new(110.0, 95.0);
        assert_eq!(action_for_gesture(start, end), Action::MoveUp);
    }

    #[test]
    fn test_swipe_directions() {
        let origin = Vec2::new(200.0, 200.0);
        assert_eq!(
            action_for_gesture(origin, origin + Vec2::new(80.0, 10.0)),
            Action::MoveRight
        );
        assert_eq!(
            action_for_gesture(origin, origin + Vec2::new(-80.0, 10.0)),
            Action::MoveLeft
        );
        assert_eq!(
            action_for_gesture(origin, origin + Vec2::new(5.0, 70.0)),
            Action::MoveDown
        );
        assert_eq!(
            action_for_gesture(origin, origin + Vec2::new(5.0, -70.0)),
            Action::MoveUp
        );
    }

    #[test]
    fn test_threshold_boundary() {
        let origin = Vec2::ZERO;
        // Just under the threshold: tap
        assert_eq!(
            action_for_gesture(origin, Vec2::new(0.0, 29.0)),
            Action::MoveUp
        );
        // At or past it: swipe
        assert_eq!(
            action_for_gesture(origin, Vec2::new(0.0, 31.0)),
            Action::MoveDown
        );
    }
}
