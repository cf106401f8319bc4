use winit::event::{ElementState, Event, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::keyboard::KeyCode;
use winit_input_helper::WinitInputHelper;

use super::scroll::{Scroll, WHEEL_SENSITIVITY};

/// Pixels represented by one wheel line tick, for devices that report line
/// deltas instead of pixel deltas.
const WHEEL_LINE_HEIGHT: f32 = 40.0;

/// Folds winit input into the scroll tracker: wheel deltas accumulate on
/// the target, pointer and touch drags run the grab gesture.
pub struct InputCollector {
    helper: WinitInputHelper,
    pointer_y: f32,
}

impl Default for InputCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl InputCollector {
    pub fn new() -> Self {
        InputCollector {
            helper: WinitInputHelper::new(),
            pointer_y: 0.0,
        }
    }

    /// Returns false when the session should end (escape pressed).
    pub fn process_event(&mut self, event: &Event<()>, scroll: &mut Scroll) -> bool {
        if let Event::WindowEvent { event, .. } = event {
            match event {
                WindowEvent::MouseWheel { delta, .. } => {
                    scroll.scroll_by(normalized_wheel_delta(delta) * WHEEL_SENSITIVITY);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    self.pointer_y = position.y as f32;
                    // No-op unless a grab is active.
                    scroll.grab_move(self.pointer_y);
                }
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => match state {
                    ElementState::Pressed => scroll.grab_start(self.pointer_y),
                    ElementState::Released => scroll.grab_end(),
                },
                WindowEvent::Touch(touch) => {
                    let y = touch.location.y as f32;
                    match touch.phase {
                        TouchPhase::Started => scroll.grab_start(y),
                        TouchPhase::Moved => scroll.grab_move(y),
                        TouchPhase::Ended | TouchPhase::Cancelled => scroll.grab_end(),
                    }
                }
                _ => {}
            }
        }

        // WinitInputHelper batches events and reports true once per frame.
        if self.helper.update(event) && self.helper.key_pressed(KeyCode::Escape) {
            return false;
        }

        true
    }
}

/// Unify wheel reports into pixels, positive when scrolling the carousel
/// forward (wheel pulled down).
fn normalized_wheel_delta(delta: &MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * WHEEL_LINE_HEIGHT,
        MouseScrollDelta::PixelDelta(position) => -position.y as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn line_deltas_scale_to_pixels() {
        let delta = MouseScrollDelta::LineDelta(0.0, -3.0);
        assert_eq!(normalized_wheel_delta(&delta), 3.0 * WHEEL_LINE_HEIGHT);
    }

    #[test]
    fn pixel_deltas_pass_through() {
        let delta = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -120.0));
        assert_eq!(normalized_wheel_delta(&delta), 120.0);
    }

    #[test]
    fn wheel_down_scrolls_forward() {
        let mut scroll = Scroll::new(0.5);
        let down = MouseScrollDelta::LineDelta(0.0, -1.0);
        scroll.scroll_by(normalized_wheel_delta(&down) * WHEEL_SENSITIVITY);
        assert!(scroll.target() > 0.0);
    }
}
