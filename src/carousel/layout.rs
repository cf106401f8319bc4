use std::error::Error;
use std::fmt;

use super::scroll::{Direction, ScrollFrame};

/// Logical plane size in design units, matched against the screen so every
/// plane keeps the same apparent size regardless of window resolution.
pub const DESIGN_WIDTH: f32 = 320.0;
pub const DESIGN_HEIGHT: f32 = 300.0;

/// World-unit gap between neighbouring planes.
pub const SLOT_PADDING: f32 = 0.8;

/// Output range of the shader twist scalar across the viewport. Positions
/// outside the viewport map outside this range, the remap is not clamped.
pub const TWIST_NEAR: f32 = 5.0;
pub const TWIST_FAR: f32 = 15.0;

/// Window surface in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Screen {
    pub width: f32,
    pub height: f32,
}

/// Visible world-unit extents at the carousel's depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

/// A screen or viewport dimension was not positive, the layout math would
/// divide by it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidViewport {
    pub screen: Screen,
    pub viewport: Viewport,
}

impl fmt::Display for InvalidViewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "viewport dimensions must be positive (screen {}x{}, viewport {}x{})",
            self.screen.width, self.screen.height, self.viewport.width, self.viewport.height
        )
    }
}

impl Error for InvalidViewport {}

/// Per-plane layout output for one frame.
#[derive(Debug, Clone, Copy)]
pub struct PlaneFrame {
    /// World-space vertical coordinate of the plane's center.
    pub y: f32,
    /// Shader twist scalar, [`TWIST_NEAR`]..[`TWIST_FAR`] across the viewport.
    pub twist: f32,
}

/// One plane's fixed slot on the vertical ring.
///
/// `extra` accumulates whole-ring corrections: whenever the plane scrolls
/// fully out of view it jumps one `total_height` to the far end, which is
/// what makes a finite ring of planes read as an endless strip. Slots are
/// never reordered or reallocated, the correction is the entire trick.
pub struct PlaneSlot {
    index: usize,
    count: usize,
    base_offset: f32,
    extra: f32,
    plane_size: [f32; 2],
    slot_height: f32,
    total_height: f32,
    viewport: Viewport,
}

impl PlaneSlot {
    pub fn new(index: usize, count: usize) -> Self {
        PlaneSlot {
            index,
            count,
            base_offset: 0.0,
            extra: 0.0,
            plane_size: [0.0, 0.0],
            slot_height: 0.0,
            total_height: 0.0,
            viewport: Viewport {
                width: 0.0,
                height: 0.0,
            },
        }
    }

    /// Recompute everything derived from window and viewport extents. Must
    /// run at startup and after every resize, before the next `update`.
    ///
    /// Pure in its inputs: repeated calls with the same arguments yield the
    /// same layout. Wrap corrections survive a resize untouched.
    pub fn on_viewport_change(
        &mut self,
        screen: Screen,
        viewport: Viewport,
    ) -> Result<(), InvalidViewport> {
        if screen.width <= 0.0
            || screen.height <= 0.0
            || viewport.width <= 0.0
            || viewport.height <= 0.0
        {
            return Err(InvalidViewport { screen, viewport });
        }

        self.plane_size = [
            viewport.width * DESIGN_WIDTH / screen.width,
            viewport.height * DESIGN_HEIGHT / screen.height,
        ];
        self.slot_height = self.plane_size[1] + SLOT_PADDING;
        self.total_height = self.slot_height * self.count as f32;
        self.base_offset = self.slot_height * self.index as f32;
        self.viewport = viewport;

        Ok(())
    }

    /// Place the plane for this frame and flip the wrap correction once the
    /// plane has fully left the viewport in the scroll direction.
    ///
    /// The returned position is the pre-wrap one; a wrap applied this tick
    /// takes effect on the next. The two wrap conditions are mutually
    /// exclusive, at most one correction happens per tick.
    pub fn update(&mut self, frame: &ScrollFrame) -> PlaneFrame {
        let y = self.base_offset - frame.current - self.extra;
        let twist = remap(
            y,
            -self.viewport.height,
            self.viewport.height,
            TWIST_NEAR,
            TWIST_FAR,
        );

        let edge = self.plane_size[1] / 2.0;
        let is_before = y + edge < -self.viewport.height;
        let is_after = y - edge > self.viewport.height;

        match frame.direction {
            Direction::Forward if is_before => self.extra -= self.total_height,
            Direction::Backward if is_after => self.extra += self.total_height,
            _ => {}
        }

        PlaneFrame { y, twist }
    }

    pub fn plane_size(&self) -> [f32; 2] {
        self.plane_size
    }
}

fn remap(num: f32, min1: f32, max1: f32, min2: f32, max2: f32) -> f32 {
    (num - min1) / (max1 - min1) * (max2 - min2) + min2
}

#[cfg(test)]
mod tests {
    use super::*;

    // screen.height chosen so the scaled plane height lands on 2.2, giving
    // slot_height 3.0 with the 0.8 padding.
    fn slot_with(index: usize, count: usize) -> PlaneSlot {
        let screen = Screen {
            width: 1000.0,
            height: 5.0 * DESIGN_HEIGHT / 2.2,
        };
        let viewport = Viewport {
            width: 8.0,
            height: 5.0,
        };
        let mut slot = PlaneSlot::new(index, count);
        slot.on_viewport_change(screen, viewport).unwrap();
        slot
    }

    fn forward(current: f32) -> ScrollFrame {
        ScrollFrame {
            current,
            last: current - 1.0,
            direction: Direction::Forward,
        }
    }

    fn backward(current: f32) -> ScrollFrame {
        ScrollFrame {
            current,
            last: current + 1.0,
            direction: Direction::Backward,
        }
    }

    #[test]
    fn wrap_forward_matches_worked_example() {
        let mut slot = slot_with(2, 4);

        // base 6.0, scroll 20.0: raw position -14.0, fully before the
        // viewport, so the ring advances the plane by one full cycle.
        let first = slot.update(&forward(20.0));
        assert!((first.y - -14.0).abs() < 1e-4);

        let second = slot.update(&forward(20.0));
        assert!((second.y - -2.0).abs() < 1e-4, "wrapped position {}", second.y);
    }

    #[test]
    fn wrap_backward_mirrors_forward() {
        let mut slot = slot_with(1, 4);

        // base 3.0, scroll -9.0: raw position 12.0, fully after.
        let first = slot.update(&backward(-9.0));
        assert!((first.y - 12.0).abs() < 1e-4);

        let second = slot.update(&backward(-9.0));
        assert!((second.y - 0.0).abs() < 1e-4);
    }

    #[test]
    fn no_wrap_against_direction() {
        let mut slot = slot_with(2, 4);

        // Fully before the viewport, but moving backward: no correction.
        let first = slot.update(&backward(20.0));
        let second = slot.update(&backward(20.0));
        assert_eq!(first.y, second.y);
    }

    #[test]
    fn at_most_one_wrap_per_tick() {
        let mut slot = slot_with(0, 4);

        // Far out of view: a single tick must apply exactly one cycle of
        // correction, however large the overshoot.
        let first = slot.update(&forward(100.0));
        let second = slot.update(&forward(100.0));
        assert!((second.y - first.y - 12.0).abs() < 1e-3);
    }

    #[test]
    fn ring_keeps_even_spacing_under_any_scroll() {
        let count = 4;
        let total = 12.0;
        let slot_height = 3.0;

        for scroll_to in [36.0, 250.0, -250.0] {
            let mut slots: Vec<PlaneSlot> =
                (0..count).map(|index| slot_with(index, count)).collect();

            // Walk there gradually so every wrap boundary is crossed.
            let steps = 500;
            let mut wrapped: Vec<f32> = Vec::new();
            for step in 1..=steps {
                let current = scroll_to * step as f32 / steps as f32;
                let frame = if scroll_to >= 0.0 {
                    forward(current)
                } else {
                    backward(current)
                };
                wrapped = slots
                    .iter_mut()
                    .map(|slot| {
                        let y = slot.update(&frame).y;
                        ((y % total) + total) % total
                    })
                    .collect();
            }

            // No gap, no duplicate at the seam: the planes stay exactly one
            // slot apart around the ring.
            wrapped.sort_by(|a, b| a.partial_cmp(b).unwrap());
            for pair in wrapped.windows(2) {
                assert!(
                    (pair[1] - pair[0] - slot_height).abs() < 1e-2,
                    "ring spacing broke at scroll {scroll_to}: {wrapped:?}"
                );
            }
        }
    }

    #[test]
    fn twist_remap_is_unclamped() {
        let mut slot = slot_with(0, 4);

        let centered = slot.update(&forward(0.0));
        assert!((centered.twist - 10.0).abs() < 1e-4);

        // A plane one viewport-height forward of center sits at TWIST_NEAR.
        let mut slot = slot_with(0, 4);
        let at_edge = slot.update(&forward(5.0));
        assert!((at_edge.twist - TWIST_NEAR).abs() < 1e-4);

        // Beyond the viewport the scalar keeps going.
        let mut slot = slot_with(0, 4);
        let outside = slot.update(&forward(10.0));
        assert!(outside.twist < TWIST_NEAR);
    }

    #[test]
    fn viewport_change_is_idempotent() {
        let screen = Screen {
            width: 1280.0,
            height: 720.0,
        };
        let viewport = Viewport {
            width: 16.0,
            height: 9.0,
        };

        let mut slot = PlaneSlot::new(3, 7);
        slot.on_viewport_change(screen, viewport).unwrap();
        let first = (slot.base_offset, slot.slot_height, slot.total_height);

        slot.on_viewport_change(screen, viewport).unwrap();
        let second = (slot.base_offset, slot.slot_height, slot.total_height);

        assert_eq!(first, second);
    }

    #[test]
    fn resize_preserves_wrap_correction() {
        let mut slot = slot_with(2, 4);
        slot.update(&forward(20.0));
        let extra = slot.extra;
        assert!(extra != 0.0);

        let screen = Screen {
            width: 640.0,
            height: 480.0,
        };
        let viewport = Viewport {
            width: 4.0,
            height: 3.0,
        };
        slot.on_viewport_change(screen, viewport).unwrap();
        assert_eq!(slot.extra, extra);
    }

    #[test]
    fn degenerate_viewport_is_rejected() {
        let mut slot = PlaneSlot::new(0, 4);

        let screen = Screen {
            width: 800.0,
            height: 0.0,
        };
        let viewport = Viewport {
            width: 16.0,
            height: 9.0,
        };
        assert!(slot.on_viewport_change(screen, viewport).is_err());

        let screen = Screen {
            width: 800.0,
            height: 600.0,
        };
        let viewport = Viewport {
            width: -1.0,
            height: 9.0,
        };
        assert!(slot.on_viewport_change(screen, viewport).is_err());
    }
}
