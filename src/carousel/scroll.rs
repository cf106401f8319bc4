/// Fraction of the remaining distance to `target` covered per tick.
pub const SCROLL_EASE: f32 = 0.01;

/// Pixels of drag distance per unit of scroll.
pub const DRAG_SENSITIVITY: f32 = 0.1;

/// Normalized wheel pixels per unit of scroll.
pub const WHEEL_SENSITIVITY: f32 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Snapshot of the tracker taken by [`Scroll::tick`]. `last` is the value
/// `current` held on the previous frame, so `velocity` spans one frame.
#[derive(Debug, Clone, Copy)]
pub struct ScrollFrame {
    pub current: f32,
    pub last: f32,
    pub direction: Direction,
}

impl ScrollFrame {
    pub fn velocity(&self) -> f32 {
        self.current - self.last
    }
}

#[derive(Debug, Clone, Copy)]
struct Grab {
    origin: f32,
    start_y: f32,
}

/// Accumulates raw scroll input into a smoothed offset.
///
/// Event handlers only ever write `target` (or the grab fields); `current`,
/// `last` and `direction` are advanced exclusively by `tick`, once per
/// rendered frame.
pub struct Scroll {
    current: f32,
    target: f32,
    last: f32,
    ease: f32,
    direction: Direction,
    grab: Option<Grab>,
}

impl Scroll {
    pub fn new(ease: f32) -> Self {
        assert!(ease > 0.0 && ease <= 1.0, "ease must be in (0, 1]");

        Scroll {
            current: 0.0,
            target: 0.0,
            last: 0.0,
            ease,
            direction: Direction::Backward,
            grab: None,
        }
    }

    /// Relative input, wheel and drag handlers land here.
    pub fn scroll_by(&mut self, delta: f32) {
        self.target += delta;
    }

    /// Absolute input, for an external smooth-scroll source that owns the
    /// easing itself.
    pub fn set_target(&mut self, value: f32) {
        self.target = value;
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    /// Begin a drag gesture at pointer height `y`.
    pub fn grab_start(&mut self, y: f32) {
        self.grab = Some(Grab {
            origin: self.current,
            start_y: y,
        });
    }

    /// Pointer moved to height `y`. No-op unless a gesture is active.
    pub fn grab_move(&mut self, y: f32) {
        if let Some(grab) = self.grab {
            self.target = grab.origin + (grab.start_y - y) * DRAG_SENSITIVITY;
        }
    }

    /// End the gesture. The target stays where the last move left it and
    /// `current` keeps easing toward it, no snap.
    pub fn grab_end(&mut self) {
        self.grab = None;
    }

    pub fn is_grabbed(&self) -> bool {
        self.grab.is_some()
    }

    /// Advance `current` one easing step toward `target` and derive the
    /// movement direction. Call exactly once per rendered frame, after all
    /// input for the frame has been applied.
    ///
    /// When `current` did not move the previous direction is retained.
    pub fn tick(&mut self) -> ScrollFrame {
        self.current = lerp(self.current, self.target, self.ease);

        if self.current > self.last {
            self.direction = Direction::Forward;
        } else if self.current < self.last {
            self.direction = Direction::Backward;
        }

        let frame = ScrollFrame {
            current: self.current,
            last: self.last,
            direction: self.direction,
        };

        self.last = self.current;

        frame
    }
}

fn lerp(p1: f32, p2: f32, t: f32) -> f32 {
    p1 + (p2 - p1) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_converges_without_overshoot() {
        let mut scroll = Scroll::new(0.1);
        scroll.set_target(10.0);

        let mut remaining = 10.0f32;
        for _ in 0..100 {
            let frame = scroll.tick();
            let next = (10.0 - frame.current).abs();
            assert!(next < remaining, "distance to target must shrink");
            assert!(frame.current <= 10.0, "lerp must not overshoot");
            remaining = next;
        }
    }

    #[test]
    fn direction_follows_movement() {
        let mut scroll = Scroll::new(0.5);

        scroll.set_target(5.0);
        assert_eq!(scroll.tick().direction, Direction::Forward);

        scroll.set_target(-5.0);
        assert_eq!(scroll.tick().direction, Direction::Backward);
    }

    #[test]
    fn direction_tie_retains_previous() {
        let mut scroll = Scroll::new(0.5);

        scroll.set_target(4.0);
        assert_eq!(scroll.tick().direction, Direction::Forward);

        // Pin current on target so the next step does not move.
        scroll.set_target(scroll.current());
        let settled = scroll.tick();
        assert_eq!(settled.velocity(), 0.0);
        assert_eq!(settled.direction, Direction::Forward);
    }

    #[test]
    fn velocity_spans_one_frame() {
        let mut scroll = Scroll::new(0.5);
        scroll.set_target(8.0);

        let frame = scroll.tick();
        assert_eq!(frame.last, 0.0);
        assert_eq!(frame.velocity(), 4.0);

        let frame = scroll.tick();
        assert_eq!(frame.last, 4.0);
        assert_eq!(frame.velocity(), 2.0);
    }

    #[test]
    fn drag_offsets_target_from_grab_origin() {
        let mut scroll = Scroll::new(0.5);
        scroll.set_target(6.0);
        for _ in 0..4 {
            scroll.tick();
        }
        let origin = scroll.current();

        scroll.grab_start(100.0);
        scroll.grab_move(60.0);
        assert_eq!(scroll.target(), origin + 40.0 * DRAG_SENSITIVITY);

        // Dragging downward scrolls backward.
        scroll.grab_move(180.0);
        assert_eq!(scroll.target(), origin - 80.0 * DRAG_SENSITIVITY);

        scroll.grab_end();
        let released = scroll.target();
        scroll.grab_move(0.0);
        assert_eq!(scroll.target(), released, "moves after release are ignored");
    }

    #[test]
    fn wheel_deltas_accumulate() {
        let mut scroll = Scroll::new(0.5);
        scroll.scroll_by(120.0 * WHEEL_SENSITIVITY);
        scroll.scroll_by(120.0 * WHEEL_SENSITIVITY);
        assert!((scroll.target() - 1.2).abs() < 1e-6);
    }

    #[test]
    #[should_panic]
    fn zero_ease_is_rejected() {
        Scroll::new(0.0);
    }
}
