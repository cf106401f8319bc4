use rand::Rng;

use super::layout::{InvalidViewport, PlaneSlot, Screen, Viewport};
use super::scroll::{Scroll, SCROLL_EASE};

/// Per-frame advance of each plane's shader clock.
pub const TIME_STEP: f32 = 0.04;

/// Uniform values for one plane, handed to the renderer each frame. Opaque
/// numerics as far as the driver is concerned, the shading stage decides
/// what they look like.
#[derive(Debug, Clone, Copy)]
pub struct PlaneInstance {
    pub y: f32,
    pub twist: f32,
    pub time: f32,
    pub velocity: f32,
    pub plane_size: [f32; 2],
}

/// Owns the scroll tracker and the ring of plane slots, and advances both
/// once per displayed frame. The host's refresh scheduler calls [`tick`],
/// the driver never arms its own loop.
///
/// [`tick`]: Carousel::tick
pub struct Carousel {
    scroll: Scroll,
    slots: Vec<PlaneSlot>,
    times: Vec<f32>,
    instances: Vec<PlaneInstance>,
}

impl Carousel {
    pub fn new(count: usize) -> Self {
        let mut rng = rand::thread_rng();

        Carousel {
            scroll: Scroll::new(SCROLL_EASE),
            slots: (0..count).map(|index| PlaneSlot::new(index, count)).collect(),
            // Desynchronized clocks keep neighbouring planes from rippling
            // in lockstep.
            times: (0..count).map(|_| rng.gen::<f32>() * 100.0).collect(),
            instances: Vec::with_capacity(count),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn scroll_mut(&mut self) -> &mut Scroll {
        &mut self.scroll
    }

    /// Absolute target for an external smooth-scroll source.
    pub fn set_target(&mut self, value: f32) {
        self.scroll.set_target(value);
    }

    pub fn on_viewport_change(
        &mut self,
        screen: Screen,
        viewport: Viewport,
    ) -> Result<(), InvalidViewport> {
        for slot in &mut self.slots {
            slot.on_viewport_change(screen, viewport)?;
        }
        Ok(())
    }

    /// One animation step: ease the scroll, lay out every plane, refresh
    /// the per-plane uniforms.
    pub fn tick(&mut self) -> &[PlaneInstance] {
        let frame = self.scroll.tick();
        let velocity = frame.velocity();

        self.instances.clear();
        for (slot, time) in self.slots.iter_mut().zip(self.times.iter_mut()) {
            *time += TIME_STEP;
            let placed = slot.update(&frame);
            self.instances.push(PlaneInstance {
                y: placed.y,
                twist: placed.twist,
                time: *time,
                velocity,
                plane_size: slot.plane_size(),
            });
        }

        &self.instances
    }
}
