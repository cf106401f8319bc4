use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};
use tracing::{span, Level};
use vulkano::instance::InstanceExtensions;
use winit::{dpi::PhysicalSize, event::Event, window::Window};

#[cfg(feature = "tracing")]
use tracing_tracy::client::frame_mark;

use crate::graphics::{Camera, CarouselCamera, RenderCoordinator};

use super::driver::Carousel;
use super::input::InputCollector;
use super::layout::Screen;
use super::loader::{scan_images, Loader};

const DEFAULT_IMAGE_DIR: &str = "assets/img";

/// Glues the carousel driver to the window: input, camera, asset loading
/// and the render coordinator.
pub struct Context {
    camera: CarouselCamera,
    coordinator: RenderCoordinator,
    carousel: Carousel,
    input: InputCollector,
    loader: Loader,
}

impl Context {
    pub fn new(
        required_extensions: InstanceExtensions,
        window: Arc<Window>,
    ) -> anyhow::Result<Self> {
        let image_dir = env::args()
            .nth(1)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_DIR));
        let paths = scan_images(&image_dir)?;
        info!("presenting {} images from {}", paths.len(), image_dir.display());

        let size = window.inner_size();
        let camera = CarouselCamera::new_with_aspect(aspect(size));

        let mut carousel = Carousel::new(paths.len());
        carousel.on_viewport_change(screen(size), camera.viewport())?;

        let mut coordinator = RenderCoordinator::new(required_extensions, window, paths.len())?;
        coordinator.set_camera_params(camera.calculate_matrices());
        coordinator.set_world_viewport(camera.viewport());

        let loader = Loader::spawn(paths);

        Ok(Context {
            camera,
            coordinator,
            carousel,
            input: InputCollector::new(),
            loader,
        })
    }

    /// Input handlers only ever touch the scroll target; everything derived
    /// waits for the frame tick. Returns false when the session should end.
    pub fn handle_event(&mut self, event: &Event<()>) -> bool {
        self.input.process_event(event, self.carousel.scroll_mut())
    }

    pub fn window_resized(&mut self, new_size: PhysicalSize<u32>) {
        self.coordinator.window_resized(new_size);

        self.camera.set_aspect(aspect(new_size));
        self.coordinator.set_camera_params(self.camera.calculate_matrices());
        self.coordinator.set_world_viewport(self.camera.viewport());

        // A minimized window reports zero extents; keep the previous layout
        // until a real size shows up.
        if let Err(err) = self
            .carousel
            .on_viewport_change(screen(new_size), self.camera.viewport())
        {
            warn!("skipping layout update: {err}");
        }
    }

    /// One animation frame: drain decoded images, advance the carousel,
    /// submit the scene.
    pub fn frame(&mut self) -> anyhow::Result<()> {
        let _frame = span!(Level::INFO, "frame").entered();

        for loaded in self.loader.poll() {
            self.coordinator.upload_texture(loaded.index, &loaded.image)?;
        }

        let planes = self.carousel.tick();
        self.coordinator.set_planes(planes);

        self.coordinator.draw()?;

        #[cfg(feature = "tracing")]
        frame_mark();

        Ok(())
    }
}

fn screen(size: PhysicalSize<u32>) -> Screen {
    Screen {
        width: size.width as f32,
        height: size.height as f32,
    }
}

fn aspect(size: PhysicalSize<u32>) -> f32 {
    if size.height == 0 {
        1.0
    } else {
        size.width as f32 / size.height as f32
    }
}
