use std::sync::Arc;

use anyhow::Context as _;
use log::error;
use vulkano::swapchain::Surface;
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

use crate::carousel::Context;

pub struct App {
    event_loop: EventLoop<()>,
    window: Arc<Window>,
    context: Context,
}

impl App {
    pub fn new() -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("creating event loop")?;
        let required_extensions = Surface::required_extensions(&event_loop);

        let window = Arc::new(
            WindowBuilder::new()
                .with_title("ribbon")
                .build(&event_loop)
                .context("creating window")?,
        );

        let context = Context::new(required_extensions, window.clone())?;

        Ok(App {
            event_loop,
            window,
            context,
        })
    }

    pub fn run(mut self) -> anyhow::Result<()> {
        self.event_loop
            .run(move |event, elwt| {
                elwt.set_control_flow(ControlFlow::Poll);

                if !self.context.handle_event(&event) {
                    elwt.exit();
                }

                match event {
                    Event::WindowEvent {
                        event: WindowEvent::CloseRequested,
                        ..
                    } => {
                        elwt.exit();
                    }
                    Event::WindowEvent {
                        event: WindowEvent::Resized(new_size),
                        ..
                    } => {
                        self.context.window_resized(new_size);
                    }
                    Event::WindowEvent {
                        event: WindowEvent::RedrawRequested,
                        ..
                    } => {
                        if let Err(err) = self.context.frame() {
                            error!("frame failed: {err:#}");
                            elwt.exit();
                        }
                    }
                    // Poll mode: keep the loop hot, one redraw per frame.
                    Event::AboutToWait => {
                        self.window.request_redraw();
                    }
                    _ => (),
                }
            })
            .context("Processing EventLoop")
    }
}
