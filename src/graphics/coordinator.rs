use std::sync::Arc;

use anyhow::{bail, Context};
use cgmath::Matrix4;
use image::RgbaImage;
use log::{error, info};
use tracing::{event, span, Level};

#[cfg(target_os = "macos")]
use vulkano::instance::InstanceCreateFlags;

use vulkano::{
    command_buffer::{
        allocator::StandardCommandBufferAllocator, AutoCommandBufferBuilder,
        CommandBufferExecFuture, CommandBufferUsage,
    },
    device::{Device, DeviceCreateInfo, DeviceExtensions, Queue, QueueCreateInfo},
    image::ImageUsage,
    instance::{Instance, InstanceCreateInfo, InstanceExtensions},
    memory::allocator::StandardMemoryAllocator,
    pipeline::graphics::viewport::Viewport,
    swapchain::{
        self, PresentFuture, Surface, Swapchain, SwapchainAcquireFuture, SwapchainCreateInfo,
        SwapchainPresentInfo,
    },
    sync::{
        self,
        future::{FenceSignalFuture, JoinFuture},
        GpuFuture,
    },
    Validated, VulkanError,
};
use winit::{dpi::PhysicalSize, window::Window};

use crate::carousel::{PlaneInstance, Viewport as WorldViewport};

use super::{helpers, plane_renderer::PlaneRenderer, render_data::RenderData, texture};

type MyJoinFuture = JoinFuture<Box<dyn GpuFuture>, SwapchainAcquireFuture>;
type MyCommandBufferFuture = CommandBufferExecFuture<MyJoinFuture>;
type MyPresentFuture = PresentFuture<MyCommandBufferFuture>;
type MyFenceSignalFuture = FenceSignalFuture<MyPresentFuture>;
type FenceSignalFuturesList = Vec<Option<Arc<MyFenceSignalFuture>>>;

/// Owns the device, swapchain and frame pacing; plane drawing itself is
/// recorded by the [`PlaneRenderer`].
pub struct RenderCoordinator {
    device: Arc<Device>,
    swapchain: Arc<Swapchain>,

    viewport: Viewport,
    window_resized: bool,
    dimensions: PhysicalSize<u32>,
    need_swapchain_recreation: bool,

    memory_allocator: Arc<StandardMemoryAllocator>,
    command_buffer_allocator: StandardCommandBufferAllocator,

    queue: Arc<Queue>,

    // Per Frame Data
    previous_fence_i: u32,
    fences: FenceSignalFuturesList,

    render_data: RenderData,
    plane_renderer: PlaneRenderer,
}

impl RenderCoordinator {
    pub fn new(
        extensions: InstanceExtensions,
        window: Arc<Window>,
        plane_count: usize,
    ) -> anyhow::Result<Self> {
        let library = vulkano::VulkanLibrary::new().context("no local Vulkan library/DLL")?;

        let create_info = InstanceCreateInfo {
            #[cfg(target_os = "macos")]
            flags: InstanceCreateFlags::ENUMERATE_PORTABILITY,
            enabled_extensions: InstanceExtensions {
                #[cfg(target_os = "macos")]
                khr_portability_enumeration: true,
                ..extensions
            },
            ..Default::default()
        };

        let instance = Instance::new(library, create_info).context("creating instance")?;

        let surface = Surface::from_window(instance.clone(), window.clone())?;

        let device_extensions = DeviceExtensions {
            khr_swapchain: true,
            ..DeviceExtensions::empty()
        };

        let (physical_device, queue_family_index) =
            helpers::select_physical_device(&instance, &surface, &device_extensions)?;

        info!(
            "Current Graphics Device is {}",
            physical_device.properties().device_name
        );

        let (device, mut queues) = Device::new(
            physical_device.clone(),
            DeviceCreateInfo {
                queue_create_infos: vec![QueueCreateInfo {
                    queue_family_index,
                    ..Default::default()
                }],
                enabled_extensions: device_extensions,
                ..Default::default()
            },
        )
        .context("creating logical device")?;

        let queue = queues.next().context("getting a queue")?;

        let (swapchain, images) = {
            let caps = physical_device
                .surface_capabilities(&surface, Default::default())
                .context("getting surface capabilities")?;

            let dimensions = window.inner_size();
            let composite_alpha = caps
                .supported_composite_alpha
                .into_iter()
                .next()
                .context("getting supported composite alpha")?;
            let image_format = physical_device
                .surface_formats(&surface, Default::default())
                .context("getting surface formats")?[0]
                .0;

            Swapchain::new(
                device.clone(),
                surface,
                SwapchainCreateInfo {
                    min_image_count: caps.min_image_count,
                    image_format,
                    image_extent: dimensions.into(),
                    image_usage: ImageUsage::COLOR_ATTACHMENT,
                    composite_alpha,
                    ..Default::default()
                },
            )?
        };

        let memory_allocator = Arc::new(StandardMemoryAllocator::new_default(device.clone()));

        let viewport = Viewport {
            offset: [0.0, 0.0],
            extent: window.inner_size().into(),
            depth_range: 0.0..=1.0,
        };

        let command_buffer_allocator =
            StandardCommandBufferAllocator::new(device.clone(), Default::default());

        let frames_in_flight = images.len();

        let plane_renderer = PlaneRenderer::new(
            device.clone(),
            memory_allocator.clone(),
            &command_buffer_allocator,
            queue.clone(),
            &images,
            viewport.clone(),
            plane_count,
        )?;

        Ok(RenderCoordinator {
            device,
            swapchain,
            viewport,
            memory_allocator,
            command_buffer_allocator,
            queue,
            window_resized: true,
            dimensions: window.inner_size(),
            need_swapchain_recreation: true,
            fences: vec![None; frames_in_flight],
            previous_fence_i: 0,
            render_data: Default::default(),
            plane_renderer,
        })
    }

    pub fn window_resized(&mut self, new_size: PhysicalSize<u32>) {
        self.window_resized = true;
        self.dimensions = new_size;
    }

    pub fn set_camera_params(&mut self, cam_matrices: (Matrix4<f32>, Matrix4<f32>)) {
        self.render_data.update_cam_matrices(cam_matrices);
    }

    pub fn set_world_viewport(&mut self, viewport: WorldViewport) {
        self.render_data.update_viewport(viewport);
    }

    pub fn set_planes(&mut self, planes: &[PlaneInstance]) {
        self.render_data.set_planes(planes);
    }

    /// Push a freshly decoded image to the GPU and point its plane at it.
    pub fn upload_texture(&mut self, index: usize, image: &RgbaImage) -> anyhow::Result<()> {
        let view = texture::upload(
            self.memory_allocator.clone(),
            &self.command_buffer_allocator,
            self.queue.clone(),
            image,
        )
        .context("uploading plane texture")?;

        self.plane_renderer
            .set_texture(index, view, [image.width() as f32, image.height() as f32]);

        Ok(())
    }

    pub fn draw(&mut self) -> anyhow::Result<()> {
        let is_zero_sized_window = self.dimensions.height == 0 || self.dimensions.width == 0;

        if (self.window_resized || self.need_swapchain_recreation) && !is_zero_sized_window {
            self.resize_swapchain()?;
        }

        let acquire_image = span!(Level::INFO, "acquiring swapchain image").entered();
        let (image_i, suboptimal, acquire_future) =
            match swapchain::acquire_next_image(self.swapchain.clone(), None)
                .map_err(Validated::unwrap)
            {
                Ok(r) => r,
                Err(VulkanError::OutOfDate) => {
                    self.need_swapchain_recreation = true;
                    return Ok(());
                }
                Err(e) => bail!("failed to acquire next image: {e}"),
            };

        if suboptimal {
            self.need_swapchain_recreation = true;
        }
        acquire_image.exit();

        let fence_wait = span!(Level::INFO, "awaiting fence").entered();
        // If the current fence is a thing, wait on it, otherwise silently do nothing
        if let Some(image_fence) = &self.fences[image_i as usize] {
            image_fence.wait(None)?;
        }

        let previous_future = match self.fences[self.previous_fence_i as usize].clone() {
            None => {
                let mut now = sync::now(self.device.clone());
                now.cleanup_finished();
                now.boxed()
            }
            Some(fence) => fence.boxed(),
        };
        fence_wait.exit();

        let mut builder = AutoCommandBufferBuilder::primary(
            &self.command_buffer_allocator,
            self.queue.queue_family_index(),
            CommandBufferUsage::MultipleSubmit,
        )?;

        self.plane_renderer
            .record_command_buffer(image_i as usize, &mut builder, &self.render_data)?;

        let command_buffer = builder.build().context("Building Command Buffer")?;

        let present = span!(Level::INFO, "present").entered();
        let future = previous_future
            .join(acquire_future)
            .then_execute(self.queue.clone(), command_buffer)?
            .then_swapchain_present(
                self.queue.clone(),
                SwapchainPresentInfo::swapchain_image_index(self.swapchain.clone(), image_i),
            )
            .then_signal_fence_and_flush();
        present.exit();

        self.fences[image_i as usize] = match future.map_err(Validated::unwrap) {
            #[allow(clippy::arc_with_non_send_sync)]
            Ok(value) => Some(Arc::new(value)),
            Err(VulkanError::OutOfDate) => {
                self.need_swapchain_recreation = true;
                None
            }
            Err(e) => {
                error!("failed to flush future: {:#?}", e);
                None
            }
        };

        self.previous_fence_i = image_i;
        Ok(())
    }

    fn resize_swapchain(&mut self) -> anyhow::Result<()> {
        let _resize_swapchain = span!(Level::INFO, "resizing swapchain").entered();
        event!(Level::INFO, "recreating swapchain");
        self.need_swapchain_recreation = false;

        let (new_swapchain, new_images) = self
            .swapchain
            .recreate(SwapchainCreateInfo {
                image_extent: self.dimensions.into(),
                ..self.swapchain.create_info()
            })
            .context("failed to recreate swapchain")?;

        self.swapchain = new_swapchain;

        if self.window_resized {
            self.viewport.extent = self.dimensions.into();
        }

        let result = self
            .plane_renderer
            .resize(&new_images, self.viewport.clone());

        self.window_resized = false;
        result
    }
}
