use std::sync::Arc;

use anyhow::Context;
use image::RgbaImage;
use vulkano::{
    buffer::{Buffer, BufferCreateInfo, BufferUsage},
    command_buffer::{
        allocator::StandardCommandBufferAllocator, AutoCommandBufferBuilder, CommandBufferUsage,
        CopyBufferToImageInfo,
    },
    device::Queue,
    format::Format,
    image::{view::ImageView, Image, ImageCreateInfo, ImageType, ImageUsage},
    memory::allocator::{AllocationCreateInfo, MemoryTypeFilter, StandardMemoryAllocator},
    sync::{self, GpuFuture},
};

/// Upload a decoded image as a sampled texture. Blocks until the copy has
/// landed, uploads happen at most once per plane per session.
pub fn upload(
    memory_allocator: Arc<StandardMemoryAllocator>,
    command_buffer_allocator: &StandardCommandBufferAllocator,
    queue: Arc<Queue>,
    image: &RgbaImage,
) -> anyhow::Result<Arc<ImageView>> {
    from_rgba(
        memory_allocator,
        command_buffer_allocator,
        queue,
        [image.width(), image.height(), 1],
        image.as_raw().clone(),
    )
}

/// 1x1 near-black stand-in bound to every plane until its image decodes.
pub fn placeholder(
    memory_allocator: Arc<StandardMemoryAllocator>,
    command_buffer_allocator: &StandardCommandBufferAllocator,
    queue: Arc<Queue>,
) -> anyhow::Result<Arc<ImageView>> {
    from_rgba(
        memory_allocator,
        command_buffer_allocator,
        queue,
        [1, 1, 1],
        vec![24, 24, 28, 255],
    )
}

fn from_rgba(
    memory_allocator: Arc<StandardMemoryAllocator>,
    command_buffer_allocator: &StandardCommandBufferAllocator,
    queue: Arc<Queue>,
    extent: [u32; 3],
    pixels: Vec<u8>,
) -> anyhow::Result<Arc<ImageView>> {
    let staging = Buffer::from_iter(
        memory_allocator.clone(),
        BufferCreateInfo {
            usage: BufferUsage::TRANSFER_SRC,
            ..Default::default()
        },
        AllocationCreateInfo {
            memory_type_filter: MemoryTypeFilter::PREFER_HOST
                | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
            ..Default::default()
        },
        pixels,
    )
    .context("creating staging buffer")?;

    let image = Image::new(
        memory_allocator,
        ImageCreateInfo {
            image_type: ImageType::Dim2d,
            format: Format::R8G8B8A8_SRGB,
            extent,
            usage: ImageUsage::TRANSFER_DST | ImageUsage::SAMPLED,
            ..Default::default()
        },
        AllocationCreateInfo::default(),
    )
    .context("creating texture image")?;

    let mut builder = AutoCommandBufferBuilder::primary(
        command_buffer_allocator,
        queue.queue_family_index(),
        CommandBufferUsage::OneTimeSubmit,
    )
    .context("creating upload command buffer")?;

    builder.copy_buffer_to_image(CopyBufferToImageInfo::buffer_image(staging, image.clone()))?;

    let command_buffer = builder.build().context("building upload command buffer")?;

    sync::now(queue.device().clone())
        .then_execute(queue.clone(), command_buffer)?
        .then_signal_fence_and_flush()
        .context("flushing texture upload")?
        .wait(None)
        .context("awaiting texture upload")?;

    ImageView::new_default(image).context("creating texture view")
}
