use std::sync::Arc;

use anyhow::Context;
use tracing::{span, Level};
use vulkano::{
    buffer::{
        allocator::{SubbufferAllocator, SubbufferAllocatorCreateInfo},
        BufferUsage, Subbuffer,
    },
    command_buffer::{
        allocator::StandardCommandBufferAllocator, AutoCommandBufferBuilder,
        PrimaryAutoCommandBuffer, RenderPassBeginInfo, SubpassBeginInfo, SubpassContents,
    },
    descriptor_set::{
        allocator::StandardDescriptorSetAllocator, PersistentDescriptorSet, WriteDescriptorSet,
    },
    device::{Device, Queue},
    image::{sampler::Sampler, view::ImageView, Image},
    memory::allocator::{MemoryTypeFilter, StandardMemoryAllocator},
    pipeline::{graphics::viewport::Viewport, GraphicsPipeline, Pipeline, PipelineBindPoint},
    render_pass::Framebuffer,
};

use super::{
    helpers,
    mesh::{MeshBuilder, PlaneMesh},
    render_data::RenderData,
    shaders::{self, vs::PlaneData},
    texture,
};

/// Width subdivisions of the shared quad; the twist is a vertex effect.
const PLANE_WIDTH_SEGMENTS: u32 = 100;

const CLEAR_COLOR: [f32; 4] = [0.04, 0.04, 0.05, 1.0];

#[derive(Clone)]
struct PlaneTexture {
    view: Arc<ImageView>,
    size: [f32; 2],
}

/// Draws the ring of image planes. Uniform buffers and descriptor sets are
/// allocated fresh each frame from a ring allocator, so late-arriving
/// textures simply show up on the next recorded frame.
pub struct PlaneRenderer {
    device: Arc<Device>,
    framebuffers: Vec<Arc<Framebuffer>>,
    pipeline: Arc<GraphicsPipeline>,
    uniform_buffer_allocator: SubbufferAllocator,
    descriptor_set_allocator: Arc<StandardDescriptorSetAllocator>,
    sampler: Arc<Sampler>,
    mesh: PlaneMesh,
    textures: Vec<PlaneTexture>,
    viewport: Viewport,
}

impl PlaneRenderer {
    pub fn new(
        device: Arc<Device>,
        memory_allocator: Arc<StandardMemoryAllocator>,
        command_buffer_allocator: &StandardCommandBufferAllocator,
        queue: Arc<Queue>,
        images: &[Arc<Image>],
        viewport: Viewport,
        plane_count: usize,
    ) -> anyhow::Result<Self> {
        let format = images[0].format();
        let render_pass = helpers::get_render_pass(device.clone(), format)?;

        let framebuffers = helpers::get_framebuffers(images, render_pass.clone())?;

        let vs = shaders::vs::load(device.clone()).context("failed to create shader module")?;
        let fs = shaders::fs::load(device.clone()).context("failed to create shader module")?;

        let pipeline = helpers::get_pipeline(device.clone(), vs, fs, render_pass)?;

        let uniform_buffer_allocator = SubbufferAllocator::new(
            memory_allocator.clone(),
            SubbufferAllocatorCreateInfo {
                buffer_usage: BufferUsage::UNIFORM_BUFFER,
                memory_type_filter: MemoryTypeFilter::PREFER_DEVICE
                    | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
                ..Default::default()
            },
        );

        let descriptor_set_allocator = Arc::new(StandardDescriptorSetAllocator::new(
            device.clone(),
            Default::default(),
        ));

        let sampler = helpers::get_sampler(device.clone())?;

        let mesh = MeshBuilder::default()
            .with_segments(PLANE_WIDTH_SEGMENTS, 1)
            .build(memory_allocator.clone())
            .context("building plane mesh")?;

        let placeholder =
            texture::placeholder(memory_allocator, command_buffer_allocator, queue)?;
        let textures = vec![
            PlaneTexture {
                view: placeholder,
                size: [0.0, 0.0],
            };
            plane_count
        ];

        Ok(PlaneRenderer {
            device,
            framebuffers,
            pipeline,
            uniform_buffer_allocator,
            descriptor_set_allocator,
            sampler,
            mesh,
            textures,
            viewport,
        })
    }

    /// Swap a plane's placeholder for its decoded image.
    pub fn set_texture(&mut self, index: usize, view: Arc<ImageView>, size: [f32; 2]) {
        if let Some(texture) = self.textures.get_mut(index) {
            texture.view = view;
            texture.size = size;
        }
    }

    pub fn resize(&mut self, images: &[Arc<Image>], viewport: Viewport) -> anyhow::Result<()> {
        let format = images[0].format();
        let render_pass = helpers::get_render_pass(self.device.clone(), format)?;

        self.framebuffers = helpers::get_framebuffers(images, render_pass)?;
        self.viewport = viewport;

        Ok(())
    }

    pub fn record_command_buffer(
        &self,
        frame_index: usize,
        builder: &mut AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>,
        render_data: &RenderData,
    ) -> anyhow::Result<()> {
        let _record = span!(Level::INFO, "record planes").entered();

        let (proj, view) = render_data.cam_matrices();
        let viewport_size = [render_data.viewport().width, render_data.viewport().height];

        builder
            .begin_render_pass(
                RenderPassBeginInfo {
                    clear_values: vec![Some(CLEAR_COLOR.into())],
                    ..RenderPassBeginInfo::framebuffer(self.framebuffers[frame_index].clone())
                },
                SubpassBeginInfo {
                    contents: SubpassContents::Inline,
                    ..Default::default()
                },
            )?
            .set_viewport(0, [self.viewport.clone()].into_iter().collect())?
            .bind_pipeline_graphics(self.pipeline.clone())?
            .bind_vertex_buffers(0, self.mesh.vertex_buffer.clone())?
            .bind_index_buffer(self.mesh.index_buffer.clone())?;

        for (instance, texture) in render_data.planes().iter().zip(self.textures.iter()) {
            let uniform_buffer: Subbuffer<PlaneData> =
                self.uniform_buffer_allocator.allocate_sized()?;

            *uniform_buffer.write()? = PlaneData {
                proj: proj.into(),
                view: view.into(),
                plane_size: instance.plane_size,
                image_size: texture.size,
                viewport_size,
                y: instance.y,
                twist: instance.twist,
                time: instance.time,
                velocity: instance.velocity,
            };

            let set = PersistentDescriptorSet::new(
                &self.descriptor_set_allocator,
                self.pipeline.layout().set_layouts()[0].clone(),
                [
                    WriteDescriptorSet::buffer(0, uniform_buffer),
                    WriteDescriptorSet::image_view_sampler(
                        1,
                        texture.view.clone(),
                        self.sampler.clone(),
                    ),
                ],
                [],
            )
            .context("creating plane descriptor set")?;

            builder
                .bind_descriptor_sets(
                    PipelineBindPoint::Graphics,
                    self.pipeline.layout().clone(),
                    0,
                    set,
                )?
                .draw_indexed(self.mesh.index_buffer.len() as u32, 1, 0, 0, 0)?;
        }

        builder.end_render_pass(Default::default())?;
        Ok(())
    }
}
