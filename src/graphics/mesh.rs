use std::sync::Arc;

use anyhow::Context;
use vulkano::{
    buffer::{Buffer, BufferCreateInfo, BufferUsage, Subbuffer},
    memory::allocator::{AllocationCreateInfo, MemoryAllocator, MemoryTypeFilter},
};

use super::shaders::PlaneVertex;

/// Builds the unit quad every plane shares. The quad is subdivided along
/// its width because the distortion is a vertex effect and needs vertices
/// to bend.
pub struct MeshBuilder {
    columns: u32,
    rows: u32,
}

impl Default for MeshBuilder {
    fn default() -> Self {
        MeshBuilder {
            columns: 1,
            rows: 1,
        }
    }
}

impl MeshBuilder {
    pub fn with_segments(mut self, columns: u32, rows: u32) -> Self {
        self.columns = columns.max(1);
        self.rows = rows.max(1);
        self
    }

    pub fn build(self, memory_allocator: Arc<dyn MemoryAllocator>) -> anyhow::Result<PlaneMesh> {
        let (vertices, indices) = grid(self.columns, self.rows);

        let vertex_buffer = Buffer::from_iter(
            memory_allocator.clone(),
            BufferCreateInfo {
                usage: BufferUsage::VERTEX_BUFFER,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::PREFER_DEVICE
                    | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
                ..Default::default()
            },
            vertices,
        )
        .context("creating vertex buffer")?;

        let index_buffer = Buffer::from_iter(
            memory_allocator,
            BufferCreateInfo {
                usage: BufferUsage::INDEX_BUFFER,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::PREFER_DEVICE
                    | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
                ..Default::default()
            },
            indices,
        )
        .context("creating index buffer")?;

        Ok(PlaneMesh {
            vertex_buffer,
            index_buffer,
        })
    }
}

pub struct PlaneMesh {
    pub vertex_buffer: Subbuffer<[PlaneVertex]>,
    pub index_buffer: Subbuffer<[u16]>,
}

/// Unit quad centered on the origin, positions in [-0.5, 0.5]. Texture v
/// grows downward so decoded images sample top row first.
fn grid(columns: u32, rows: u32) -> (Vec<PlaneVertex>, Vec<u16>) {
    let mut vertices = Vec::with_capacity(((columns + 1) * (rows + 1)) as usize);
    for row in 0..=rows {
        for column in 0..=columns {
            let u = column as f32 / columns as f32;
            let v = row as f32 / rows as f32;
            vertices.push(PlaneVertex {
                position: [u - 0.5, v - 0.5],
                uv: [u, 1.0 - v],
            });
        }
    }

    let stride = columns + 1;
    let mut indices = Vec::with_capacity((columns * rows * 6) as usize);
    for row in 0..rows {
        for column in 0..columns {
            let a = (row * stride + column) as u16;
            let b = a + 1;
            let c = a + stride as u16;
            let d = c + 1;
            indices.extend_from_slice(&[a, b, c, b, d, c]);
        }
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_counts_match_segments() {
        let (vertices, indices) = grid(100, 1);
        assert_eq!(vertices.len(), 101 * 2);
        assert_eq!(indices.len(), 100 * 6);
    }

    #[test]
    fn grid_spans_unit_quad() {
        let (vertices, _) = grid(4, 2);

        let min_x = vertices.iter().map(|v| v.position[0]).fold(f32::MAX, f32::min);
        let max_x = vertices.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
        assert_eq!((min_x, max_x), (-0.5, 0.5));

        assert!(vertices.iter().all(|v| (0.0..=1.0).contains(&v.uv[0])));
        assert!(vertices.iter().all(|v| (0.0..=1.0).contains(&v.uv[1])));
    }

    #[test]
    fn grid_indices_stay_in_range() {
        let (vertices, indices) = grid(100, 1);
        let count = vertices.len() as u16;
        assert!(indices.iter().all(|&i| i < count));
    }
}
