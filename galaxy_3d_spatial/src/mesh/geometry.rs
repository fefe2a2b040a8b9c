//! Raw mesh geometry as seen by the spatial subsystem.
//!
//! Vertex data stays in its interleaved byte form (whatever the asset loader
//! produced); a `VertexLayout` says where the position, normal and UV live
//! inside each vertex. Indices are a flat triangle list.

use glam::{Vec2, Vec3};
use crate::error::Result;
use crate::engine_bail;
use crate::math::AABB;

const POSITION_SIZE: usize = 12;
const NORMAL_SIZE: usize = 12;
const UV_SIZE: usize = 8;

// ============================================================================
// VERTEX LAYOUT
// ============================================================================

/// Byte layout of one interleaved vertex.
///
/// Positions and normals are three `f32`, UVs are two `f32`, all
/// little-endian as written by the GPU upload path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Size of one vertex in bytes
    pub stride: usize,
    /// Byte offset of the position
    pub position_offset: usize,
    /// Byte offset of the normal, if the vertex has one
    pub normal_offset: Option<usize>,
    /// Byte offset of the texture coordinate, if the vertex has one
    pub uv_offset: Option<usize>,
}

impl VertexLayout {
    /// Tightly packed positions (`stride = 12`).
    pub fn position_only() -> Self {
        Self {
            stride: POSITION_SIZE,
            position_offset: 0,
            normal_offset: None,
            uv_offset: None,
        }
    }

    /// Position, normal, UV interleaved (`stride = 32`).
    pub fn position_normal_uv() -> Self {
        Self {
            stride: POSITION_SIZE + NORMAL_SIZE + UV_SIZE,
            position_offset: 0,
            normal_offset: Some(POSITION_SIZE),
            uv_offset: Some(POSITION_SIZE + NORMAL_SIZE),
        }
    }

    /// Smallest stride that fits every declared attribute.
    pub fn min_stride(&self) -> usize {
        let position_end = self.position_offset + POSITION_SIZE;
        let normal_end = self.normal_offset.map_or(0, |o| o + NORMAL_SIZE);
        let uv_end = self.uv_offset.map_or(0, |o| o + UV_SIZE);
        position_end.max(normal_end).max(uv_end)
    }
}

// ============================================================================
// MESH GEOMETRY
// ============================================================================

/// Interleaved vertex bytes plus a flat triangle index list.
///
/// Construction validates the layout against the buffers, so attribute
/// reads for any in-range vertex index never go out of bounds. The index
/// count is NOT required to be a multiple of three here: the BVH build
/// reports and tolerates that case.
#[derive(Debug, Clone)]
pub struct MeshGeometry {
    vertices: Vec<u8>,
    indices: Vec<u32>,
    layout: VertexLayout,
    vertex_count: usize,
}

impl MeshGeometry {
    /// Wrap raw buffers.
    ///
    /// # Errors
    ///
    /// `InvalidGeometry` if the stride is smaller than the layout needs, the
    /// vertex buffer is not a whole number of vertices, or an index points
    /// past the last vertex.
    pub fn new(vertices: Vec<u8>, indices: Vec<u32>, layout: VertexLayout) -> Result<Self> {
        if layout.stride == 0 || layout.stride < layout.min_stride() {
            engine_bail!("galaxy3d::MeshGeometry", InvalidGeometry,
                "Vertex stride {} is smaller than the layout requires ({})",
                layout.stride, layout.min_stride());
        }
        if vertices.len() % layout.stride != 0 {
            engine_bail!("galaxy3d::MeshGeometry", InvalidGeometry,
                "Vertex buffer of {} bytes is not a multiple of stride {}",
                vertices.len(), layout.stride);
        }

        let vertex_count = vertices.len() / layout.stride;
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            engine_bail!("galaxy3d::MeshGeometry", InvalidGeometry,
                "Index {} out of range ({} vertices)", bad, vertex_count);
        }

        Ok(Self { vertices, indices, layout, vertex_count })
    }

    /// Geometry from a plain position array.
    pub fn from_positions(positions: &[Vec3], indices: Vec<u32>) -> Result<Self> {
        Self::new(
            bytemuck::cast_slice(positions).to_vec(),
            indices,
            VertexLayout::position_only(),
        )
    }

    /// Geometry from any `Pod` vertex struct described by `layout`.
    pub fn from_vertices<V: bytemuck::Pod>(
        vertices: &[V],
        indices: Vec<u32>,
        layout: VertexLayout,
    ) -> Result<Self> {
        Self::new(bytemuck::cast_slice(vertices).to_vec(), indices, layout)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of complete triangles in the index list.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        &self.vertices
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn has_normals(&self) -> bool {
        self.layout.normal_offset.is_some()
    }

    pub fn has_uvs(&self) -> bool {
        self.layout.uv_offset.is_some()
    }

    fn read<T: bytemuck::Pod>(&self, vertex: usize, offset: usize, size: usize) -> Option<T> {
        if vertex >= self.vertex_count {
            return None;
        }
        let start = vertex * self.layout.stride + offset;
        self.vertices.get(start..start + size).map(bytemuck::pod_read_unaligned)
    }

    /// Position of a vertex (`None` past the end).
    pub fn position(&self, vertex: usize) -> Option<Vec3> {
        self.read::<[f32; 3]>(vertex, self.layout.position_offset, POSITION_SIZE)
            .map(Vec3::from_array)
    }

    /// Normal of a vertex, if the layout has normals.
    pub fn normal(&self, vertex: usize) -> Option<Vec3> {
        let offset = self.layout.normal_offset?;
        self.read::<[f32; 3]>(vertex, offset, NORMAL_SIZE).map(Vec3::from_array)
    }

    /// Texture coordinate of a vertex, if the layout has UVs.
    pub fn uv(&self, vertex: usize) -> Option<Vec2> {
        let offset = self.layout.uv_offset?;
        self.read::<[f32; 2]>(vertex, offset, UV_SIZE).map(Vec2::from_array)
    }

    /// Vertex indices of triangle `triangle`.
    pub fn triangle(&self, triangle: u32) -> Option<[u32; 3]> {
        let base = triangle as usize * 3;
        let tri = self.indices.get(base..base + 3)?;
        Some([tri[0], tri[1], tri[2]])
    }

    /// Corner positions of triangle `triangle`.
    pub fn triangle_positions(&self, triangle: u32) -> Option<[Vec3; 3]> {
        let [i0, i1, i2] = self.triangle(triangle)?;
        Some([
            self.position(i0 as usize)?,
            self.position(i1 as usize)?,
            self.position(i2 as usize)?,
        ])
    }

    /// Bounding box of every vertex position (empty for no vertices).
    pub fn local_aabb(&self) -> AABB {
        AABB::from_points((0..self.vertex_count).filter_map(|v| self.position(v)))
    }
}
