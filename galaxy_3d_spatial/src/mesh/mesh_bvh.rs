/// MeshBvh — static triangle hierarchy for one mesh.
///
/// Built once from the mesh geometry with a median split on the longest
/// centroid axis, then never mutated, so it can be shared across threads
/// without synchronization.
///
/// Nodes live in one flat array and refer to their children by index.
/// Leaves own a contiguous range of `triangle_indices`; at query time each
/// leaf is tested 8 triangles at a time through the `F32Lanes` batch test.

use glam::{Vec2, Vec3};
use crate::engine_debug;
use crate::engine_warn;
use crate::math::{
    barycentric, intersect_box_aabb, intersect_triangles_x8,
    DefaultLanes, F32Lanes, TrianglePacket, AABB, LANE_COUNT,
};
use super::geometry::MeshGeometry;

/// Default maximum number of triangles per leaf.
pub const DEFAULT_LEAF_SIZE: usize = 4;

/// Node payload: a triangle range (leaf) or two children (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshBvhNodeKind {
    /// `count` triangles starting at `first` in `MeshBvh::triangle_indices`
    Leaf { first: u32, count: u32 },
    /// Indices of the two children in the node array
    Internal { left: u32, right: u32 },
}

/// One node of the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBvhNode {
    /// Bounds of every triangle below this node
    pub aabb: AABB,
    pub kind: MeshBvhNodeKind,
}

/// A ray/mesh hit in mesh-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshRayHit {
    /// Distance along the normalized ray direction
    pub distance: f32,
    /// Triangle index (position in the index list / 3)
    pub triangle: u32,
    /// Barycentric weights of the hit for the triangle's three vertices
    pub barycentric: Vec3,
    /// Hit point
    pub point: Vec3,
    /// Interpolated vertex normal, or the face normal when the mesh has none
    pub normal: Vec3,
    /// Interpolated texture coordinate (zero when the mesh has none)
    pub uv: Vec2,
}

/// Per-triangle build input.
struct BuildTriangle {
    index: u32,
    centroid: Vec3,
    aabb: AABB,
}

/// Static triangle BVH.
#[derive(Debug, Clone, Default)]
pub struct MeshBvh {
    nodes: Vec<MeshBvhNode>,
    triangle_indices: Vec<u32>,
    root: Option<u32>,
}

impl MeshBvh {
    /// A tree with no root; every raycast misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build over every triangle of `geometry`.
    ///
    /// An empty index list or one whose length is not a multiple of three
    /// yields an empty tree and a warning. `leaf_size` below 1 is treated
    /// as 1.
    pub fn build(geometry: &MeshGeometry, leaf_size: usize) -> Self {
        let index_count = geometry.indices().len();
        if index_count == 0 {
            engine_warn!("galaxy3d::MeshBvh", "Mesh has no triangles, BVH left empty");
            return Self::empty();
        }
        if index_count % 3 != 0 {
            engine_warn!("galaxy3d::MeshBvh",
                "Index count {} is not a multiple of 3, BVH left empty", index_count);
            return Self::empty();
        }

        let mut triangles: Vec<BuildTriangle> = (0..geometry.triangle_count() as u32)
            .filter_map(|index| {
                let [a, b, c] = geometry.triangle_positions(index)?;
                Some(BuildTriangle {
                    index,
                    centroid: (a + b + c) / 3.0,
                    aabb: AABB::from_points([a, b, c]),
                })
            })
            .collect();

        let mut bvh = Self {
            nodes: Vec::with_capacity(2 * triangles.len()),
            triangle_indices: Vec::with_capacity(triangles.len()),
            root: None,
        };
        bvh.root = Some(bvh.build_recursive(&mut triangles, leaf_size.max(1)));

        engine_debug!("galaxy3d::MeshBvh", "Built {} nodes over {} triangles",
            bvh.nodes.len(), bvh.triangle_indices.len());

        bvh
    }

    fn build_recursive(&mut self, triangles: &mut [BuildTriangle], leaf_size: usize) -> u32 {
        let node_index = self.nodes.len() as u32;

        if triangles.len() <= leaf_size {
            let aabb = triangles.iter().fold(AABB::empty(), |acc, t| acc.expanded(&t.aabb));
            let first = self.triangle_indices.len() as u32;
            self.triangle_indices.extend(triangles.iter().map(|t| t.index));
            self.nodes.push(MeshBvhNode {
                aabb,
                kind: MeshBvhNodeKind::Leaf { first, count: triangles.len() as u32 },
            });
            return node_index;
        }

        let centroid_bounds = AABB::from_points(triangles.iter().map(|t| t.centroid));
        let axis = centroid_bounds.longest_axis();
        triangles.sort_unstable_by(|a, b| a.centroid[axis].total_cmp(&b.centroid[axis]));

        // Reserve the parent slot, children are patched in below
        self.nodes.push(MeshBvhNode {
            aabb: AABB::empty(),
            kind: MeshBvhNodeKind::Internal { left: 0, right: 0 },
        });

        let mid = triangles.len() / 2;
        let (left_half, right_half) = triangles.split_at_mut(mid);
        let left = self.build_recursive(left_half, leaf_size);
        let right = self.build_recursive(right_half, leaf_size);

        let aabb = self.nodes[left as usize].aabb.expanded(&self.nodes[right as usize].aabb);
        self.nodes[node_index as usize] = MeshBvhNode {
            aabb,
            kind: MeshBvhNodeKind::Internal { left, right },
        };
        node_index
    }

    // ===== ACCESSORS =====

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<u32> {
        self.root
    }

    /// Bounds of the whole mesh (empty box for an empty tree).
    pub fn root_aabb(&self) -> AABB {
        self.root.map_or_else(AABB::empty, |r| self.nodes[r as usize].aabb)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of triangles referenced by the leaves.
    pub fn triangle_count(&self) -> usize {
        self.triangle_indices.len()
    }

    pub fn nodes(&self) -> &[MeshBvhNode] {
        &self.nodes
    }

    /// Triangle indices held by a leaf (empty for internal nodes).
    pub fn leaf_triangles(&self, node: &MeshBvhNode) -> &[u32] {
        match node.kind {
            MeshBvhNodeKind::Leaf { first, count } => self
                .triangle_indices
                .get(first as usize..(first + count) as usize)
                .unwrap_or(&[]),
            MeshBvhNodeKind::Internal { .. } => &[],
        }
    }

    // ===== RAYCAST =====

    /// Every triangle hit by the ray within `max_length`, nearest first.
    ///
    /// `dir` is normalized first, so distances are in mesh-local units.
    /// `geometry` must be the geometry the tree was built from.
    pub fn raycast(
        &self,
        geometry: &MeshGeometry,
        origin: Vec3,
        dir: Vec3,
        max_length: f32,
    ) -> Vec<MeshRayHit> {
        self.raycast_with::<DefaultLanes>(geometry, origin, dir, max_length)
    }

    /// `raycast` with an explicit lane implementation.
    pub fn raycast_with<L: F32Lanes>(
        &self,
        geometry: &MeshGeometry,
        origin: Vec3,
        dir: Vec3,
        max_length: f32,
    ) -> Vec<MeshRayHit> {
        let mut hits = Vec::new();
        let Some(root) = self.root else {
            return hits;
        };
        let dir = dir.normalize_or_zero();
        if dir == Vec3::ZERO || !origin.is_finite() || max_length.is_nan() || max_length < 0.0 {
            return hits;
        }

        let mut stack: Vec<u32> = Vec::with_capacity(64);
        stack.push(root);

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if intersect_box_aabb(origin, dir, node.aabb.min, node.aabb.max, max_length).is_none() {
                continue;
            }

            match node.kind {
                MeshBvhNodeKind::Internal { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
                MeshBvhNodeKind::Leaf { .. } => {
                    for chunk in self.leaf_triangles(node).chunks(LANE_COUNT) {
                        self.intersect_chunk::<L>(geometry, chunk, origin, dir, max_length, &mut hits);
                    }
                }
            }
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn intersect_chunk<L: F32Lanes>(
        &self,
        geometry: &MeshGeometry,
        chunk: &[u32],
        origin: Vec3,
        dir: Vec3,
        max_length: f32,
        hits: &mut Vec<MeshRayHit>,
    ) {
        let mut lanes = [0u32; LANE_COUNT];
        let mut corners = [[Vec3::ZERO; 3]; LANE_COUNT];
        let mut len = 0;
        for &triangle in chunk {
            // Skip triangles the geometry cannot resolve
            if let Some(positions) = geometry.triangle_positions(triangle) {
                lanes[len] = triangle;
                corners[len] = positions;
                len += 1;
            }
        }
        if len == 0 {
            return;
        }

        let packet = TrianglePacket::<L>::from_triangles(&corners[..len]);
        let distances = intersect_triangles_x8(origin, dir, &packet);

        // Misses are +inf; padding lanes are masked off
        let t = L::from_array(distances);
        let in_range = t.lt(L::splat(f32::INFINITY)).and(t.le(L::splat(max_length)));
        let mut bits = in_range.mask_bits() & ((1u16 << len) - 1) as u8;

        while bits != 0 {
            let lane = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            hits.push(resolve_hit(geometry, lanes[lane], &corners[lane], origin, dir, distances[lane]));
        }
    }
}

/// Attribute interpolation for a confirmed hit.
fn resolve_hit(
    geometry: &MeshGeometry,
    triangle: u32,
    corners: &[Vec3; 3],
    origin: Vec3,
    dir: Vec3,
    distance: f32,
) -> MeshRayHit {
    let [a, b, c] = *corners;
    let point = origin + dir * distance;
    let weights = barycentric(point, a, b, c);
    let face_normal = (b - a).cross(c - a).normalize_or_zero();

    let vertices = geometry.triangle(triangle).map(|t| t.map(|v| v as usize));

    let normal = vertices
        .and_then(|[i0, i1, i2]| {
            Some(geometry.normal(i0)? * weights.x
                + geometry.normal(i1)? * weights.y
                + geometry.normal(i2)? * weights.z)
        })
        .map_or(face_normal, |n| n.try_normalize().unwrap_or(face_normal));

    let uv = vertices
        .and_then(|[i0, i1, i2]| {
            Some(geometry.uv(i0)? * weights.x
                + geometry.uv(i1)? * weights.y
                + geometry.uv(i2)? * weights.z)
        })
        .unwrap_or(Vec2::ZERO);

    MeshRayHit {
        distance,
        triangle,
        barycentric: weights,
        point,
        normal,
        uv,
    }
}

#[cfg(test)]
#[path = "mesh_bvh_tests.rs"]
mod tests;
