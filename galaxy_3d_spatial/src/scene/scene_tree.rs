/// SceneTree — one generation of the scene-level BVH.
///
/// A flat node arena built from scratch with a binned surface-area
/// heuristic. Each leaf holds exactly one entity key and that entity's
/// world AABB at build time; internal nodes hold two child indices and the
/// union of their bounds. A built tree is never mutated while shared: the
/// owning `SceneBvh` only rebuilds an arena once no reader can see it.

use glam::{Mat4, Vec3};
use crate::camera::{aabb_overlaps_view_rect, Frustum, FrustumTest};
use crate::math::{intersect_box_aabb, AABB};
use super::entity::EntityKey;
use super::scene::Scene;
use super::scene_index::SceneIndex;

/// Number of centroid bins evaluated per split.
pub const SAH_BIN_COUNT: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneBvhNodeKind {
    /// One entity
    Leaf(EntityKey),
    /// Indices of the two children in the node array
    Internal { left: u32, right: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBvhNode {
    pub aabb: AABB,
    pub kind: SceneBvhNodeKind,
}

/// An entity whose world AABB is crossed by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneRayHit {
    /// Entry distance into the entity's AABB (0 if the origin is inside)
    pub distance: f32,
    pub entity: EntityKey,
}

struct Candidate {
    key: EntityKey,
    aabb: AABB,
    centroid: Vec3,
}

#[derive(Debug, Clone, Copy, Default)]
struct Bin {
    aabb: AABB,
    count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SceneTree {
    nodes: Vec<SceneBvhNode>,
    root: Option<u32>,
    generation: u64,
}

impl SceneTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree over every eligible entity of `scene`.
    pub fn build(scene: &Scene) -> Self {
        let mut tree = Self::new();
        tree.rebuild(scene);
        tree
    }

    /// Build a tree over explicit `(key, world AABB)` pairs. Empty or
    /// non-finite boxes are skipped.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (EntityKey, AABB)>,
    {
        let mut tree = Self::new();
        tree.build_from(entries.into_iter().filter_map(|(key, aabb)| candidate(key, aabb)).collect());
        tree
    }

    /// Rebuild this arena in place from the current state of `scene`.
    ///
    /// Candidates are enabled, renderable entities with a non-empty mesh;
    /// their world AABB is the mesh-local AABB pushed through the world
    /// matrix (all 8 corners).
    pub fn rebuild(&mut self, scene: &Scene) {
        let candidates = scene
            .entities()
            .filter_map(|(key, entity)| candidate(key, entity.world_aabb()?))
            .collect();
        self.build_from(candidates);
    }

    /// Drop every node, keeping the allocation.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    fn build_from(&mut self, mut candidates: Vec<Candidate>) {
        self.clear();
        if candidates.is_empty() {
            return;
        }
        self.nodes.reserve(2 * candidates.len() - 1);

        // Pending (first, end, node slot) ranges; siblings are adjacent
        let mut work: Vec<(usize, usize, usize)> = Vec::with_capacity(64);
        self.nodes.push(placeholder());
        work.push((0, candidates.len(), 0));

        while let Some((first, end, slot)) = work.pop() {
            let range = &mut candidates[first..end];

            if let [single] = &*range {
                self.nodes[slot] = SceneBvhNode {
                    aabb: single.aabb,
                    kind: SceneBvhNodeKind::Leaf(single.key),
                };
                continue;
            }

            let aabb = range.iter().fold(AABB::empty(), |acc, c| acc.expanded(&c.aabb));
            let mid = first + sah_partition(range);

            let left = self.nodes.len();
            self.nodes.push(placeholder());
            self.nodes.push(placeholder());
            let right = left + 1;

            self.nodes[slot] = SceneBvhNode {
                aabb,
                kind: SceneBvhNodeKind::Internal { left: left as u32, right: right as u32 },
            };
            work.push((mid, end, right));
            work.push((first, mid, left));
        }

        self.root = Some(0);
    }

    // ===== ACCESSORS =====

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<u32> {
        self.root
    }

    pub fn nodes(&self) -> &[SceneBvhNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, SceneBvhNodeKind::Leaf(_)))
            .count()
    }

    /// Swap counter value this tree was published under (0 = never published).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    // ===== QUERIES =====

    /// Every leaf whose AABB the ray enters within `max_length`, nearest
    /// entry first. `dir` is normalized, so distances are world units.
    pub fn raycast(&self, origin: Vec3, dir: Vec3, max_length: f32) -> Vec<SceneRayHit> {
        let mut hits = Vec::new();
        let Some(root) = self.root else {
            return hits;
        };
        let dir = dir.normalize_or_zero();
        if dir == Vec3::ZERO || max_length.is_nan() || max_length < 0.0 {
            return hits;
        }

        let mut stack: Vec<u32> = Vec::with_capacity(64);
        stack.push(root);

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            let Some(distance) = intersect_box_aabb(origin, dir, node.aabb.min, node.aabb.max, max_length) else {
                continue;
            };
            match node.kind {
                SceneBvhNodeKind::Leaf(entity) => hits.push(SceneRayHit { distance, entity }),
                SceneBvhNodeKind::Internal { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// Visit every node, leaves and internals alike.
    pub fn traverse<F: FnMut(&SceneBvhNode)>(&self, mut callback: F) {
        for node in &self.nodes {
            callback(node);
        }
    }

    fn collect_leaves(&self, index: u32, results: &mut Vec<EntityKey>) {
        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            match self.nodes[i as usize].kind {
                SceneBvhNodeKind::Leaf(key) => results.push(key),
                SceneBvhNodeKind::Internal { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
    }
}

impl SceneIndex for SceneTree {
    fn query_frustum(&self, frustum: &Frustum, results: &mut Vec<EntityKey>) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            match frustum.classify_aabb(&node.aabb) {
                FrustumTest::Outside => {}
                FrustumTest::Inside => self.collect_leaves(index, results),
                FrustumTest::Partial => match node.kind {
                    SceneBvhNodeKind::Leaf(key) => results.push(key),
                    SceneBvhNodeKind::Internal { left, right } => {
                        stack.push(right);
                        stack.push(left);
                    }
                },
            }
        }
    }

    fn query_view_rect(&self, view_projection: &Mat4, results: &mut Vec<EntityKey>) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if !aabb_overlaps_view_rect(&node.aabb, view_projection) {
                continue;
            }
            match node.kind {
                SceneBvhNodeKind::Leaf(key) => results.push(key),
                SceneBvhNodeKind::Internal { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
    }

    fn root_aabb(&self) -> AABB {
        self.root.map_or_else(AABB::empty, |r| self.nodes[r as usize].aabb)
    }
}

fn candidate(key: EntityKey, aabb: AABB) -> Option<Candidate> {
    if aabb.is_empty() || !aabb.min.is_finite() || !aabb.max.is_finite() {
        return None;
    }
    Some(Candidate { key, aabb, centroid: aabb.center() })
}

fn placeholder() -> SceneBvhNode {
    SceneBvhNode {
        aabb: AABB::empty(),
        kind: SceneBvhNodeKind::Internal { left: 0, right: 0 },
    }
}

/// Reorder `candidates` around the cheapest binned SAH boundary and return
/// the split index, always in `1..len`.
fn sah_partition(candidates: &mut [Candidate]) -> usize {
    let centroid_bounds = AABB::from_points(candidates.iter().map(|c| c.centroid));
    let axis = centroid_bounds.longest_axis();
    let low = centroid_bounds.min[axis];
    let extent = centroid_bounds.max[axis] - low;

    // All centroids coincide on every axis
    if extent <= 0.0 {
        return median_split(candidates, axis);
    }

    let scale = SAH_BIN_COUNT as f32 / extent;
    let bin_of = |c: &Candidate| (((c.centroid[axis] - low) * scale) as usize).min(SAH_BIN_COUNT - 1);

    let mut bins = [Bin::default(); SAH_BIN_COUNT];
    for c in candidates.iter() {
        let bin = &mut bins[bin_of(c)];
        bin.count += 1;
        bin.aabb.expand(&c.aabb);
    }

    // Left sweep: bounds and count of bins[0..=b] for each boundary b
    let mut left_area = [0.0f32; SAH_BIN_COUNT - 1];
    let mut left_count = [0usize; SAH_BIN_COUNT - 1];
    let mut bounds = AABB::empty();
    let mut count = 0;
    for b in 0..SAH_BIN_COUNT - 1 {
        bounds.expand(&bins[b].aabb);
        count += bins[b].count;
        left_area[b] = bounds.surface_area();
        left_count[b] = count;
    }

    // Right sweep, evaluating cost at each boundary
    let mut best: Option<(usize, f32)> = None;
    bounds = AABB::empty();
    count = 0;
    for b in (0..SAH_BIN_COUNT - 1).rev() {
        bounds.expand(&bins[b + 1].aabb);
        count += bins[b + 1].count;
        if left_count[b] == 0 || count == 0 {
            continue;
        }
        let cost = left_count[b] as f32 * left_area[b] + count as f32 * bounds.surface_area();
        if best.map_or(true, |(_, best_cost)| cost < best_cost) {
            best = Some((b, cost));
        }
    }

    let Some((boundary, _)) = best else {
        return median_split(candidates, axis);
    };

    let mid = partition_in_place(candidates, |c| bin_of(c) <= boundary);
    if mid == 0 || mid == candidates.len() {
        median_split(candidates, axis)
    } else {
        mid
    }
}

fn median_split(candidates: &mut [Candidate], axis: usize) -> usize {
    let mid = candidates.len() / 2;
    candidates.select_nth_unstable_by(mid, |a, b| a.centroid[axis].total_cmp(&b.centroid[axis]));
    mid
}

fn partition_in_place<T>(items: &mut [T], keep_left: impl Fn(&T) -> bool) -> usize {
    let mut split = 0;
    for i in 0..items.len() {
        if keep_left(&items[i]) {
            items.swap(split, i);
            split += 1;
        }
    }
    split
}

#[cfg(test)]
#[path = "scene_tree_tests.rs"]
mod tests;
