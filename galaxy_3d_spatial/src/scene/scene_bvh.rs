/// SceneBvh — double-buffered, concurrently queried scene hierarchy.
///
/// Holds two `SceneTree` arenas: the *current* one, published behind an
/// `Arc` and read by any number of threads, and the *building* one, owned
/// by the single in-flight rebuild. A rebuild fills the building arena on a
/// worker, publishes it with one pointer swap, then waits until no snapshot
/// still references the previous tree before taking that arena back as the
/// next building tree. Readers never block on a rebuild.
///
/// Waits in this type are unbounded: a caller that keeps a snapshot alive
/// stalls the next swap (and `clear`) until it lets go. Do not call
/// `update`, `rebuild_now` or `clear` while holding a snapshot of the same
/// hierarchy. The worker holds the scene's read lock only while building,
/// never while waiting for readers.
///
/// # Example
///
/// ```ignore
/// let pool = Arc::new(WorkerPool::new(1)?);
/// let bvh = SceneBvh::new(pool)?;
/// bvh.update(&scene)?;   // async rebuild + swap
/// let hits = bvh.raycast(origin, dir, 100.0);
/// ```

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use glam::{Mat4, Vec3};
use parking_lot::{Condvar, Mutex, RwLock};
use crate::camera::Frustum;
use crate::error::Result;
use crate::math::AABB;
use crate::utils::WorkerPool;
use crate::{engine_bail, engine_trace};
use super::entity::EntityKey;
use super::scene::Scene;
use super::scene_index::SceneIndex;
use super::scene_tree::{SceneBvhNode, SceneRayHit, SceneTree};

// ===== SHARED STATE =====

struct SceneBvhShared {
    /// Tree visible to readers
    current: RwLock<Arc<SceneTree>>,
    /// Arena reclaimed from the previous generation, reused by the next rebuild
    building: Mutex<Option<SceneTree>>,
    /// Outstanding snapshots
    readers: AtomicUsize,
    reader_lock: Mutex<()>,
    reader_released: Condvar,
    /// True while a rebuild is queued or running
    rebuild_in_flight: Mutex<bool>,
    rebuild_done: Condvar,
    /// Last generation handed out
    generation: Mutex<u64>,
}

impl SceneBvhShared {
    fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(SceneTree::new())),
            building: Mutex::new(None),
            readers: AtomicUsize::new(0),
            reader_lock: Mutex::new(()),
            reader_released: Condvar::new(),
            rebuild_in_flight: Mutex::new(false),
            rebuild_done: Condvar::new(),
            generation: Mutex::new(0),
        }
    }

    fn snapshot(&self) -> SceneBvhSnapshot<'_> {
        self.readers.fetch_add(1, Ordering::SeqCst);
        let tree = Arc::clone(&self.current.read());
        SceneBvhSnapshot { shared: self, tree: Some(tree) }
    }

    fn release_reader(&self) {
        self.readers.fetch_sub(1, Ordering::SeqCst);
        // Taking the lock orders this notify after a waiter's check
        let _guard = self.reader_lock.lock();
        self.reader_released.notify_all();
    }

    /// Block until no other rebuild is in flight, then claim the slot.
    fn begin_rebuild(&self) {
        let mut in_flight = self.rebuild_in_flight.lock();
        while *in_flight {
            self.rebuild_done.wait(&mut in_flight);
        }
        *in_flight = true;
    }

    fn end_rebuild(&self) {
        *self.rebuild_in_flight.lock() = false;
        self.rebuild_done.notify_all();
    }

    fn wait_idle(&self) {
        let mut in_flight = self.rebuild_in_flight.lock();
        while *in_flight {
            self.rebuild_done.wait(&mut in_flight);
        }
    }

    fn take_building(&self) -> SceneTree {
        self.building.lock().take().unwrap_or_default()
    }

    /// Make `tree` current and reclaim the previous tree once unreferenced.
    fn publish(&self, mut tree: SceneTree) -> u64 {
        let generation = {
            let mut last = self.generation.lock();
            *last += 1;
            *last
        };
        tree.set_generation(generation);

        let previous = std::mem::replace(&mut *self.current.write(), Arc::new(tree));
        let mut reclaimed = self.wait_unreferenced(previous);
        reclaimed.clear();
        *self.building.lock() = Some(reclaimed);
        generation
    }

    /// Wait until `tree` is the last handle to its arena.
    fn wait_unreferenced(&self, mut tree: Arc<SceneTree>) -> SceneTree {
        let mut guard = self.reader_lock.lock();
        loop {
            match Arc::try_unwrap(tree) {
                Ok(owned) => return owned,
                Err(shared) => {
                    tree = shared;
                    self.reader_released.wait(&mut guard);
                }
            }
        }
    }

    /// Wait until the in-use counter drains to zero.
    fn wait_readers_drained(&self) {
        let mut guard = self.reader_lock.lock();
        while self.readers.load(Ordering::SeqCst) != 0 {
            self.reader_released.wait(&mut guard);
        }
    }

    /// Build from `scene` into the building arena.
    fn build(&self, scene: &Scene) -> SceneTree {
        let mut tree = self.take_building();
        tree.rebuild(scene);
        tree
    }

    fn publish_logged(&self, tree: SceneTree, start: Instant) {
        let (leaves, nodes) = (tree.leaf_count(), tree.node_count());
        let generation = self.publish(tree);

        engine_trace!("galaxy3d::SceneBvh",
            "Published generation {} ({} entities, {} nodes) in {:?}",
            generation, leaves, nodes, start.elapsed());
    }
}

/// Clears the in-flight flag however the rebuild ends (including a panic).
struct RebuildGuard<'a>(&'a SceneBvhShared);

impl Drop for RebuildGuard<'_> {
    fn drop(&mut self) {
        self.0.end_rebuild();
    }
}

// ===== SNAPSHOT =====

/// Read access to the tree that was current when the snapshot was taken.
///
/// Counted in `SceneBvh::readers_in_flight` until dropped. Derefs to
/// `SceneTree`.
pub struct SceneBvhSnapshot<'a> {
    shared: &'a SceneBvhShared,
    tree: Option<Arc<SceneTree>>,
}

impl Deref for SceneBvhSnapshot<'_> {
    type Target = SceneTree;

    fn deref(&self) -> &SceneTree {
        match &self.tree {
            Some(tree) => tree,
            None => unreachable!("snapshot tree is only taken in drop"),
        }
    }
}

impl Drop for SceneBvhSnapshot<'_> {
    fn drop(&mut self) {
        // Release the arena before signalling so a waiting swap can reclaim it
        drop(self.tree.take());
        self.shared.release_reader();
    }
}

// ===== SCENE BVH =====

pub struct SceneBvh {
    shared: Arc<SceneBvhShared>,
    pool: Arc<WorkerPool>,
}

impl SceneBvh {
    /// Create an empty hierarchy that rebuilds on `pool`.
    ///
    /// # Errors
    ///
    /// `WorkerUnavailable` if the pool is already shut down.
    pub fn new(pool: Arc<WorkerPool>) -> Result<Self> {
        if pool.is_shut_down() {
            engine_bail!("galaxy3d::SceneBvh", WorkerUnavailable,
                "Cannot create a scene BVH on a shut down worker pool");
        }
        Ok(Self {
            shared: Arc::new(SceneBvhShared::new()),
            pool,
        })
    }

    /// Queue a rebuild from `scene` and return.
    ///
    /// Blocks only while a previous rebuild is still in flight. The worker
    /// reads the scene under its read lock, builds into the spare arena and
    /// swaps it in; queries see the new tree from then on.
    ///
    /// # Errors
    ///
    /// `WorkerUnavailable` if the pool no longer accepts jobs.
    pub fn update(&self, scene: &Arc<RwLock<Scene>>) -> Result<()> {
        self.shared.begin_rebuild();

        let shared = Arc::clone(&self.shared);
        let scene = Arc::clone(scene);
        let submitted = self.pool.submit(move || {
            let _guard = RebuildGuard(&shared);
            let start = Instant::now();
            // The scene lock is released before the swap waits on readers
            let tree = shared.build(&scene.read());
            shared.publish_logged(tree, start);
        });

        if let Err(e) = submitted {
            self.shared.end_rebuild();
            return Err(e);
        }
        Ok(())
    }

    /// Rebuild and swap on the calling thread.
    pub fn rebuild_now(&self, scene: &Scene) {
        self.shared.begin_rebuild();
        let _guard = RebuildGuard(&self.shared);
        let start = Instant::now();
        let tree = self.shared.build(scene);
        self.shared.publish_logged(tree, start);
    }

    /// Publish an empty tree, then wait until no reader is left.
    pub fn clear(&self) {
        self.shared.begin_rebuild();
        let _guard = RebuildGuard(&self.shared);

        let previous = {
            let mut last = self.shared.generation.lock();
            *last += 1;
            let mut empty = SceneTree::new();
            empty.set_generation(*last);
            std::mem::replace(&mut *self.shared.current.write(), Arc::new(empty))
        };

        self.shared.wait_readers_drained();
        let mut reclaimed = self.shared.wait_unreferenced(previous);
        reclaimed.clear();
        *self.shared.building.lock() = Some(reclaimed);

        engine_trace!("galaxy3d::SceneBvh", "Cleared");
    }

    /// Block until no rebuild is queued or running.
    pub fn wait_idle(&self) {
        self.shared.wait_idle();
    }

    pub fn is_rebuilding(&self) -> bool {
        *self.shared.rebuild_in_flight.lock()
    }

    /// Generation of the current tree (0 before the first publish).
    pub fn generation(&self) -> u64 {
        self.shared.current.read().generation()
    }

    /// Number of snapshots currently alive.
    pub fn readers_in_flight(&self) -> usize {
        self.shared.readers.load(Ordering::SeqCst)
    }

    /// Pin the current tree for a sequence of queries.
    pub fn snapshot(&self) -> SceneBvhSnapshot<'_> {
        self.shared.snapshot()
    }

    /// See `SceneTree::raycast`.
    pub fn raycast(&self, origin: Vec3, dir: Vec3, max_length: f32) -> Vec<SceneRayHit> {
        self.snapshot().raycast(origin, dir, max_length)
    }

    /// Visit every node of the current tree.
    pub fn traverse<F: FnMut(&SceneBvhNode)>(&self, callback: F) {
        self.snapshot().traverse(callback);
    }
}

impl SceneIndex for SceneBvh {
    fn query_frustum(&self, frustum: &Frustum, results: &mut Vec<EntityKey>) {
        self.snapshot().query_frustum(frustum, results);
    }

    fn query_view_rect(&self, view_projection: &Mat4, results: &mut Vec<EntityKey>) {
        self.snapshot().query_view_rect(view_projection, results);
    }

    fn root_aabb(&self) -> AABB {
        self.snapshot().root_aabb()
    }
}

impl Drop for SceneBvh {
    fn drop(&mut self) {
        self.shared.wait_idle();
    }
}

#[cfg(test)]
#[path = "scene_bvh_tests.rs"]
mod tests;
