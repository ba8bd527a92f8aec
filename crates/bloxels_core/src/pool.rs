//! # Mesh Pool
//!
//! Free list of chunk mesh buffers recycled on unload.
//!
//! A released mesh is cleared (keeping its vector capacity) and pushed on
//! the free list; the next meshing job pops it instead of allocating.
//! Push and pop take a `parking_lot::Mutex`, so worker threads and the
//! coordination thread can share one pool.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::mesh::ChunkMesh;

/// Pool counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Meshes allocated because the free list was empty.
    pub created: usize,
    /// Meshes handed out from the free list.
    pub reused: usize,
    /// Meshes returned and kept.
    pub recycled: usize,
    /// Meshes returned and dropped because the pool was full.
    pub dropped: usize,
    /// Meshes currently on the free list.
    pub free: usize,
}

/// Thread-safe recycled mesh buffers.
pub struct MeshPool {
    free_list: Mutex<Vec<ChunkMesh>>,
    capacity: usize,
    created: AtomicUsize,
    reused: AtomicUsize,
    recycled: AtomicUsize,
    dropped: AtomicUsize,
}

impl MeshPool {
    /// Creates a pool that keeps at most `capacity` idle meshes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            free_list: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
            created: AtomicUsize::new(0),
            reused: AtomicUsize::new(0),
            recycled: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
        }
    }

    /// Takes an empty mesh, reusing a recycled one when available.
    pub fn acquire(&self) -> ChunkMesh {
        if let Some(mesh) = self.free_list.lock().pop() {
            self.reused.fetch_add(1, Ordering::Relaxed);
            return mesh;
        }
        self.created.fetch_add(1, Ordering::Relaxed);
        ChunkMesh::new()
    }

    /// Returns a mesh to the pool.
    pub fn release(&self, mut mesh: ChunkMesh) {
        mesh.clear();
        let mut free_list = self.free_list.lock();
        if free_list.len() < self.capacity {
            free_list.push(mesh);
            self.recycled.fetch_add(1, Ordering::Relaxed);
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Maximum idle meshes kept.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Idle meshes on the free list.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_list.lock().len()
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.created.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            recycled: self.recycled.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            free: self.free_count(),
        }
    }
}

impl Default for MeshPool {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{FaceDirection, MeshSectionKey};
    use crate::registry::BlockTypeId;

    #[test]
    fn test_acquire_release_reuses() {
        let pool = MeshPool::new(4);

        let mut mesh = pool.acquire();
        mesh.section_mut(MeshSectionKey::new(BlockTypeId(1), FaceDirection::PosX))
            .push_quad([[0.0; 3]; 4], [1.0, 0.0, 0.0], 1, 1, true);
        pool.release(mesh);

        assert_eq!(pool.free_count(), 1);

        let reused = pool.acquire();
        assert!(reused.is_empty(), "recycled meshes come back cleared");

        let stats = pool.stats();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.reused, 1);
        assert_eq!(stats.recycled, 1);
        assert_eq!(stats.free, 0);
    }

    #[test]
    fn test_capacity_limit() {
        let pool = MeshPool::new(2);

        for _ in 0..5 {
            pool.release(ChunkMesh::new());
        }

        let stats = pool.stats();
        assert_eq!(stats.free, 2);
        assert_eq!(stats.recycled, 2);
        assert_eq!(stats.dropped, 3);
    }

    #[test]
    fn test_shared_between_threads() {
        let pool = std::sync::Arc::new(MeshPool::new(64));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = std::sync::Arc::clone(&pool);
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        let mesh = pool.acquire();
                        pool.release(mesh);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = pool.stats();
        assert_eq!(stats.created + stats.reused, 40);
        assert!(stats.free <= 4);
    }
}
