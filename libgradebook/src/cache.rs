//! In-memory snapshots of the fetched collections
//!
//! A cache holds the last collection stored into it. Storing replaces the
//! snapshot wholesale (last write wins) and bumps the generation counter.
//! Readers clone the `Arc`, never the items.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug)]
pub struct EntityCache<T> {
    snapshot: RwLock<Arc<Vec<T>>>,
    generation: AtomicU64,
}

impl<T> Default for EntityCache<T> {
    fn default() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Vec::new())),
            generation: AtomicU64::new(0),
        }
    }
}

impl<T> EntityCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot; empty until the first store
    pub async fn snapshot(&self) -> Arc<Vec<T>> {
        Arc::clone(&*self.snapshot.read().await)
    }

    /// Replace the snapshot and return the new generation
    pub async fn store(&self, items: Vec<T>) -> u64 {
        let mut guard = self.snapshot.write().await;
        *guard = Arc::new(items);
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Number of stores so far; 0 means never loaded
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_loaded(&self) -> bool {
        self.generation() > 0
    }

    pub async fn len(&self) -> usize {
        self.snapshot.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
