pub mod disk;
pub mod memory;

use crate::core::Holding;
use anyhow::Result;
use async_trait::async_trait;

pub use disk::DiskHoldingStore;
pub use memory::MemoryHoldingStore;

/// A stored record that no longer decodes into a [`Holding`].
#[derive(Debug)]
pub struct CorruptRecord {
    pub key: String,
    pub error: anyhow::Error,
}

/// Result of scanning every owner's holdings.
#[derive(Debug, Default)]
pub struct StoreScan {
    pub holdings: Vec<Holding>,
    pub corrupt: Vec<CorruptRecord>,
}

/// Persistence for holdings, partitioned by an opaque owner id.
///
/// Lists are ordered by holding id. Records that no longer decode into a
/// valid [`Holding`] are reported as errors rather than skipped, except by
/// [`HoldingStore::scan_all`] which returns them beside the good ones.
#[async_trait]
pub trait HoldingStore: Send + Sync {
    /// Saves a new holding, assigning it a fresh id.
    async fn insert(&self, holding: Holding) -> Result<Holding>;

    async fn get(&self, owner: &str, id: u64) -> Result<Option<Holding>>;

    async fn list(&self, owner: &str) -> Result<Vec<Holding>>;

    /// Every holding of every owner, for background jobs. One unreadable
    /// record does not hide the others.
    async fn scan_all(&self) -> Result<StoreScan>;

    /// Overwrites an existing holding. Fails if it does not exist.
    async fn update(&self, holding: &Holding) -> Result<()>;

    /// Returns whether a holding was removed.
    async fn delete(&self, owner: &str, id: u64) -> Result<bool>;
}
