use crate::core::Holding;
use crate::store::{HoldingStore, StoreScan};
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::debug;

struct Inner {
    next_id: u64,
    holdings: BTreeMap<u64, Holding>,
}

/// In-memory holding store, used by tests and short-lived sessions.
pub struct MemoryHoldingStore {
    inner: Mutex<Inner>,
}

impl MemoryHoldingStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                holdings: BTreeMap::new(),
            }),
        }
    }
}

impl Default for MemoryHoldingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HoldingStore for MemoryHoldingStore {
    async fn insert(&self, mut holding: Holding) -> Result<Holding> {
        holding.validate()?;
        let mut inner = self.inner.lock().await;
        holding.id = inner.next_id;
        inner.next_id += 1;
        inner.holdings.insert(holding.id, holding.clone());
        debug!("Store INSERT holding {} ({})", holding.id, holding.ticker);
        Ok(holding)
    }

    async fn get(&self, owner: &str, id: u64) -> Result<Option<Holding>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .holdings
            .get(&id)
            .filter(|h| h.owner == owner)
            .cloned())
    }

    async fn list(&self, owner: &str) -> Result<Vec<Holding>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .holdings
            .values()
            .filter(|h| h.owner == owner)
            .cloned()
            .collect())
    }

    async fn scan_all(&self) -> Result<StoreScan> {
        let inner = self.inner.lock().await;
        Ok(StoreScan {
            holdings: inner.holdings.values().cloned().collect(),
            corrupt: Vec::new(),
        })
    }

    async fn update(&self, holding: &Holding) -> Result<()> {
        holding.validate()?;
        let mut inner = self.inner.lock().await;
        match inner.holdings.get_mut(&holding.id) {
            Some(existing) if existing.owner == holding.owner => {
                *existing = holding.clone();
                debug!("Store UPDATE holding {}", holding.id);
                Ok(())
            }
            _ => bail!("Holding {} not found", holding.id),
        }
    }

    async fn delete(&self, owner: &str, id: u64) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        if inner.holdings.get(&id).is_some_and(|h| h.owner == owner) {
            inner.holdings.remove(&id);
            debug!("Store DELETE holding {}", id);
            return Ok(true);
        }
        Ok(false)
    }
}
