use crate::core::Holding;
use crate::store::{CorruptRecord, HoldingStore, StoreScan};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

const HOLDINGS_PARTITION: &str = "holdings";
const META_PARTITION: &str = "meta";
const NEXT_ID_KEY: &str = "next_id";

/// Holding store persisted in a fjall keyspace.
///
/// Holdings are JSON values keyed by `{owner}/{id}` with the id zero padded
/// so keys sort in id order.
pub struct DiskHoldingStore {
    keyspace: Keyspace,
    holdings: PartitionHandle,
    meta: PartitionHandle,
    next_id: Mutex<u64>,
}

fn holding_key(owner: &str, id: u64) -> String {
    format!("{owner}/{id:020}")
}

fn decode(key: &[u8], value: &[u8]) -> Result<Holding> {
    serde_json::from_slice(value)
        .with_context(|| format!("Corrupt holding record: {}", String::from_utf8_lossy(key)))
}

impl DiskHoldingStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;
        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open holdings store at {}", path.display()))?;
        let holdings =
            keyspace.open_partition(HOLDINGS_PARTITION, PartitionCreateOptions::default())?;
        let meta = keyspace.open_partition(META_PARTITION, PartitionCreateOptions::default())?;

        let next_id = match meta.get(NEXT_ID_KEY)? {
            Some(bytes) => {
                let raw = <[u8; 8]>::try_from(&bytes[..])
                    .context("Corrupt next id in holdings store")?;
                u64::from_be_bytes(raw)
            }
            None => 1,
        };
        debug!("Opened holdings store at {} (next id {})", path.display(), next_id);

        Ok(Self {
            keyspace,
            holdings,
            meta,
            next_id: Mutex::new(next_id),
        })
    }

    fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to persist holdings store")
    }
}

#[async_trait]
impl HoldingStore for DiskHoldingStore {
    async fn insert(&self, mut holding: Holding) -> Result<Holding> {
        holding.validate()?;
        let mut next_id = self.next_id.lock().await;
        holding.id = *next_id;
        *next_id += 1;

        self.meta
            .insert(NEXT_ID_KEY.as_bytes(), &next_id.to_be_bytes()[..])?;
        let key = holding_key(&holding.owner, holding.id);
        self.holdings
            .insert(key.as_bytes(), serde_json::to_vec(&holding)?)?;
        self.persist()?;
        debug!("Store INSERT {}", key);
        Ok(holding)
    }

    async fn get(&self, owner: &str, id: u64) -> Result<Option<Holding>> {
        let key = holding_key(owner, id);
        self.holdings
            .get(&key)?
            .map(|value| decode(key.as_bytes(), &value))
            .transpose()
    }

    async fn list(&self, owner: &str) -> Result<Vec<Holding>> {
        let prefix = format!("{owner}/");
        let mut holdings = Vec::new();
        for entry in self.holdings.prefix(&prefix) {
            let (key, value) = entry?;
            let holding = decode(&key, &value)?;
            // "a/" is also a prefix of owner "a/b"
            if holding.owner == owner {
                holdings.push(holding);
            }
        }
        Ok(holdings)
    }

    async fn scan_all(&self) -> Result<StoreScan> {
        let mut scan = StoreScan::default();
        for entry in self.holdings.iter() {
            let (key, value) = entry?;
            match decode(&key, &value) {
                Ok(holding) => scan.holdings.push(holding),
                Err(error) => scan.corrupt.push(CorruptRecord {
                    key: String::from_utf8_lossy(&key).into_owned(),
                    error,
                }),
            }
        }
        scan.holdings.sort_by_key(|h| h.id);
        Ok(scan)
    }

    async fn update(&self, holding: &Holding) -> Result<()> {
        holding.validate()?;
        let key = holding_key(&holding.owner, holding.id);
        if !self.holdings.contains_key(&key)? {
            bail!("Holding {} not found", holding.id);
        }
        self.holdings
            .insert(key.as_bytes(), serde_json::to_vec(holding)?)?;
        self.persist()?;
        debug!("Store UPDATE {}", key);
        Ok(())
    }

    async fn delete(&self, owner: &str, id: u64) -> Result<bool> {
        let key = holding_key(owner, id);
        if !self.holdings.contains_key(&key)? {
            return Ok(false);
        }
        self.holdings.remove(key.as_bytes())?;
        self.persist()?;
        debug!("Store DELETE {}", key);
        Ok(true)
    }
}

#[cfg(test)]
impl DiskHoldingStore {
    /// Writes `holding` with `conviction` replaced, bypassing validation.
    pub(crate) fn put_with_conviction(&self, holding: &Holding, conviction: &str) -> Result<()> {
        let mut raw = serde_json::to_value(holding)?;
        raw["conviction"] = serde_json::Value::String(conviction.to_string());
        self.holdings.insert(
            holding_key(&holding.owner, holding.id).as_bytes(),
            serde_json::to_vec(&raw)?,
        )?;
        Ok(())
    }
}
