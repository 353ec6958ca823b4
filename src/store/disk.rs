use super::RecordStore;
use anyhow::{Context, Result};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "records";

/// Records kept in a fjall keyspace on disk. Every write is synced before
/// returning.
pub struct DiskStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;
        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open ledger at {}", path.display()))?;
        let partition = keyspace
            .open_partition(PARTITION, PartitionCreateOptions::default())
            .context("Failed to open records partition")?;
        debug!("Opened ledger store at {}", path.display());
        Ok(Self {
            keyspace,
            partition,
        })
    }
}

impl RecordStore for DiskStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .partition
            .get(key)
            .with_context(|| format!("Failed to read record {key}"))?;
        Ok(value.map(|v| v.to_vec()))
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        self.partition
            .insert(key.as_bytes(), value)
            .with_context(|| format!("Failed to write record {key}"))?;
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to sync ledger store")?;
        debug!(key, bytes = value.len(), "Record written");
        Ok(())
    }
}
