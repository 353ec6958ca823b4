use super::RecordStore;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Records kept in memory only, for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let records = self
            .inner
            .read()
            .map_err(|_| anyhow::anyhow!("Memory store lock poisoned"))?;
        Ok(records.get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut records = self
            .inner
            .write()
            .map_err(|_| anyhow::anyhow!("Memory store lock poisoned"))?;
        records.insert(key.to_string(), value.to_vec());
        debug!(key, bytes = value.len(), "Record written");
        Ok(())
    }
}
