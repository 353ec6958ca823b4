pub mod disk;
pub mod memory;
pub mod records;

use anyhow::Result;

/// Key/value storage for the serialized ledger records.
pub trait RecordStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn write(&self, key: &str, value: &[u8]) -> Result<()>;
}

pub use disk::DiskStore;
pub use memory::MemoryStore;
