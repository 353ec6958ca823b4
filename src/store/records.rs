//! Versioned JSON records for the catalog and the transaction list.
//!
//! A missing record loads as the default (built-in catalog, no
//! transactions). A record that fails to parse or validate is logged and
//! also replaced by the default.
use super::RecordStore;
use crate::core::catalog::{Tag, TagCatalog, TagGroup};
use crate::core::transaction::{Transaction, TransactionStore};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

pub const SCHEMA_VERSION: u32 = 1;
pub const CATALOG_KEY: &str = "catalog";
pub const TRANSACTIONS_KEY: &str = "transactions";

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogRecord {
    version: u32,
    groups: Vec<TagGroup>,
    tags: Vec<Tag>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TransactionsRecord {
    version: u32,
    transactions: Vec<Transaction>,
}

fn check_version(version: u32) -> Result<()> {
    if version != SCHEMA_VERSION {
        bail!("Unsupported record version {version}, expected {SCHEMA_VERSION}");
    }
    Ok(())
}

fn validate_catalog(catalog: &TagCatalog) -> Result<()> {
    let mut group_ids = HashSet::new();
    for group in &catalog.groups {
        if !group_ids.insert(group.id.as_str()) {
            bail!("Duplicate group id {}", group.id);
        }
    }
    let mut tag_ids = HashSet::new();
    for tag in &catalog.tags {
        if !tag_ids.insert(tag.id.as_str()) {
            bail!("Duplicate tag id {}", tag.id);
        }
        if !group_ids.contains(tag.group_id.as_str()) {
            bail!("Tag {} references missing group {}", tag.id, tag.group_id);
        }
    }
    Ok(())
}

fn validate_transactions(transactions: &[Transaction]) -> Result<()> {
    let mut ids = HashSet::new();
    for t in transactions {
        if !ids.insert(t.id.as_str()) {
            bail!("Duplicate transaction id {}", t.id);
        }
        if !t.amount.is_finite() || t.amount <= 0.0 {
            bail!("Transaction {} has invalid amount {}", t.id, t.amount);
        }
        if t
            .tag_weights
            .iter()
            .any(|tw| !tw.weight.is_finite() || !(0.0..=1.0).contains(&tw.weight))
        {
            bail!("Transaction {} has a weight outside 0..=1", t.id);
        }
    }
    Ok(())
}

pub fn parse_catalog(bytes: &[u8]) -> Result<TagCatalog> {
    let record: CatalogRecord =
        serde_json::from_slice(bytes).context("Failed to parse catalog record")?;
    check_version(record.version)?;
    let catalog = TagCatalog {
        groups: record.groups,
        tags: record.tags,
    };
    validate_catalog(&catalog)?;
    Ok(catalog)
}

pub fn parse_transactions(bytes: &[u8]) -> Result<Vec<Transaction>> {
    let record: TransactionsRecord =
        serde_json::from_slice(bytes).context("Failed to parse transactions record")?;
    check_version(record.version)?;
    validate_transactions(&record.transactions)?;
    Ok(record.transactions)
}

/// A loaded record. `discarded` carries the reason when stored bytes
/// existed but could not be used and `value` is the default instead.
#[derive(Debug)]
pub struct Loaded<T> {
    pub value: T,
    pub discarded: Option<String>,
}

fn load_or_default<T, F>(store: &dyn RecordStore, key: &str, parse: F) -> Result<Loaded<T>>
where
    T: Default,
    F: FnOnce(&[u8]) -> Result<T>,
{
    let Some(bytes) = store.read(key)? else {
        debug!(key, "Record missing, using default");
        return Ok(Loaded {
            value: T::default(),
            discarded: None,
        });
    };
    match parse(&bytes) {
        Ok(value) => Ok(Loaded {
            value,
            discarded: None,
        }),
        Err(e) => {
            let reason = format!("{e:#}");
            warn!(key, error = %reason, "Discarding unreadable record");
            Ok(Loaded {
                value: T::default(),
                discarded: Some(reason),
            })
        }
    }
}

/// Loads the catalog. Only a failing store is an error.
pub fn load_catalog(store: &dyn RecordStore) -> Result<Loaded<TagCatalog>> {
    load_or_default(store, CATALOG_KEY, parse_catalog)
}

/// Loads the transactions. Only a failing store is an error.
pub fn load_transactions(store: &dyn RecordStore) -> Result<Loaded<TransactionStore>> {
    load_or_default(store, TRANSACTIONS_KEY, |bytes| {
        parse_transactions(bytes).map(TransactionStore::new)
    })
}

pub fn save_catalog(store: &dyn RecordStore, catalog: &TagCatalog) -> Result<()> {
    let record = CatalogRecord {
        version: SCHEMA_VERSION,
        groups: catalog.groups.clone(),
        tags: catalog.tags.clone(),
    };
    store.write(CATALOG_KEY, &serde_json::to_vec(&record)?)
}

pub fn save_transactions(store: &dyn RecordStore, transactions: &TransactionStore) -> Result<()> {
    let record = TransactionsRecord {
        version: SCHEMA_VERSION,
        transactions: transactions.all().to_vec(),
    };
    store.write(TRANSACTIONS_KEY, &serde_json::to_vec(&record)?)
}
