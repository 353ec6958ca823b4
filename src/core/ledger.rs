use crate::core::catalog::TagCatalog;
use crate::core::transaction::{TransactionDraft, TransactionStore};
use crate::store::{RecordStore, records};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// A stored record that could not be read and was replaced by its default.
/// The next mutation of that record overwrites the stored bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscardedRecord {
    pub key: &'static str,
    pub reason: String,
}

/// The tag catalog and transactions loaded from a [`RecordStore`]. Every
/// mutation rewrites the record it touched before returning.
pub struct Ledger {
    catalog: TagCatalog,
    transactions: TransactionStore,
    store: Arc<dyn RecordStore>,
    discarded: Vec<DiscardedRecord>,
}

impl Ledger {
    pub fn open(store: Arc<dyn RecordStore>) -> Result<Self> {
        let catalog = records::load_catalog(store.as_ref())?;
        let transactions = records::load_transactions(store.as_ref())?;
        let discarded = [
            (records::CATALOG_KEY, catalog.discarded),
            (records::TRANSACTIONS_KEY, transactions.discarded),
        ]
        .into_iter()
        .filter_map(|(key, reason)| reason.map(|reason| DiscardedRecord { key, reason }))
        .collect();
        let catalog = catalog.value;
        let transactions = transactions.value;
        debug!(
            groups = catalog.groups.len(),
            tags = catalog.tags.len(),
            transactions = transactions.len(),
            "Opened ledger"
        );
        Ok(Self {
            catalog,
            transactions,
            store,
            discarded,
        })
    }

    /// Records that were unreadable when the ledger was opened.
    pub fn discarded_records(&self) -> &[DiscardedRecord] {
        &self.discarded
    }

    pub fn catalog(&self) -> &TagCatalog {
        &self.catalog
    }

    pub fn transactions(&self) -> &TransactionStore {
        &self.transactions
    }

    fn save_catalog(&self) -> Result<()> {
        records::save_catalog(self.store.as_ref(), &self.catalog)
    }

    fn save_transactions(&self) -> Result<()> {
        records::save_transactions(self.store.as_ref(), &self.transactions)
    }

    pub fn add_transaction(&mut self, draft: TransactionDraft) -> Result<String> {
        draft.validate()?;
        let id = self.transactions.create(draft);
        self.save_transactions()?;
        info!(transaction_id = %id, "Transaction added");
        Ok(id)
    }

    /// Returns `Ok(false)` when no transaction has `id`.
    pub fn update_transaction(&mut self, id: &str, draft: TransactionDraft) -> Result<bool> {
        draft.validate()?;
        if !self.transactions.update(id, draft) {
            return Ok(false);
        }
        self.save_transactions()?;
        Ok(true)
    }

    pub fn delete_transaction(&mut self, id: &str) -> Result<bool> {
        if !self.transactions.delete(id) {
            return Ok(false);
        }
        self.save_transactions()?;
        info!(transaction_id = %id, "Transaction deleted");
        Ok(true)
    }

    pub fn add_group(&mut self, name: &str, is_single_select: bool, allow_weight: bool) -> Result<String> {
        let id = self.catalog.add_group(name, is_single_select, allow_weight)?;
        self.save_catalog()?;
        Ok(id)
    }

    /// Deletes the group and its tags. Transactions keep the removed tag
    /// ids and show them as unknown.
    pub fn delete_group(&mut self, id: &str) -> Result<bool> {
        if !self.catalog.delete_group(id) {
            return Ok(false);
        }
        self.save_catalog()?;
        Ok(true)
    }

    pub fn add_tag(&mut self, group_id: &str, name: &str, color: Option<&str>) -> Result<String> {
        let id = self.catalog.add_tag(group_id, name, color)?;
        self.save_catalog()?;
        Ok(id)
    }

    pub fn delete_tag(&mut self, id: &str) -> Result<bool> {
        if !self.catalog.delete_tag(id) {
            return Ok(false);
        }
        self.save_catalog()?;
        Ok(true)
    }
}
