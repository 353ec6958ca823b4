//! Ledger domain logic: tags, weights, transactions and the views built
//! from them.

pub mod allocation;
pub mod analytics;
pub mod catalog;
pub mod config;
pub mod export;
pub mod insight;
pub mod ledger;
pub mod log;
pub mod transaction;

pub use catalog::TagCatalog;
pub use insight::{Insight, InsightProvider, InsightService};
pub use ledger::Ledger;
pub use transaction::{Transaction, TransactionDraft, TransactionStore};
