//! Transactions and the in-memory transaction store.
use crate::core::allocation::TagWeight;
use anyhow::{Result, bail};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::debug;
use uuid::Uuid;

/// Description used when a transaction is saved without one.
pub const DEFAULT_DESCRIPTION: &str = "Daily expense";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[default]
    Expense,
    Income,
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Expense => write!(f, "expense"),
            TransactionKind::Income => write!(f, "income"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub amount: f64,
    pub description: String,
    pub date: DateTime<Utc>,
    pub tag_weights: Vec<TagWeight>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

impl Transaction {
    pub fn weight_of(&self, tag_id: &str) -> Option<f64> {
        self.tag_weights
            .iter()
            .find(|tw| tw.tag_id == tag_id)
            .map(|tw| tw.weight)
    }

    fn local_date<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.date.with_timezone(tz).date_naive()
    }
}

/// The user-editable part of a transaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionDraft {
    pub amount: f64,
    pub description: String,
    /// `None` means "now" on create and "keep the original date" on update.
    pub date: Option<DateTime<Utc>>,
    pub tag_weights: Vec<TagWeight>,
    pub kind: TransactionKind,
}

impl TransactionDraft {
    /// Rejects drafts that must never reach the store.
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            bail!("Amount must be greater than zero, got {}", self.amount);
        }
        if let Some(tw) = self
            .tag_weights
            .iter()
            .find(|tw| !tw.weight.is_finite() || !(0.0..=1.0).contains(&tw.weight))
        {
            bail!("Weight for tag {} must be between 0 and 1", tw.tag_id);
        }
        Ok(())
    }

    fn description_or_default(&self) -> String {
        let description = self.description.trim();
        if description.is_empty() {
            DEFAULT_DESCRIPTION.to_string()
        } else {
            description.to_string()
        }
    }
}

impl From<&Transaction> for TransactionDraft {
    fn from(t: &Transaction) -> Self {
        TransactionDraft {
            amount: t.amount,
            description: t.description.clone(),
            date: Some(t.date),
            tag_weights: t.tag_weights.clone(),
            kind: t.kind,
        }
    }
}

fn sorted_desc(mut transactions: Vec<&Transaction>) -> Vec<&Transaction> {
    transactions.sort_by(|a, b| b.date.cmp(&a.date));
    transactions
}

/// Transaction collection, newest insertion first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionStore {
    transactions: Vec<Transaction>,
}

impl TransactionStore {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn all(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    /// Stores a new transaction and returns its id. Callers validate the
    /// draft first.
    pub fn create(&mut self, draft: TransactionDraft) -> String {
        let id = Uuid::new_v4().to_string();
        let transaction = Transaction {
            id: id.clone(),
            amount: draft.amount,
            description: draft.description_or_default(),
            date: draft.date.unwrap_or_else(Utc::now),
            tag_weights: draft.tag_weights,
            kind: draft.kind,
        };
        self.transactions.insert(0, transaction);
        debug!(transaction_id = %id, "Created transaction");
        id
    }

    /// Replaces the transaction with `id`, keeping its id and, unless the
    /// draft carries one, its date. Returns `false` for unknown ids.
    pub fn update(&mut self, id: &str, draft: TransactionDraft) -> bool {
        let Some(existing) = self.transactions.iter_mut().find(|t| t.id == id) else {
            debug!(transaction_id = %id, "Update of unknown transaction ignored");
            return false;
        };
        existing.amount = draft.amount;
        existing.description = draft.description_or_default();
        if let Some(date) = draft.date {
            existing.date = date;
        }
        existing.tag_weights = draft.tag_weights;
        existing.kind = draft.kind;
        true
    }

    /// Removes the transaction with `id`. Returns `false` for unknown ids.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id != id);
        self.transactions.len() != before
    }

    /// Transactions dated within the calendar month in `tz`, newest first.
    pub fn filter_by_month<Tz: TimeZone>(&self, year: i32, month: u32, tz: &Tz) -> Vec<&Transaction> {
        sorted_desc(
            self.transactions
                .iter()
                .filter(|t| {
                    let date = t.local_date(tz);
                    date.year() == year && date.month() == month
                })
                .collect(),
        )
    }

    /// Transactions dated between `start` and `end` inclusive in `tz`,
    /// newest first.
    pub fn in_range<Tz: TimeZone>(&self, start: NaiveDate, end: NaiveDate, tz: &Tz) -> Vec<&Transaction> {
        sorted_desc(
            self.transactions
                .iter()
                .filter(|t| {
                    let date = t.local_date(tz);
                    date >= start && date <= end
                })
                .collect(),
        )
    }

    pub fn most_recent(&self, n: usize) -> Vec<&Transaction> {
        let mut recent = sorted_desc(self.transactions.iter().collect());
        recent.truncate(n);
        recent
    }

    pub fn month_total<Tz: TimeZone>(&self, year: i32, month: u32, tz: &Tz) -> f64 {
        self.filter_by_month(year, month, tz)
            .iter()
            .map(|t| t.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn draft(amount: f64, description: &str, date: &str) -> TransactionDraft {
        TransactionDraft {
            amount,
            description: description.to_string(),
            date: Some(at(date)),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_prepends_with_unique_ids() {
        let mut store = TransactionStore::default();
        let first = store.create(draft(10.0, "coffee", "2025-03-01T09:00:00Z"));
        let second = store.create(draft(20.0, "lunch", "2025-03-01T12:00:00Z"));
        assert_ne!(first, second);
        assert_eq!(store.len(), 2);
        assert_eq!(store.all()[0].id, second);
        assert_eq!(store.get(&first).unwrap().description, "coffee");
    }

    #[test]
    fn test_create_defaults_description_and_date() {
        let mut store = TransactionStore::default();
        let before = Utc::now();
        let id = store.create(TransactionDraft {
            amount: 5.0,
            description: "   ".to_string(),
            ..Default::default()
        });
        let t = store.get(&id).unwrap();
        assert_eq!(t.description, DEFAULT_DESCRIPTION);
        assert!(t.date >= before && t.date <= Utc::now() + Duration::seconds(1));
        assert_eq!(t.kind, TransactionKind::Expense);
    }

    #[test]
    fn test_update_preserves_id_and_date() {
        let mut store = TransactionStore::default();
        let id = store.create(draft(10.0, "coffee", "2025-03-01T09:00:00Z"));
        let updated = store.update(
            &id,
            TransactionDraft {
                amount: 12.5,
                description: "latte".to_string(),
                tag_weights: vec![TagWeight::new("t_food", 1.0)],
                ..Default::default()
            },
        );
        assert!(updated);
        let t = store.get(&id).unwrap();
        assert_eq!(t.amount, 12.5);
        assert_eq!(t.description, "latte");
        assert_eq!(t.date, at("2025-03-01T09:00:00Z"));
        assert_eq!(t.tag_weights.len(), 1);

        store.update(&id, draft(12.5, "latte", "2025-04-02T10:00:00Z"));
        assert_eq!(store.get(&id).unwrap().date, at("2025-04-02T10:00:00Z"));
    }

    #[test]
    fn test_update_and_delete_unknown_id_are_no_ops() {
        let mut store = TransactionStore::default();
        store.create(draft(10.0, "coffee", "2025-03-01T09:00:00Z"));
        let snapshot = store.clone();
        assert!(!store.update("missing", draft(1.0, "x", "2025-03-01T09:00:00Z")));
        assert!(!store.delete("missing"));
        assert_eq!(store, snapshot);
    }

    #[test]
    fn test_delete_removes() {
        let mut store = TransactionStore::default();
        let id = store.create(draft(10.0, "coffee", "2025-03-01T09:00:00Z"));
        assert!(store.delete(&id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_filter_by_month_sorted_desc() {
        let mut store = TransactionStore::default();
        store.create(draft(1.0, "mid", "2025-03-15T12:00:00Z"));
        store.create(draft(2.0, "early", "2025-03-01T00:00:00Z"));
        store.create(draft(3.0, "other month", "2025-04-01T00:00:00Z"));
        store.create(draft(4.0, "late", "2025-03-31T23:59:59Z"));

        let march: Vec<&str> = store
            .filter_by_month(2025, 3, &Utc)
            .iter()
            .map(|t| t.description.as_str())
            .collect();
        assert_eq!(march, vec!["late", "mid", "early"]);
        assert_eq!(store.month_total(2025, 3, &Utc), 7.0);
        assert!(store.filter_by_month(2024, 3, &Utc).is_empty());
    }

    #[test]
    fn test_filter_by_month_uses_timezone() {
        let mut store = TransactionStore::default();
        store.create(draft(1.0, "new year", "2025-03-31T20:00:00Z"));
        let shanghai = FixedOffset::east_opt(8 * 3600).unwrap();
        assert_eq!(store.filter_by_month(2025, 4, &shanghai).len(), 1);
        assert!(store.filter_by_month(2025, 4, &Utc).is_empty());
    }

    #[test]
    fn test_in_range_is_inclusive() {
        let mut store = TransactionStore::default();
        store.create(draft(1.0, "a", "2025-03-01T00:00:00Z"));
        store.create(draft(2.0, "b", "2025-03-10T23:59:00Z"));
        store.create(draft(3.0, "c", "2025-03-11T00:00:00Z"));
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let found: Vec<&str> = store
            .in_range(start, end, &Utc)
            .iter()
            .map(|t| t.description.as_str())
            .collect();
        assert_eq!(found, vec!["b", "a"]);
    }

    #[test]
    fn test_most_recent_by_date() {
        let mut store = TransactionStore::default();
        store.create(draft(1.0, "newest", "2025-05-01T00:00:00Z"));
        store.create(draft(2.0, "oldest", "2025-01-01T00:00:00Z"));
        store.create(draft(3.0, "middle", "2025-03-01T00:00:00Z"));
        let recent: Vec<&str> = store
            .most_recent(2)
            .iter()
            .map(|t| t.description.as_str())
            .collect();
        assert_eq!(recent, vec!["newest", "middle"]);
    }

    #[test]
    fn test_validate_rejects_bad_amounts_and_weights() {
        assert!(draft(0.0, "zero", "2025-03-01T00:00:00Z").validate().is_err());
        assert!(draft(-4.0, "neg", "2025-03-01T00:00:00Z").validate().is_err());
        assert!(draft(f64::NAN, "nan", "2025-03-01T00:00:00Z").validate().is_err());
        assert!(draft(0.01, "ok", "2025-03-01T00:00:00Z").validate().is_ok());

        let mut bad_weight = draft(1.0, "w", "2025-03-01T00:00:00Z");
        bad_weight.tag_weights = vec![TagWeight::new("t_me", 1.2)];
        assert!(bad_weight.validate().is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let t = Transaction {
            id: "1".to_string(),
            amount: 100.0,
            description: "rent".to_string(),
            date: at("2025-03-01T00:00:00Z"),
            tag_weights: vec![TagWeight::new("t_house", 1.0)],
            kind: TransactionKind::Expense,
        };
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["type"], "expense");
        assert_eq!(json["tagWeights"][0]["tagId"], "t_house");
        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }
}
