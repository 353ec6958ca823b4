//! Weighted spending breakdowns by a chosen tag group.
use crate::core::catalog::TagCatalog;
use crate::core::transaction::Transaction;
use rust_decimal::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// Identifies a breakdown bucket. Buckets are keyed by tag id so that two
/// tags sharing a display name are reported separately.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum BucketKey {
    Tag(String),
    Uncategorized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownEntry {
    pub key: BucketKey,
    pub label: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Breakdown {
    pub entries: Vec<BreakdownEntry>,
    pub total: f64,
}

impl Breakdown {
    /// Share of the total for an entry, in percent.
    pub fn share(&self, entry: &BreakdownEntry) -> f64 {
        if self.total > 0.0 {
            entry.amount / self.total * 100.0
        } else {
            0.0
        }
    }
}

/// Rounds a money amount to cents, halves away from zero.
pub fn round_cents(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Filter tag actually applied for a breakdown: a filter tag from the
/// primary group itself would only select one bucket, so it is dropped.
pub fn effective_filter<'a>(
    catalog: &TagCatalog,
    primary_group_id: &str,
    filter_tag_id: Option<&'a str>,
) -> Option<&'a str> {
    filter_tag_id.filter(|id| {
        catalog
            .tag(id)
            .is_none_or(|t| t.group_id != primary_group_id)
    })
}

/// Splits spending across the tags of `primary_group_id`.
///
/// Each transaction counts with `amount * filter_weight`, where the filter
/// weight is the transaction's weight for `filter_tag_id` (1 without a
/// filter). That amount is divided among the transaction's primary-group
/// tags by weight, or goes to the uncategorized bucket when it has none.
pub fn compute_breakdown<'a, I>(
    transactions: I,
    catalog: &TagCatalog,
    primary_group_id: &str,
    filter_tag_id: Option<&str>,
) -> Breakdown
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut buckets: BTreeMap<BucketKey, f64> = BTreeMap::new();
    let mut total = 0.0;

    for transaction in transactions {
        let filter_weight = match filter_tag_id {
            Some(tag_id) => transaction.weight_of(tag_id).unwrap_or(0.0),
            None => 1.0,
        };
        if filter_weight <= 0.0 {
            continue;
        }
        let effective_amount = transaction.amount * filter_weight;

        let mut categorized = false;
        for tw in &transaction.tag_weights {
            let in_primary = catalog
                .tag(&tw.tag_id)
                .is_some_and(|t| t.group_id == primary_group_id);
            if !in_primary {
                continue;
            }
            categorized = true;
            let weighted = effective_amount * tw.weight;
            *buckets.entry(BucketKey::Tag(tw.tag_id.clone())).or_default() += weighted;
            total += weighted;
        }

        if !categorized {
            *buckets.entry(BucketKey::Uncategorized).or_default() += effective_amount;
            total += effective_amount;
        }
    }

    let mut entries: Vec<BreakdownEntry> = buckets
        .into_iter()
        .map(|(key, amount)| {
            let label = match &key {
                BucketKey::Tag(id) => catalog.tag_name(id).to_string(),
                BucketKey::Uncategorized => UNCATEGORIZED_LABEL.to_string(),
            };
            BreakdownEntry {
                key,
                label,
                amount: round_cents(amount),
            }
        })
        .collect();
    entries.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.key.cmp(&b.key))
    });

    debug!(
        primary_group_id,
        filter_tag_id,
        buckets = entries.len(),
        "Computed breakdown"
    );
    Breakdown {
        entries,
        total: round_cents(total),
    }
}
