//! Spending insights and tag suggestions from a remote language model.
use crate::core::catalog::TagCatalog;
use crate::core::transaction::TransactionStore;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Most recent transactions sent along with an insight request.
pub const INSIGHT_TRANSACTION_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightItem {
    pub amount: f64,
    pub desc: String,
    pub tags: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsightRequest {
    pub items: Vec<InsightItem>,
}

impl InsightRequest {
    pub fn build(store: &TransactionStore, catalog: &TagCatalog) -> Self {
        let items = store
            .most_recent(INSIGHT_TRANSACTION_LIMIT)
            .into_iter()
            .map(|t| InsightItem {
                amount: t.amount,
                desc: t.description.clone(),
                tags: t
                    .tag_weights
                    .iter()
                    .map(|tw| catalog.tag_name(&tw.tag_id))
                    .collect::<Vec<_>>()
                    .join(", "),
            })
            .collect();
        Self { items }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailableTag {
    pub id: String,
    pub name: String,
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionRequest {
    pub description: String,
    pub available_tags: Vec<AvailableTag>,
}

impl SuggestionRequest {
    pub fn build(description: &str, catalog: &TagCatalog) -> Self {
        let available_tags = catalog
            .tags
            .iter()
            .map(|t| AvailableTag {
                id: t.id.clone(),
                name: t.name.clone(),
                group: catalog.group(&t.group_id).map(|g| g.name.clone()),
            })
            .collect();
        Self {
            description: description.to_string(),
            available_tags,
        }
    }
}

#[async_trait]
pub trait InsightProvider: Send + Sync {
    /// A short free-text summary of the given transactions.
    async fn summarize(&self, request: &InsightRequest) -> Result<String>;

    /// Tag ids that fit the description.
    async fn suggest_tags(&self, request: &SuggestionRequest) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Insight {
    Ready(String),
    /// No provider is configured, usually because the API key is missing.
    Unavailable,
    /// Another request is still outstanding.
    Busy,
    Failed,
}

impl Display for Insight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Insight::Ready(text) => write!(f, "{text}"),
            Insight::Unavailable => write!(f, "AI key not configured."),
            Insight::Busy => write!(f, "An insight request is already running."),
            Insight::Failed => write!(f, "Could not generate insight."),
        }
    }
}

/// Clears the busy flag when dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Front for an optional [`InsightProvider`] that never fails: errors and a
/// missing provider become placeholder results, and at most one request is
/// outstanding at a time.
pub struct InsightService {
    provider: Option<Arc<dyn InsightProvider>>,
    busy: AtomicBool,
}

impl InsightService {
    pub fn new(provider: Option<Arc<dyn InsightProvider>>) -> Self {
        Self {
            provider,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(&self.busy))
    }

    pub async fn generate_insight(&self, store: &TransactionStore, catalog: &TagCatalog) -> Insight {
        let Some(provider) = &self.provider else {
            return Insight::Unavailable;
        };
        let Some(_guard) = self.try_begin() else {
            debug!("Insight request skipped, another one is running");
            return Insight::Busy;
        };

        let request = InsightRequest::build(store, catalog);
        debug!(items = request.items.len(), "Requesting spending insight");
        match provider.summarize(&request).await {
            Ok(text) => Insight::Ready(text.trim().to_string()),
            Err(e) => {
                warn!(error = %e, "Insight request failed");
                Insight::Failed
            }
        }
    }

    /// Suggested tag ids for a description. Empty when no provider is
    /// configured, a request is running or the call fails. Ids unknown to
    /// the catalog are dropped.
    pub async fn suggest_tags(&self, description: &str, catalog: &TagCatalog) -> Vec<String> {
        let Some(provider) = &self.provider else {
            return Vec::new();
        };
        let Some(_guard) = self.try_begin() else {
            return Vec::new();
        };

        let request = SuggestionRequest::build(description, catalog);
        match provider.suggest_tags(&request).await {
            Ok(ids) => {
                let (known, unknown): (Vec<String>, Vec<String>) =
                    ids.into_iter().partition(|id| catalog.tag(id).is_some());
                if !unknown.is_empty() {
                    debug!(?unknown, "Dropping suggested tags missing from catalog");
                }
                known
            }
            Err(e) => {
                warn!(error = %e, "Tag suggestion request failed");
                Vec::new()
            }
        }
    }
}
