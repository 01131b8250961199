//! # Catalog Store
//!
//! Storage collaborator boundary. The handlers only ever ask for "records
//! matching these predicates" plus a count, so the whole engine sits
//! behind one trait; the in-memory implementation below backs the server
//! and the tests, and a database-backed one can translate the same
//! predicates to its own query language.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::filters::Predicate;
use crate::models::{CatalogItem, InterestEvent};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Matching items, newest first, windowed by `offset`/`limit`.
    async fn find(
        &self,
        predicates: &[Predicate],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<CatalogItem>, StoreError>;

    /// Count of items matching every predicate.
    async fn count(&self, predicates: &[Predicate]) -> Result<u64, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<CatalogItem>, StoreError>;

    async fn insert(&self, item: CatalogItem) -> Result<(), StoreError>;

    /// Replaces the item with the same id. False when no such item exists.
    async fn update(&self, item: CatalogItem) -> Result<bool, StoreError>;

    /// False when no such item exists.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    async fn record_event(&self, event: InterestEvent) -> Result<(), StoreError>;

    /// Full event history, oldest first.
    async fn events(&self) -> Result<Vec<InterestEvent>, StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<Vec<CatalogItem>>,
    events: RwLock<Vec<InterestEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<CatalogItem>) -> Self {
        Self {
            items: RwLock::new(items),
            events: RwLock::new(Vec::new()),
        }
    }
}

fn matches_all(item: &CatalogItem, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|p| p.matches(item))
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find(
        &self,
        predicates: &[Predicate],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<CatalogItem>, StoreError> {
        let items = self.items.read().await;

        let mut matched: Vec<CatalogItem> = items
            .iter()
            .filter(|item| matches_all(item, predicates))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, predicates: &[Predicate]) -> Result<u64, StoreError> {
        let items = self.items.read().await;

        Ok(items
            .iter()
            .filter(|item| matches_all(item, predicates))
            .count() as u64)
    }

    async fn get(&self, id: &str) -> Result<Option<CatalogItem>, StoreError> {
        let items = self.items.read().await;

        Ok(items.iter().find(|item| item.id == id).cloned())
    }

    async fn insert(&self, item: CatalogItem) -> Result<(), StoreError> {
        self.items.write().await.push(item);
        Ok(())
    }

    async fn update(&self, item: CatalogItem) -> Result<bool, StoreError> {
        let mut items = self.items.write().await;

        match items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => {
                *existing = item;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut items = self.items.write().await;

        let before = items.len();
        items.retain(|item| item.id != id);
        Ok(items.len() < before)
    }

    async fn record_event(&self, event: InterestEvent) -> Result<(), StoreError> {
        self.events.write().await.push(event);
        Ok(())
    }

    async fn events(&self) -> Result<Vec<InterestEvent>, StoreError> {
        Ok(self.events.read().await.clone())
    }
}
