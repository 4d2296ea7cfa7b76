//! Live query subscriptions over the store's change feed
//!
//! A [`LiveQuery`] is the long-lived stream the UI layer consumes: it
//! produces whole "current result set" snapshots, one per relevant
//! change. Dropping the query cancels it; a cancelled query cannot be
//! restarted, issue a new one.

use std::marker::PhantomData;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::warn;

use crate::traits::FamilyStore;
use crate::types::*;

/// Document collections exposed through the change feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Balances,
    Chores,
    StoreItems,
    Fines,
    Transactions,
}

/// Notification that a collection changed
///
/// Carries just enough to decide relevance; subscribers re-run their
/// query rather than patching state from the event.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// Collection the mutation touched
    pub collection: Collection,
    /// Family the mutated document belongs to
    pub family_id: String,
    /// User the document is scoped to, when it has one (balance owner,
    /// chore assignee, transaction user)
    pub user_id: Option<String>,
}

/// Filter a live query runs against the store
#[derive(Debug, Clone)]
pub struct QueryFilter {
    /// Family whose documents are streamed
    pub family_id: String,
    /// Optional narrowing to one user
    pub user_id: Option<String>,
}

impl QueryFilter {
    /// Filter on a family alone
    pub fn family(family_id: impl Into<String>) -> Self {
        Self {
            family_id: family_id.into(),
            user_id: None,
        }
    }

    /// Filter on one user within a family
    pub fn user(family_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            family_id: family_id.into(),
            user_id: Some(user_id.into()),
        }
    }

    fn matches(&self, collection: Collection, event: &ChangeEvent) -> bool {
        if event.collection != collection || event.family_id != self.family_id {
            return false;
        }
        match (&self.user_id, &event.user_id) {
            (Some(want), Some(got)) => want == got,
            _ => true,
        }
    }
}

/// A document type that can back a live query
#[async_trait]
pub trait LiveCollection: Sized + Send {
    /// Collection the type lives in
    const COLLECTION: Collection;

    /// Fetch the current result set for a filter
    async fn fetch<S: FamilyStore>(store: &S, filter: &QueryFilter) -> LedgerResult<Vec<Self>>;
}

#[async_trait]
impl LiveCollection for Chore {
    const COLLECTION: Collection = Collection::Chores;

    async fn fetch<S: FamilyStore>(store: &S, filter: &QueryFilter) -> LedgerResult<Vec<Self>> {
        store
            .list_chores(&filter.family_id, filter.user_id.as_deref())
            .await
    }
}

#[async_trait]
impl LiveCollection for StoreItem {
    const COLLECTION: Collection = Collection::StoreItems;

    async fn fetch<S: FamilyStore>(store: &S, filter: &QueryFilter) -> LedgerResult<Vec<Self>> {
        store.list_store_items(&filter.family_id).await
    }
}

#[async_trait]
impl LiveCollection for Fine {
    const COLLECTION: Collection = Collection::Fines;

    async fn fetch<S: FamilyStore>(store: &S, filter: &QueryFilter) -> LedgerResult<Vec<Self>> {
        store.list_fines(&filter.family_id).await
    }
}

#[async_trait]
impl LiveCollection for Transaction {
    const COLLECTION: Collection = Collection::Transactions;

    async fn fetch<S: FamilyStore>(store: &S, filter: &QueryFilter) -> LedgerResult<Vec<Self>> {
        store
            .list_transactions(&filter.family_id, filter.user_id.as_deref())
            .await
    }
}

/// Streams a family's children
#[async_trait]
impl LiveCollection for User {
    const COLLECTION: Collection = Collection::Users;

    async fn fetch<S: FamilyStore>(store: &S, filter: &QueryFilter) -> LedgerResult<Vec<Self>> {
        store.list_children(&filter.family_id).await
    }
}

/// Streams one user's balance; the filter must name the user
#[async_trait]
impl LiveCollection for Balance {
    const COLLECTION: Collection = Collection::Balances;

    async fn fetch<S: FamilyStore>(store: &S, filter: &QueryFilter) -> LedgerResult<Vec<Self>> {
        let user_id = filter.user_id.as_deref().ok_or_else(|| {
            LedgerError::Validation("balance queries must name a user".to_string())
        })?;
        Ok(store.get_balance(user_id).await?.into_iter().collect())
    }
}

/// Long-lived subscription to one collection under one filter
pub struct LiveQuery<S: FamilyStore, T: LiveCollection> {
    store: S,
    filter: QueryFilter,
    rx: broadcast::Receiver<ChangeEvent>,
    _collection: PhantomData<fn() -> T>,
}

impl<S: FamilyStore, T: LiveCollection> LiveQuery<S, T> {
    /// Open a subscription; the feed is registered immediately so no
    /// change between construction and the first await is missed
    pub fn new(store: S, filter: QueryFilter) -> Self {
        let rx = store.changes();
        Self {
            store,
            filter,
            rx,
            _collection: PhantomData,
        }
    }

    /// Fetch the current result set without waiting for a change
    pub async fn snapshot(&self) -> LedgerResult<Vec<T>> {
        T::fetch(&self.store, &self.filter).await
    }

    /// Wait for the next relevant change and return the fresh result set
    ///
    /// A lagged feed is not fatal: snapshots are whole result sets, so
    /// skipped events coalesce into the refresh. A closed feed surfaces
    /// as `Unavailable` - never a silent empty set.
    pub async fn next_change(&mut self) -> LedgerResult<Vec<T>> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.filter.matches(T::COLLECTION, &event) => {
                    return self.snapshot().await;
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "live query feed lagged, refreshing snapshot");
                    return self.snapshot().await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(LedgerError::Unavailable(
                        "change feed closed".to_string(),
                    ));
                }
            }
        }
    }
}
