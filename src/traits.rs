//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::live::ChangeEvent;
use crate::types::*;

/// Whether an applied transaction may take the balance below zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverdraftPolicy {
    /// The balance may go negative (chore credits, fines)
    Allow,
    /// Abort with `InsufficientFunds` instead of overdrawing (redemption)
    Deny,
}

/// Storage abstraction for the family document store
///
/// This trait allows the allowance core to work with any document
/// backend (hosted document store, embedded database, in-memory, etc.)
/// by implementing these methods. Write methods take `&self`: callers
/// are concurrent sessions and implementations are expected to provide
/// their own interior synchronization.
#[async_trait]
pub trait FamilyStore: Send + Sync {
    /// Save a user document
    async fn save_user(&self, user: &User) -> LedgerResult<()>;

    /// Get a user by id
    async fn get_user(&self, user_id: &str) -> LedgerResult<Option<User>>;

    /// List the child users of a family
    async fn list_children(&self, family_id: &str) -> LedgerResult<Vec<User>>;

    /// Delete a user document (the caller cascades the balance)
    async fn delete_user(&self, user_id: &str) -> LedgerResult<()>;

    /// Create a zero balance for a user
    async fn create_balance(&self, user_id: &str) -> LedgerResult<()>;

    /// Get a balance by the owning user's id
    async fn get_balance(&self, user_id: &str) -> LedgerResult<Option<Balance>>;

    /// Delete a balance document
    async fn delete_balance(&self, user_id: &str) -> LedgerResult<()>;

    /// Atomically apply a transaction to its user's balance
    ///
    /// One call is one atomic scope: read the balance, and either abort
    /// (under [`OverdraftPolicy::Deny`] when the signed amount would
    /// take it below zero, writing nothing) or write the adjusted
    /// balance and append the transaction as a unit. Scopes touching
    /// the same balance are serialized against each other; no partial
    /// state is observable.
    ///
    /// Returns the post-apply balance amount. Fails with
    /// `BalanceNotFound` when the user has no balance document and
    /// `InsufficientFunds` on an aborted scope.
    async fn apply_transaction(
        &self,
        transaction: &Transaction,
        policy: OverdraftPolicy,
    ) -> LedgerResult<i64>;

    /// Save a chore document
    async fn save_chore(&self, chore: &Chore) -> LedgerResult<()>;

    /// Get a chore by id
    async fn get_chore(&self, chore_id: &str) -> LedgerResult<Option<Chore>>;

    /// List a family's chores, optionally narrowed to one assignee
    async fn list_chores(
        &self,
        family_id: &str,
        assigned_to: Option<&str>,
    ) -> LedgerResult<Vec<Chore>>;

    /// Delete a chore document
    async fn delete_chore(&self, chore_id: &str) -> LedgerResult<()>;

    /// Atomically transition a chore from pending to completed
    ///
    /// Compare-and-set on the status field. Returns the chore and
    /// whether this call performed the transition; `false` means the
    /// chore was already completed and nothing was written.
    async fn complete_chore(&self, chore_id: &str) -> LedgerResult<(Chore, bool)>;

    /// Save a store item document
    async fn save_store_item(&self, item: &StoreItem) -> LedgerResult<()>;

    /// Get a store item by id
    async fn get_store_item(&self, item_id: &str) -> LedgerResult<Option<StoreItem>>;

    /// List a family's store items
    async fn list_store_items(&self, family_id: &str) -> LedgerResult<Vec<StoreItem>>;

    /// Delete a store item document
    async fn delete_store_item(&self, item_id: &str) -> LedgerResult<()>;

    /// Save a fine document
    async fn save_fine(&self, fine: &Fine) -> LedgerResult<()>;

    /// Get a fine by id
    async fn get_fine(&self, fine_id: &str) -> LedgerResult<Option<Fine>>;

    /// List a family's fines
    async fn list_fines(&self, family_id: &str) -> LedgerResult<Vec<Fine>>;

    /// Delete a fine document
    async fn delete_fine(&self, fine_id: &str) -> LedgerResult<()>;

    /// List a family's transactions in append order, optionally
    /// narrowed to one user
    async fn list_transactions(
        &self,
        family_id: &str,
        user_id: Option<&str>,
    ) -> LedgerResult<Vec<Transaction>>;

    /// Subscribe to the change feed
    ///
    /// The store emits one [`ChangeEvent`] after every committed
    /// mutation. Live queries re-run their filter on each relevant
    /// event; a lagged receiver only costs a coalesced refresh.
    fn changes(&self) -> broadcast::Receiver<ChangeEvent>;
}
