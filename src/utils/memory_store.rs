//! In-memory store implementation for testing and development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

use crate::live::{ChangeEvent, Collection};
use crate::traits::{FamilyStore, OverdraftPolicy};
use crate::types::*;

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<String, User>,
    balances: HashMap<String, Balance>,
    chores: HashMap<String, Chore>,
    store_items: HashMap<String, StoreItem>,
    fines: HashMap<String, Fine>,
    /// Append-only; order is the ledger order
    transactions: Vec<Transaction>,
}

/// In-memory [`FamilyStore`] for testing and development
///
/// A single lock guards every collection, which makes the atomic scope
/// and the chore compare-and-set serialize against each other for free.
/// Change events are emitted after the lock is released, so observers
/// re-reading on an event always see the committed state.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl MemoryStore {
    /// Create a new memory store instance
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            changes,
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap();
        *inner = Inner::default();
    }

    fn emit(&self, collection: Collection, family_id: &str, user_id: Option<&str>) {
        // no receivers is fine
        let _ = self.changes.send(ChangeEvent {
            collection,
            family_id: family_id.to_string(),
            user_id: user_id.map(str::to_string),
        });
    }

    fn family_of_user(inner: &Inner, user_id: &str) -> String {
        inner
            .users
            .get(user_id)
            .map(|user| user.family_id.clone())
            .unwrap_or_default()
    }

    /// Test hook: overwrite a balance behind the ledger's back
    #[cfg(test)]
    pub(crate) fn tamper_balance(&self, user_id: &str, amount: i64) {
        let mut inner = self.inner.write().unwrap();
        if let Some(balance) = inner.balances.get_mut(user_id) {
            balance.amount = amount;
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FamilyStore for MemoryStore {
    async fn save_user(&self, user: &User) -> LedgerResult<()> {
        self.inner
            .write()
            .unwrap()
            .users
            .insert(user.id.clone(), user.clone());
        self.emit(Collection::Users, &user.family_id, Some(&user.id));
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> LedgerResult<Option<User>> {
        Ok(self.inner.read().unwrap().users.get(user_id).cloned())
    }

    async fn list_children(&self, family_id: &str) -> LedgerResult<Vec<User>> {
        let inner = self.inner.read().unwrap();
        let mut children: Vec<User> = inner
            .users
            .values()
            .filter(|user| user.family_id == family_id && user.role == Role::Child)
            .cloned()
            .collect();
        children.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(children)
    }

    async fn delete_user(&self, user_id: &str) -> LedgerResult<()> {
        let removed = self.inner.write().unwrap().users.remove(user_id);
        match removed {
            Some(user) => {
                self.emit(Collection::Users, &user.family_id, Some(user_id));
                Ok(())
            }
            None => Err(LedgerError::UserNotFound(user_id.to_string())),
        }
    }

    async fn create_balance(&self, user_id: &str) -> LedgerResult<()> {
        let family_id = {
            let mut inner = self.inner.write().unwrap();
            inner
                .balances
                .insert(user_id.to_string(), Balance::zero(user_id.to_string()));
            Self::family_of_user(&inner, user_id)
        };
        self.emit(Collection::Balances, &family_id, Some(user_id));
        Ok(())
    }

    async fn get_balance(&self, user_id: &str) -> LedgerResult<Option<Balance>> {
        Ok(self.inner.read().unwrap().balances.get(user_id).cloned())
    }

    async fn delete_balance(&self, user_id: &str) -> LedgerResult<()> {
        let (removed, family_id) = {
            let mut inner = self.inner.write().unwrap();
            let removed = inner.balances.remove(user_id).is_some();
            (removed, Self::family_of_user(&inner, user_id))
        };
        if removed {
            self.emit(Collection::Balances, &family_id, Some(user_id));
            Ok(())
        } else {
            Err(LedgerError::BalanceNotFound(user_id.to_string()))
        }
    }

    async fn apply_transaction(
        &self,
        transaction: &Transaction,
        policy: OverdraftPolicy,
    ) -> LedgerResult<i64> {
        let next = {
            let mut inner = self.inner.write().unwrap();
            let balance = inner
                .balances
                .get_mut(&transaction.user_id)
                .ok_or_else(|| LedgerError::BalanceNotFound(transaction.user_id.clone()))?;
            let next = balance.amount.checked_add(transaction.amount).ok_or_else(|| {
                LedgerError::Validation(format!(
                    "balance overflow for user {}",
                    transaction.user_id
                ))
            })?;
            if policy == OverdraftPolicy::Deny && next < 0 {
                return Err(LedgerError::InsufficientFunds {
                    available: balance.amount,
                    required: transaction.amount.abs(),
                });
            }
            balance.amount = next;
            inner.transactions.push(transaction.clone());
            next
        };
        self.emit(
            Collection::Balances,
            &transaction.family_id,
            Some(&transaction.user_id),
        );
        self.emit(
            Collection::Transactions,
            &transaction.family_id,
            Some(&transaction.user_id),
        );
        Ok(next)
    }

    async fn save_chore(&self, chore: &Chore) -> LedgerResult<()> {
        let previous = self
            .inner
            .write()
            .unwrap()
            .chores
            .insert(chore.id.clone(), chore.clone());
        // a reassignment must also wake the previous assignee's
        // user-scoped queries
        if let Some(prev) = previous {
            if prev.assigned_to != chore.assigned_to {
                self.emit(Collection::Chores, &prev.family_id, Some(&prev.assigned_to));
            }
        }
        self.emit(Collection::Chores, &chore.family_id, Some(&chore.assigned_to));
        Ok(())
    }

    async fn get_chore(&self, chore_id: &str) -> LedgerResult<Option<Chore>> {
        Ok(self.inner.read().unwrap().chores.get(chore_id).cloned())
    }

    async fn list_chores(
        &self,
        family_id: &str,
        assigned_to: Option<&str>,
    ) -> LedgerResult<Vec<Chore>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .chores
            .values()
            .filter(|chore| {
                chore.family_id == family_id
                    && assigned_to.is_none_or(|id| chore.assigned_to == id)
            })
            .cloned()
            .collect())
    }

    async fn delete_chore(&self, chore_id: &str) -> LedgerResult<()> {
        let removed = self.inner.write().unwrap().chores.remove(chore_id);
        match removed {
            Some(chore) => {
                self.emit(Collection::Chores, &chore.family_id, Some(&chore.assigned_to));
                Ok(())
            }
            None => Err(LedgerError::ChoreNotFound(chore_id.to_string())),
        }
    }

    async fn complete_chore(&self, chore_id: &str) -> LedgerResult<(Chore, bool)> {
        let (chore, transitioned) = {
            let mut inner = self.inner.write().unwrap();
            let chore = inner
                .chores
                .get_mut(chore_id)
                .ok_or_else(|| LedgerError::ChoreNotFound(chore_id.to_string()))?;
            if chore.status == ChoreStatus::Completed {
                (chore.clone(), false)
            } else {
                chore.status = ChoreStatus::Completed;
                (chore.clone(), true)
            }
        };
        if transitioned {
            self.emit(Collection::Chores, &chore.family_id, Some(&chore.assigned_to));
        }
        Ok((chore, transitioned))
    }

    async fn save_store_item(&self, item: &StoreItem) -> LedgerResult<()> {
        self.inner
            .write()
            .unwrap()
            .store_items
            .insert(item.id.clone(), item.clone());
        self.emit(Collection::StoreItems, &item.family_id, None);
        Ok(())
    }

    async fn get_store_item(&self, item_id: &str) -> LedgerResult<Option<StoreItem>> {
        Ok(self.inner.read().unwrap().store_items.get(item_id).cloned())
    }

    async fn list_store_items(&self, family_id: &str) -> LedgerResult<Vec<StoreItem>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .store_items
            .values()
            .filter(|item| item.family_id == family_id)
            .cloned()
            .collect())
    }

    async fn delete_store_item(&self, item_id: &str) -> LedgerResult<()> {
        let removed = self.inner.write().unwrap().store_items.remove(item_id);
        match removed {
            Some(item) => {
                self.emit(Collection::StoreItems, &item.family_id, None);
                Ok(())
            }
            None => Err(LedgerError::StoreItemNotFound(item_id.to_string())),
        }
    }

    async fn save_fine(&self, fine: &Fine) -> LedgerResult<()> {
        self.inner
            .write()
            .unwrap()
            .fines
            .insert(fine.id.clone(), fine.clone());
        self.emit(Collection::Fines, &fine.family_id, None);
        Ok(())
    }

    async fn get_fine(&self, fine_id: &str) -> LedgerResult<Option<Fine>> {
        Ok(self.inner.read().unwrap().fines.get(fine_id).cloned())
    }

    async fn list_fines(&self, family_id: &str) -> LedgerResult<Vec<Fine>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .fines
            .values()
            .filter(|fine| fine.family_id == family_id)
            .cloned()
            .collect())
    }

    async fn delete_fine(&self, fine_id: &str) -> LedgerResult<()> {
        let removed = self.inner.write().unwrap().fines.remove(fine_id);
        match removed {
            Some(fine) => {
                self.emit(Collection::Fines, &fine.family_id, None);
                Ok(())
            }
            None => Err(LedgerError::FineNotFound(fine_id.to_string())),
        }
    }

    async fn list_transactions(
        &self,
        family_id: &str,
        user_id: Option<&str>,
    ) -> LedgerResult<Vec<Transaction>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .transactions
            .iter()
            .filter(|txn| {
                txn.family_id == family_id && user_id.is_none_or(|id| txn.user_id == id)
            })
            .cloned()
            .collect())
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(id: &str, family: &str) -> User {
        User {
            id: id.to_string(),
            ..User::new_child(family.to_string(), id.to_string())
        }
    }

    fn txn(user: &str, family: &str, amount: i64) -> Transaction {
        Transaction::new(
            user.to_string(),
            family.to_string(),
            TransactionKind::Adjustment,
            amount,
            "test".to_string(),
        )
    }

    #[tokio::test]
    async fn apply_transaction_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.save_user(&child("kid", "fam")).await.unwrap();
        store.create_balance("kid").await.unwrap();

        store
            .apply_transaction(&txn("kid", "fam", 5), OverdraftPolicy::Allow)
            .await
            .unwrap();

        // denied overdraft writes neither the balance nor the log entry
        let err = store
            .apply_transaction(&txn("kid", "fam", -6), OverdraftPolicy::Deny)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert_eq!(store.get_balance("kid").await.unwrap().unwrap().amount, 5);
        assert_eq!(
            store.list_transactions("fam", Some("kid")).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn apply_transaction_without_balance_fails() {
        let store = MemoryStore::new();
        let err = store
            .apply_transaction(&txn("ghost", "fam", 1), OverdraftPolicy::Allow)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::BalanceNotFound(_)));
    }

    #[tokio::test]
    async fn overflowing_apply_fails_and_writes_nothing() {
        let store = MemoryStore::new();
        store.save_user(&child("kid", "fam")).await.unwrap();
        store.create_balance("kid").await.unwrap();
        store
            .apply_transaction(&txn("kid", "fam", i64::MAX), OverdraftPolicy::Allow)
            .await
            .unwrap();

        let err = store
            .apply_transaction(&txn("kid", "fam", 1), OverdraftPolicy::Allow)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(
            store.get_balance("kid").await.unwrap().unwrap().amount,
            i64::MAX
        );
        assert_eq!(
            store.list_transactions("fam", Some("kid")).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn complete_chore_transitions_only_once() {
        let store = MemoryStore::new();
        let chore = Chore::new(
            "fam".to_string(),
            "Dishes".to_string(),
            String::new(),
            2,
            "kid".to_string(),
        );
        store.save_chore(&chore).await.unwrap();

        let (_, first) = store.complete_chore(&chore.id).await.unwrap();
        let (done, second) = store.complete_chore(&chore.id).await.unwrap();
        assert!(first);
        assert!(!second);
        assert_eq!(done.status, ChoreStatus::Completed);
    }

    #[tokio::test]
    async fn transactions_keep_append_order() {
        let store = MemoryStore::new();
        store.save_user(&child("kid", "fam")).await.unwrap();
        store.create_balance("kid").await.unwrap();

        for amount in [3, -1, 7] {
            store
                .apply_transaction(&txn("kid", "fam", amount), OverdraftPolicy::Allow)
                .await
                .unwrap();
        }

        let amounts: Vec<i64> = store
            .list_transactions("fam", Some("kid"))
            .await
            .unwrap()
            .iter()
            .map(|t| t.amount)
            .collect();
        assert_eq!(amounts, vec![3, -1, 7]);
    }
}
