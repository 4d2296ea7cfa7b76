//! Demo seed and reset fixtures
//!
//! Setup/teardown helpers for tests and administrative tooling. The
//! ledger engine has no dependency on anything here; starting balances
//! are funded through `credit` so the ledger invariant holds from the
//! first document.

use crate::ledger::{ChoreSpec, FamilyManager, LedgerEngine};
use crate::traits::FamilyStore;
use crate::types::*;
use crate::utils::memory_store::MemoryStore;

/// Family id the demo data set lives under
pub const DEMO_FAMILY_ID: &str = "demo-family";

/// Handles to the seeded demo documents
#[derive(Debug, Clone)]
pub struct DemoFamily {
    pub family_id: String,
    pub parent: User,
    pub children: Vec<User>,
    pub chores: Vec<Chore>,
    pub store_items: Vec<StoreItem>,
    pub fines: Vec<Fine>,
}

/// Seed the demo family: a parent, two funded children, two chores,
/// two store items, and two fines
pub async fn seed_demo_family<S: FamilyStore + Clone>(store: S) -> LedgerResult<DemoFamily> {
    let manager = FamilyManager::new(store.clone());
    let engine = LedgerEngine::new(store.clone());
    let family_id = DEMO_FAMILY_ID;

    let parent = User::new_parent(family_id.to_string(), "Parent".to_string());
    store.save_user(&parent).await?;

    let alice = manager.add_child(family_id, "Alice").await?;
    let bob = manager.add_child(family_id, "Bob").await?;
    engine
        .credit(&alice.id, 10, TransactionKind::Adjustment, "Starting balance")
        .await?;
    engine
        .credit(&bob.id, 5, TransactionKind::Adjustment, "Starting balance")
        .await?;

    let chores = vec![
        manager
            .add_chore(
                family_id,
                ChoreSpec {
                    title: "Clean room".to_string(),
                    description: String::new(),
                    reward_tokens: 2,
                    assigned_to: alice.id.clone(),
                },
            )
            .await?,
        manager
            .add_chore(
                family_id,
                ChoreSpec {
                    title: "Do homework".to_string(),
                    description: String::new(),
                    reward_tokens: 3,
                    assigned_to: bob.id.clone(),
                },
            )
            .await?,
    ];

    let store_items = vec![
        manager.add_store_item(family_id, "Toy Car", "", 5).await?,
        manager.add_store_item(family_id, "Ice Cream", "", 2).await?,
    ];

    let fines = vec![
        manager.add_fine(family_id, "Messy room", 1).await?,
        manager.add_fine(family_id, "Late homework", 2).await?,
    ];

    Ok(DemoFamily {
        family_id: family_id.to_string(),
        parent,
        children: vec![alice, bob],
        chores,
        store_items,
        fines,
    })
}

/// Drop every document in the store
pub fn reset(store: &MemoryStore) {
    store.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerEngine;

    #[tokio::test]
    async fn seeded_family_satisfies_the_ledger_invariant() {
        let store = MemoryStore::new();
        let demo = seed_demo_family(store.clone()).await.unwrap();
        let engine = LedgerEngine::new(store.clone());

        let report = engine.audit_family(&demo.family_id).await.unwrap();
        assert!(report.is_consistent);
        assert_eq!(report.checked, 2);

        let alice = &demo.children[0];
        assert_eq!(engine.balance(&alice.id).await.unwrap().amount, 10);

        reset(&store);
        assert!(store.get_user(&alice.id).await.unwrap().is_none());
    }
}
