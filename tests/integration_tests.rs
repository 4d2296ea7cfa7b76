//! Integration tests for allowance-core

use allowance_core::utils::{fixtures, MemoryStore};
use allowance_core::{
    Balance, Chore, ChoreSpec, FamilyManager, LedgerEngine, LedgerError, LiveQuery, QueryFilter,
    Transaction, TransactionKind,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FAMILY: &str = "family-1";

struct Harness {
    store: MemoryStore,
    manager: FamilyManager<MemoryStore>,
    engine: LedgerEngine<MemoryStore>,
}

impl Harness {
    fn new() -> Self {
        let store = MemoryStore::new();
        Self {
            manager: FamilyManager::new(store.clone()),
            engine: LedgerEngine::new(store.clone()),
            store,
        }
    }
}

#[tokio::test]
async fn balance_always_equals_the_transaction_sum() {
    let h = Harness::new();
    let child = h.manager.add_child(FAMILY, "Alice").await.unwrap();
    let item = h
        .manager
        .add_store_item(FAMILY, "Sticker pack", "", 5)
        .await
        .unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        match rng.gen_range(0..3) {
            0 => {
                let amount = rng.gen_range(0..20);
                h.engine
                    .credit(&child.id, amount, TransactionKind::Chore, "reward")
                    .await
                    .unwrap();
            }
            1 => {
                let amount = rng.gen_range(0..10);
                h.engine
                    .apply_fine(&child.id, amount, "random fine")
                    .await
                    .unwrap();
            }
            _ => {
                // may legitimately fail on a short balance; that failure
                // must not break the invariant either
                match h.engine.redeem(&child.id, &item.id, 5).await {
                    Ok(_) | Err(LedgerError::InsufficientFunds { .. }) => {}
                    Err(other) => panic!("unexpected redeem error: {other}"),
                }
            }
        }

        let report = h.engine.audit_family(FAMILY).await.unwrap();
        assert!(report.is_consistent, "invariant broken: {report:?}");
    }
}

#[tokio::test]
async fn racing_redemptions_produce_exactly_one_winner() {
    let h = Harness::new();
    let child = h.manager.add_child(FAMILY, "Alice").await.unwrap();
    let item = h
        .manager
        .add_store_item(FAMILY, "Lego set", "", 10)
        .await
        .unwrap();
    h.engine
        .credit(&child.id, 10, TransactionKind::Chore, "reward")
        .await
        .unwrap();

    let (first, second) = {
        let (e1, e2) = (h.engine.clone(), h.engine.clone());
        let (c1, c2) = (child.id.clone(), child.id.clone());
        let (i1, i2) = (item.id.clone(), item.id.clone());
        tokio::join!(
            tokio::spawn(async move { e1.redeem(&c1, &i1, 10).await }),
            tokio::spawn(async move { e2.redeem(&c2, &i2, 10).await }),
        )
    };
    let outcomes = [first.unwrap(), second.unwrap()];

    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one redemption may win");
    let loser = outcomes.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loser.as_ref().unwrap_err(),
        LedgerError::InsufficientFunds { .. }
    ));

    assert_eq!(h.engine.balance(&child.id).await.unwrap().amount, 0);
    let redeems = h
        .engine
        .history(&child.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.kind == TransactionKind::Redeem)
        .count();
    assert_eq!(redeems, 1, "the losing attempt must write no transaction");
}

#[tokio::test]
async fn new_child_earns_and_spends_end_to_end() {
    let h = Harness::new();
    let child = h.manager.add_child(FAMILY, "Alice").await.unwrap();
    assert_eq!(h.engine.balance(&child.id).await.unwrap().amount, 0);

    let chore = h
        .manager
        .add_chore(
            FAMILY,
            ChoreSpec {
                title: "Wash the car".to_string(),
                description: "Outside only".to_string(),
                reward_tokens: 10,
                assigned_to: child.id.clone(),
            },
        )
        .await
        .unwrap();
    let item = h
        .manager
        .add_store_item(FAMILY, "Movie night", "", 7)
        .await
        .unwrap();

    let outcome = h.engine.complete_chore(&chore.id).await.unwrap();
    assert_eq!(outcome.credited.as_ref().unwrap().amount, 10);

    h.engine.redeem(&child.id, &item.id, 7).await.unwrap();

    assert_eq!(h.engine.balance(&child.id).await.unwrap().amount, 3);
    let history = h.engine.history(&child.id).await.unwrap();
    let amounts: Vec<i64> = history.iter().map(|t| t.amount).collect();
    assert_eq!(amounts, vec![10, -7]);
    assert_eq!(history[0].kind, TransactionKind::Chore);
    assert_eq!(history[1].kind, TransactionKind::Redeem);
}

#[tokio::test]
async fn redemption_failures_are_distinguishable() {
    let h = Harness::new();
    let child = h.manager.add_child(FAMILY, "Alice").await.unwrap();
    let item = h
        .manager
        .add_store_item(FAMILY, "Lego set", "", 10)
        .await
        .unwrap();

    // a missing item is a system error, not an empty wallet
    let err = h.engine.redeem(&child.id, "no-such-item", 10).await.unwrap_err();
    assert!(matches!(err, LedgerError::StoreItemNotFound(_)));

    let err = h.engine.redeem(&child.id, &item.id, 10).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
}

#[tokio::test]
async fn live_queries_stream_balance_and_ledger_updates() {
    let h = Harness::new();
    let child = h.manager.add_child(FAMILY, "Alice").await.unwrap();
    let item = h
        .manager
        .add_store_item(FAMILY, "Ice Cream", "", 2)
        .await
        .unwrap();
    h.engine
        .credit(&child.id, 5, TransactionKind::Chore, "reward")
        .await
        .unwrap();

    let mut balance_query: LiveQuery<_, Balance> = LiveQuery::new(
        h.store.clone(),
        QueryFilter::user(FAMILY, child.id.clone()),
    );
    let mut ledger_query: LiveQuery<_, Transaction> = LiveQuery::new(
        h.store.clone(),
        QueryFilter::user(FAMILY, child.id.clone()),
    );

    assert_eq!(balance_query.snapshot().await.unwrap()[0].amount, 5);

    h.engine.redeem(&child.id, &item.id, 2).await.unwrap();

    let balances = balance_query.next_change().await.unwrap();
    assert_eq!(balances[0].amount, 3);
    let transactions = ledger_query.next_change().await.unwrap();
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions.last().unwrap().amount, -2);
}

#[tokio::test]
async fn child_scoped_chore_query_ignores_siblings() {
    let h = Harness::new();
    let alice = h.manager.add_child(FAMILY, "Alice").await.unwrap();
    let bob = h.manager.add_child(FAMILY, "Bob").await.unwrap();

    let mut query: LiveQuery<_, Chore> = LiveQuery::new(
        h.store.clone(),
        QueryFilter::user(FAMILY, alice.id.clone()),
    );

    for (title, assignee) in [("Mow lawn", &bob.id), ("Dishes", &alice.id)] {
        h.manager
            .add_chore(
                FAMILY,
                ChoreSpec {
                    title: title.to_string(),
                    description: String::new(),
                    reward_tokens: 1,
                    assigned_to: assignee.clone(),
                },
            )
            .await
            .unwrap();
    }

    // Bob's chore is skipped; the first wake-up is Alice's own chore
    let chores = query.next_change().await.unwrap();
    assert_eq!(chores.len(), 1);
    assert_eq!(chores[0].title, "Dishes");
}

#[tokio::test]
async fn demo_fixture_plays_through_the_original_flow() {
    let store = MemoryStore::new();
    let demo = fixtures::seed_demo_family(store.clone()).await.unwrap();
    let engine = LedgerEngine::new(store.clone());
    let manager = FamilyManager::new(store);

    let alice = &demo.children[0];
    let alice_chore = demo
        .chores
        .iter()
        .find(|c| c.assigned_to == alice.id)
        .unwrap();
    let toy_car = &demo.store_items[0];

    engine.complete_chore(&alice_chore.id).await.unwrap();
    assert_eq!(engine.balance(&alice.id).await.unwrap().amount, 12);

    engine
        .redeem(&alice.id, &toy_car.id, toy_car.price)
        .await
        .unwrap();
    assert_eq!(engine.balance(&alice.id).await.unwrap().amount, 7);

    let messy_room = &demo.fines[0];
    engine
        .apply_fine(&alice.id, messy_room.deduction, &messy_room.reason)
        .await
        .unwrap();
    assert_eq!(engine.balance(&alice.id).await.unwrap().amount, 6);

    let report = engine.audit_family(&demo.family_id).await.unwrap();
    assert!(report.is_consistent);

    // children remain listed for the UI layer
    let children = manager.children(&demo.family_id).await.unwrap();
    assert_eq!(children.len(), 2);
}
