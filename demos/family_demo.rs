//! Family allowance walkthrough

use allowance_core::utils::MemoryStore;
use allowance_core::{
    Balance, ChoreSpec, FamilyManager, LedgerEngine, LiveQuery, QueryFilter, TransactionKind,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🏠 Allowance Core - Family Demo\n");

    let store = MemoryStore::new();
    let manager = FamilyManager::new(store.clone());
    let engine = LedgerEngine::new(store.clone());
    let family = "demo-family";

    // 1. A parent sets up the household
    println!("👧 Adding children...");
    let alice = manager.add_child(family, "Alice").await?;
    let bob = manager.add_child(family, "Bob").await?;
    println!("  ✓ Alice ({}) and Bob ({})\n", alice.id, bob.id);

    println!("🧹 Creating chores and rewards...");
    let chore = manager
        .add_chore(
            family,
            ChoreSpec {
                title: "Clean room".to_string(),
                description: "Under the bed too".to_string(),
                reward_tokens: 10,
                assigned_to: alice.id.clone(),
            },
        )
        .await?;
    let movie = manager
        .add_store_item(family, "Movie night", "Pick the film", 7)
        .await?;
    manager.add_fine(family, "Messy room", 2).await?;
    println!("  ✓ Chore '{}' pays {} tokens", chore.title, chore.reward_tokens);
    println!("  ✓ Store item '{}' costs {} tokens\n", movie.name, movie.price);

    // 2. A sibling watches Alice's balance update live
    let mut balance_feed: LiveQuery<_, Balance> =
        LiveQuery::new(store.clone(), QueryFilter::user(family, alice.id.clone()));

    // 3. Alice earns and spends
    println!("✅ Alice completes her chore...");
    let outcome = engine.complete_chore(&chore.id).await?;
    println!(
        "  ✓ Credited {} tokens",
        outcome.credited.as_ref().map(|t| t.amount).unwrap_or(0)
    );
    let balances = balance_feed.next_change().await?;
    println!("  ✓ Live balance: {} tokens\n", balances[0].amount);

    // completing the same chore again changes nothing
    let repeat = engine.complete_chore(&chore.id).await?;
    assert!(repeat.credited.is_none());

    println!("🎁 Alice redeems '{}'...", movie.name);
    engine.redeem(&alice.id, &movie.id, movie.price).await?;
    println!(
        "  ✓ Balance after redemption: {} tokens\n",
        engine.balance(&alice.id).await?.amount
    );

    // 4. Bob tries to spend tokens he does not have
    println!("🚫 Bob tries to redeem with an empty balance...");
    match engine.redeem(&bob.id, &movie.id, movie.price).await {
        Err(err) => println!("  ✓ Refused: {err}\n"),
        Ok(_) => unreachable!(),
    }

    // 5. A fine can overdraw
    println!("❗ Bob is fined 2 tokens...");
    engine.apply_fine(&bob.id, 2, "Messy room").await?;
    println!(
        "  ✓ Bob's balance: {} tokens\n",
        engine.balance(&bob.id).await?.amount
    );

    // 6. The ledger stays consistent throughout
    let report = engine.audit_family(family).await?;
    println!(
        "🔍 Audit: {} balances checked, consistent = {}",
        report.checked, report.is_consistent
    );

    println!("\n📜 Alice's ledger:");
    for txn in engine.history(&alice.id).await? {
        println!("  {:+} {:?} - {}", txn.amount, txn.kind, txn.description);
    }

    // keep the adjustment kind in view for manual corrections
    engine
        .credit(&alice.id, 1, TransactionKind::Adjustment, "Birthday bonus")
        .await?;

    Ok(())
}
