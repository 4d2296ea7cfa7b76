//! Token ledger engine
//!
//! Owns the invariant that a user's spendable balance always equals the
//! sum of the signed amounts in their transaction log, and enforces
//! at-most-one-winner semantics when redemptions race on one balance.
//! Every mutation goes through the store's atomic scope; the engine
//! never writes a balance directly.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::traits::{FamilyStore, OverdraftPolicy};
use crate::types::*;
use crate::utils::validation::validate_non_negative;

/// Result of a chore completion
#[derive(Debug, Clone, PartialEq)]
pub struct ChoreOutcome {
    /// The chore after the call (always `completed`)
    pub chore: Chore,
    /// The reward transaction, written only by the call that performed
    /// the `pending -> completed` transition
    pub credited: Option<Transaction>,
}

/// The ledger engine, generic over its storage backend
#[derive(Debug, Clone)]
pub struct LedgerEngine<S: FamilyStore> {
    store: S,
}

impl<S: FamilyStore> LedgerEngine<S> {
    /// Create a new engine over the given store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Credit a user's balance and append a positive ledger entry
    ///
    /// `amount` must be non-negative. The increment and the log append
    /// are one atomic unit; if either fails, neither is observed.
    pub async fn credit(
        &self,
        user_id: &str,
        amount: i64,
        kind: TransactionKind,
        description: impl Into<String>,
    ) -> LedgerResult<Transaction> {
        validate_non_negative(amount, "credit amount")?;
        self.apply(user_id, amount, kind, description.into(), OverdraftPolicy::Allow)
            .await
    }

    /// Debit a user's balance and append a negative ledger entry
    ///
    /// `amount` must be non-negative; it is stored negated. No
    /// sufficiency check is made, so a debit may drive the balance
    /// below zero (fines track debt).
    pub async fn debit(
        &self,
        user_id: &str,
        amount: i64,
        kind: TransactionKind,
        description: impl Into<String>,
    ) -> LedgerResult<Transaction> {
        validate_non_negative(amount, "debit amount")?;
        self.apply(user_id, -amount, kind, description.into(), OverdraftPolicy::Allow)
            .await
    }

    /// Apply a fine deduction to a child
    ///
    /// Unconditional: the resulting balance may be negative.
    pub async fn apply_fine(
        &self,
        child_id: &str,
        deduction: i64,
        reason: &str,
    ) -> LedgerResult<Transaction> {
        let description = if reason.is_empty() {
            "Fine applied".to_string()
        } else {
            format!("Fine applied: {reason}")
        };
        let transaction = self
            .debit(child_id, deduction, TransactionKind::Fine, description)
            .await?;
        info!(child_id, deduction, "fine applied");
        Ok(transaction)
    }

    /// Redeem a store item against a user's balance
    ///
    /// The item's authoritative price is re-read here and charged; a
    /// `quoted_price` that disagrees with it fails validation before
    /// anything is written, so a stale or forged quote can never
    /// under-charge. The balance decrement and the ledger append run
    /// in one atomic scope with overdraft denied: when two redemptions
    /// race on a balance only sufficient for one, the store serializes
    /// them and the loser fails with `InsufficientFunds`, writing no
    /// transaction. The item itself is never locked.
    pub async fn redeem(
        &self,
        user_id: &str,
        item_id: &str,
        quoted_price: i64,
    ) -> LedgerResult<Transaction> {
        validate_non_negative(quoted_price, "quoted price")?;
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))?;
        let item = self
            .store
            .get_store_item(item_id)
            .await?
            .ok_or_else(|| LedgerError::StoreItemNotFound(item_id.to_string()))?;
        if item.family_id != user.family_id {
            return Err(LedgerError::Validation(format!(
                "store item '{}' belongs to another family",
                item.name
            )));
        }
        if item.price != quoted_price {
            return Err(LedgerError::Validation(format!(
                "quoted price {} does not match current price {} for '{}'",
                quoted_price, item.price, item.name
            )));
        }

        let transaction = Transaction::new(
            user_id.to_string(),
            user.family_id.clone(),
            TransactionKind::Redeem,
            -item.price,
            format!("Redeemed store item: {}", item.name),
        );
        match self
            .store
            .apply_transaction(&transaction, OverdraftPolicy::Deny)
            .await
        {
            Ok(balance) => {
                info!(user_id, item = %item.name, balance, "store item redeemed");
                Ok(transaction)
            }
            Err(err @ LedgerError::InsufficientFunds { .. }) => {
                warn!(user_id, item = %item.name, "redemption refused: {err}");
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Complete a chore and credit its reward exactly once
    ///
    /// Idempotent by status check: the store's compare-and-set performs
    /// the `pending -> completed` transition at most once, and only the
    /// winning call credits the assignee. Repeat calls return the chore
    /// with `credited: None`.
    pub async fn complete_chore(&self, chore_id: &str) -> LedgerResult<ChoreOutcome> {
        let (chore, transitioned) = self.store.complete_chore(chore_id).await?;
        if !transitioned {
            debug!(chore_id, "chore already completed, no credit");
            return Ok(ChoreOutcome {
                chore,
                credited: None,
            });
        }

        let transaction = Transaction::new(
            chore.assigned_to.clone(),
            chore.family_id.clone(),
            TransactionKind::Chore,
            chore.reward_tokens,
            format!("Completed chore: {}", chore.title),
        );
        self.store
            .apply_transaction(&transaction, OverdraftPolicy::Allow)
            .await?;
        info!(
            chore_id,
            assignee = %chore.assigned_to,
            reward = chore.reward_tokens,
            "chore completed and rewarded"
        );
        Ok(ChoreOutcome {
            chore,
            credited: Some(transaction),
        })
    }

    /// Current balance for a user
    pub async fn balance(&self, user_id: &str) -> LedgerResult<Balance> {
        self.store
            .get_balance(user_id)
            .await?
            .ok_or_else(|| LedgerError::BalanceNotFound(user_id.to_string()))
    }

    /// A user's transaction log in append order
    pub async fn history(&self, user_id: &str) -> LedgerResult<Vec<Transaction>> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))?;
        self.store
            .list_transactions(&user.family_id, Some(user_id))
            .await
    }

    /// Check the ledger invariant for every child balance in a family
    ///
    /// Reports any balance that disagrees with the sum of its user's
    /// transaction amounts.
    pub async fn audit_family(&self, family_id: &str) -> LedgerResult<LedgerAuditReport> {
        let children = self.store.list_children(family_id).await?;
        let mut checked = 0;
        let mut mismatches = Vec::new();

        for child in &children {
            let Some(balance) = self.store.get_balance(&child.id).await? else {
                continue;
            };
            checked += 1;
            let ledger_sum: i64 = self
                .store
                .list_transactions(family_id, Some(&child.id))
                .await?
                .iter()
                .map(|txn| txn.amount)
                .sum();
            if balance.amount != ledger_sum {
                mismatches.push(BalanceMismatch {
                    user_id: child.id.clone(),
                    balance: balance.amount,
                    ledger_sum,
                });
            }
        }

        Ok(LedgerAuditReport {
            family_id: family_id.to_string(),
            checked,
            is_consistent: mismatches.is_empty(),
            mismatches,
        })
    }

    async fn apply(
        &self,
        user_id: &str,
        signed_amount: i64,
        kind: TransactionKind,
        description: String,
        policy: OverdraftPolicy,
    ) -> LedgerResult<Transaction> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))?;
        let transaction = Transaction::new(
            user_id.to_string(),
            user.family_id,
            kind,
            signed_amount,
            description,
        );
        self.store.apply_transaction(&transaction, policy).await?;
        Ok(transaction)
    }
}

/// Report on ledger consistency for one family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerAuditReport {
    pub family_id: String,
    /// Number of child balances checked
    pub checked: usize,
    pub is_consistent: bool,
    pub mismatches: Vec<BalanceMismatch>,
}

/// A balance that disagrees with its transaction log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceMismatch {
    pub user_id: String,
    pub balance: i64,
    pub ledger_sum: i64,
}
