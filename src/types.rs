//! Core types and data structures for the allowance system

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a family member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Parent - administrative owner of the family's children, chores,
    /// store items, and fines
    Parent,
    /// Child - completes chores, earns tokens, redeems store items
    Child,
}

/// A family member document
///
/// Field names serialize in camelCase so documents stay compatible with
/// the original store layout (`familyId`, `walletAddress`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier for the user
    pub id: String,
    /// Display name
    pub name: String,
    /// Parent or child
    pub role: Role,
    /// Household grouping; families are implicit, not stored entities
    pub family_id: String,
    /// Optional external wallet public key
    #[serde(default)]
    pub wallet_address: Option<String>,
    /// Optional token mint the external wallet balance is read against
    #[serde(default)]
    pub token_mint_address: Option<String>,
    /// When the user was created
    pub created_at: NaiveDateTime,
}

impl User {
    /// Create a new child user in the given family
    pub fn new_child(family_id: String, name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            role: Role::Child,
            family_id,
            wallet_address: None,
            token_mint_address: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Create a new parent user in the given family
    pub fn new_parent(family_id: String, name: String) -> Self {
        Self {
            role: Role::Parent,
            ..Self::new_child(family_id, name)
        }
    }
}

/// Spendable token balance, one per child user
///
/// The balance identifier is the owning user's id. The amount is only
/// ever written through [`crate::traits::FamilyStore::apply_transaction`];
/// it must always equal the sum of the user's transaction amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    /// Owning user's id
    pub user_id: String,
    /// Current token amount; negative only when a fine overdraws it
    #[serde(rename = "tokenBalance")]
    pub amount: i64,
}

impl Balance {
    /// Create a zeroed balance for a user
    pub fn zero(user_id: String) -> Self {
        Self { user_id, amount: 0 }
    }
}

/// Lifecycle status of a chore
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoreStatus {
    /// Assigned but not yet done
    Pending,
    /// Done and rewarded; terminal
    Completed,
}

/// A task assigned to a child, rewarded in tokens on completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chore {
    /// Unique identifier for the chore
    pub id: String,
    /// Short title, used in the reward transaction description
    pub title: String,
    /// Longer description
    #[serde(default)]
    pub description: String,
    /// Tokens credited to the assignee on completion (non-negative)
    pub reward_tokens: i64,
    /// Id of the child the chore is assigned to
    pub assigned_to: String,
    /// Owning family
    pub family_id: String,
    /// Current status; `pending -> completed` is the only transition
    pub status: ChoreStatus,
}

impl Chore {
    /// Create a new pending chore
    pub fn new(
        family_id: String,
        title: String,
        description: String,
        reward_tokens: i64,
        assigned_to: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            reward_tokens,
            assigned_to,
            family_id,
            status: ChoreStatus::Pending,
        }
    }
}

/// A reward a child can redeem tokens for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreItem {
    /// Unique identifier for the item
    pub id: String,
    /// Item name
    pub name: String,
    /// Longer description
    #[serde(default)]
    pub description: String,
    /// Price in tokens (non-negative)
    pub price: i64,
    /// Owning family
    pub family_id: String,
}

impl StoreItem {
    /// Create a new store item
    pub fn new(family_id: String, name: String, description: String, price: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            price,
            family_id,
        }
    }
}

/// A deduction template a parent can apply to a child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fine {
    /// Unique identifier for the fine
    pub id: String,
    /// Why the fine exists ("Messy room", ...)
    pub reason: String,
    /// Tokens deducted when applied (non-negative)
    pub deduction: i64,
    /// Owning family
    pub family_id: String,
}

impl Fine {
    /// Create a new fine template
    pub fn new(family_id: String, reason: String, deduction: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            reason,
            deduction,
            family_id,
        }
    }
}

/// Category of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Chore reward credit
    Chore,
    /// Fine deduction
    Fine,
    /// Store item redemption
    Redeem,
    /// Manual parent correction
    Adjustment,
}

/// Immutable ledger entry
///
/// Transactions are append-only: never mutated or deleted after they
/// are written. Positive amounts are credits, negative are debits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique identifier for the transaction
    pub id: String,
    /// User whose balance the amount applies to
    pub user_id: String,
    /// Owning family
    pub family_id: String,
    /// Category of the entry
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Signed token amount
    pub amount: i64,
    /// Human-readable description
    pub description: String,
    /// When the transaction was written
    pub created_at: NaiveDateTime,
}

impl Transaction {
    /// Create a new transaction entry
    pub fn new(
        user_id: String,
        family_id: String,
        kind: TransactionKind,
        amount: i64,
        description: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            family_id,
            kind,
            amount,
            description,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Errors that can occur in the allowance ledger
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("balance not found for user: {0}")]
    BalanceNotFound(String),
    #[error("chore not found: {0}")]
    ChoreNotFound(String),
    #[error("store item not found: {0}")]
    StoreItemNotFound(String),
    #[error("fine not found: {0}")]
    FineNotFound(String),
    #[error("insufficient funds: balance {available} cannot cover {required}")]
    InsufficientFunds { available: i64, required: i64 },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("validation error: {0}")]
    Validation(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
