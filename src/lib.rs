//! # Allowance Core
//!
//! A family chore-and-allowance library built around an append-only
//! token ledger: parents define children, chores, store items, and
//! fines; children earn tokens by completing chores and spend them on
//! store redemptions.
//!
//! ## Features
//!
//! - **Token ledger**: balances always equal the sum of their user's
//!   transaction log; every mutation is an atomic balance-write plus
//!   log-append pair
//! - **Safe redemption**: concurrent redemptions against one balance
//!   serialize through the store's atomic scope, so a balance can never
//!   be double-spent
//! - **Idempotent chore rewards**: completing a chore credits its
//!   reward exactly once, however many times completion is invoked
//! - **Live queries**: long-lived subscriptions deliver fresh result
//!   set snapshots on every relevant change
//! - **Storage abstraction**: database-agnostic design with trait-based
//!   storage
//! - **Wallet view**: read-only decimal balance of an external
//!   cryptocurrency wallet, failing to "unknown" rather than zero
//!
//! ## Quick Start
//!
//! ```rust
//! use allowance_core::utils::MemoryStore;
//! use allowance_core::{FamilyManager, LedgerEngine};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let manager = FamilyManager::new(store.clone());
//! let engine = LedgerEngine::new(store);
//!
//! let child = manager.add_child("our-family", "Alice").await?;
//! let item = manager.add_store_item("our-family", "Ice Cream", "", 2).await?;
//! engine.credit(&child.id, 5, allowance_core::TransactionKind::Adjustment, "Pocket money").await?;
//! engine.redeem(&child.id, &item.id, 2).await?;
//! assert_eq!(engine.balance(&child.id).await?.amount, 3);
//! # Ok(())
//! # }
//! ```

pub mod ledger;
pub mod live;
pub mod traits;
pub mod types;
pub mod utils;
pub mod wallet;

// Re-export commonly used types
pub use ledger::*;
pub use live::{ChangeEvent, Collection, LiveCollection, LiveQuery, QueryFilter};
pub use traits::*;
pub use types::*;
pub use wallet::{RawTokenBalance, StubWallet, WalletError, WalletProvider};
