//! Family management: children, chores, store items, and fines
//!
//! The command surface a parent's UI drives. Everything here is plain
//! document CRUD; token movement is the engine's job.

use tracing::info;

use crate::traits::FamilyStore;
use crate::types::*;
use crate::utils::validation::{validate_id, validate_name, validate_non_negative};

/// Fields for creating a chore
#[derive(Debug, Clone)]
pub struct ChoreSpec {
    pub title: String,
    pub description: String,
    pub reward_tokens: i64,
    pub assigned_to: String,
}

/// Partial update to a chore
///
/// Status is deliberately absent: completion goes through
/// [`crate::ledger::LedgerEngine::complete_chore`] so the reward cannot
/// be skipped or doubled.
#[derive(Debug, Clone, Default)]
pub struct ChorePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub reward_tokens: Option<i64>,
    pub assigned_to: Option<String>,
}

/// Manager for a family's documents
#[derive(Debug, Clone)]
pub struct FamilyManager<S: FamilyStore> {
    store: S,
}

impl<S: FamilyStore> FamilyManager<S> {
    /// Create a new manager over the given store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Add a child to a family, with a zero balance
    pub async fn add_child(&self, family_id: &str, name: &str) -> LedgerResult<User> {
        validate_name(name)?;
        let child = User::new_child(family_id.to_string(), name.to_string());
        self.store.save_user(&child).await?;
        self.store.create_balance(&child.id).await?;
        info!(family_id, child = %child.id, "child added");
        Ok(child)
    }

    /// Delete a child and cascade to their balance
    ///
    /// The transaction log is append-only and is left in place.
    pub async fn delete_child(&self, child_id: &str) -> LedgerResult<()> {
        validate_id(child_id)?;
        self.store.delete_user(child_id).await?;
        match self.store.delete_balance(child_id).await {
            Ok(()) | Err(LedgerError::BalanceNotFound(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// List a family's children
    pub async fn children(&self, family_id: &str) -> LedgerResult<Vec<User>> {
        self.store.list_children(family_id).await
    }

    /// Record a child's external wallet and token mint addresses
    pub async fn set_wallet(
        &self,
        child_id: &str,
        wallet_address: Option<String>,
        token_mint_address: Option<String>,
    ) -> LedgerResult<User> {
        validate_id(child_id)?;
        let mut user = self
            .store
            .get_user(child_id)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(child_id.to_string()))?;
        user.wallet_address = wallet_address;
        user.token_mint_address = token_mint_address;
        self.store.save_user(&user).await?;
        Ok(user)
    }

    /// Create a pending chore
    pub async fn add_chore(&self, family_id: &str, spec: ChoreSpec) -> LedgerResult<Chore> {
        validate_name(&spec.title)?;
        validate_non_negative(spec.reward_tokens, "chore reward")?;
        let chore = Chore::new(
            family_id.to_string(),
            spec.title,
            spec.description,
            spec.reward_tokens,
            spec.assigned_to,
        );
        self.store.save_chore(&chore).await?;
        Ok(chore)
    }

    /// Patch a chore's editable fields
    pub async fn update_chore(&self, chore_id: &str, patch: ChorePatch) -> LedgerResult<Chore> {
        validate_id(chore_id)?;
        let mut chore = self
            .store
            .get_chore(chore_id)
            .await?
            .ok_or_else(|| LedgerError::ChoreNotFound(chore_id.to_string()))?;

        if let Some(title) = patch.title {
            validate_name(&title)?;
            chore.title = title;
        }
        if let Some(description) = patch.description {
            chore.description = description;
        }
        if let Some(reward) = patch.reward_tokens {
            validate_non_negative(reward, "chore reward")?;
            chore.reward_tokens = reward;
        }
        if let Some(assigned_to) = patch.assigned_to {
            chore.assigned_to = assigned_to;
        }

        self.store.save_chore(&chore).await?;
        Ok(chore)
    }

    /// Delete a chore
    pub async fn delete_chore(&self, chore_id: &str) -> LedgerResult<()> {
        validate_id(chore_id)?;
        self.store.delete_chore(chore_id).await
    }

    /// List a family's chores, optionally for one assignee
    pub async fn chores(
        &self,
        family_id: &str,
        assigned_to: Option<&str>,
    ) -> LedgerResult<Vec<Chore>> {
        self.store.list_chores(family_id, assigned_to).await
    }

    /// Create a store item
    pub async fn add_store_item(
        &self,
        family_id: &str,
        name: &str,
        description: &str,
        price: i64,
    ) -> LedgerResult<StoreItem> {
        validate_name(name)?;
        validate_non_negative(price, "item price")?;
        let item = StoreItem::new(
            family_id.to_string(),
            name.to_string(),
            description.to_string(),
            price,
        );
        self.store.save_store_item(&item).await?;
        Ok(item)
    }

    /// Delete a store item
    pub async fn delete_store_item(&self, item_id: &str) -> LedgerResult<()> {
        validate_id(item_id)?;
        self.store.delete_store_item(item_id).await
    }

    /// List a family's store items
    pub async fn store_items(&self, family_id: &str) -> LedgerResult<Vec<StoreItem>> {
        self.store.list_store_items(family_id).await
    }

    /// Create a fine template
    pub async fn add_fine(
        &self,
        family_id: &str,
        reason: &str,
        deduction: i64,
    ) -> LedgerResult<Fine> {
        validate_name(reason)?;
        validate_non_negative(deduction, "fine deduction")?;
        let fine = Fine::new(family_id.to_string(), reason.to_string(), deduction);
        self.store.save_fine(&fine).await?;
        Ok(fine)
    }

    /// Delete a fine template
    pub async fn delete_fine(&self, fine_id: &str) -> LedgerResult<()> {
        validate_id(fine_id)?;
        self.store.delete_fine(fine_id).await
    }

    /// List a family's fine templates
    pub async fn fines(&self, family_id: &str) -> LedgerResult<Vec<Fine>> {
        self.store.list_fines(family_id).await
    }
}
