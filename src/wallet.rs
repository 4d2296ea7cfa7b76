//! Read-only view of an external cryptocurrency wallet balance
//!
//! The provider is a pure, potentially-failing external lookup. A
//! failure yields "unknown" (`None`) at the display boundary and never
//! touches ledger state.

use async_trait::async_trait;
use bigdecimal::num_bigint::BigInt;
use bigdecimal::BigDecimal;
use tracing::warn;

use crate::types::User;

/// Errors from the wallet provider
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("wallet provider unavailable: {0}")]
    Unavailable(String),
    #[error("invalid public key: {0}")]
    InvalidKey(String),
    #[error("no token account for mint {mint} under wallet {wallet}")]
    NoTokenAccount { wallet: String, mint: String },
}

/// Raw token amount as the external ledger stores it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTokenBalance {
    /// Integer amount in the mint's smallest unit
    pub amount: u64,
    /// Declared decimal precision of the mint
    pub decimals: u8,
}

impl RawTokenBalance {
    /// Decimal balance: `amount / 10^decimals`
    pub fn to_decimal(&self) -> BigDecimal {
        BigDecimal::new(BigInt::from(self.amount), i64::from(self.decimals))
    }
}

/// External wallet lookup
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Balance of the token account for `token_mint` under the wallet's
    /// public key
    async fn token_account_balance(
        &self,
        wallet_address: &str,
        token_mint: &str,
    ) -> Result<RawTokenBalance, WalletError>;
}

/// Resolve a user's displayable wallet balance
///
/// `None` means "unknown": the user has no wallet configured, or the
/// provider failed. Provider errors are logged and swallowed here; they
/// must never surface as a zero balance.
pub async fn display_balance<P: WalletProvider + ?Sized>(
    provider: &P,
    user: &User,
) -> Option<BigDecimal> {
    let wallet = user.wallet_address.as_deref()?;
    let mint = user.token_mint_address.as_deref()?;
    match provider.token_account_balance(wallet, mint).await {
        Ok(raw) => Some(raw.to_decimal()),
        Err(err) => {
            warn!(user = %user.id, "wallet balance read failed: {err}");
            None
        }
    }
}

/// Placeholder provider for environments without a wallet integration
///
/// Always unavailable, so every lookup resolves to "unknown".
#[derive(Debug, Clone, Copy, Default)]
pub struct StubWallet;

#[async_trait]
impl WalletProvider for StubWallet {
    async fn token_account_balance(
        &self,
        _wallet_address: &str,
        _token_mint: &str,
    ) -> Result<RawTokenBalance, WalletError> {
        Err(WalletError::Unavailable(
            "wallet provider not configured".to_string(),
        ))
    }
}
