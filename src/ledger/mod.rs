//! Ledger module containing the token ledger engine and family management

pub mod engine;
pub mod family;

pub use engine::*;
pub use family::*;
