//! Keyring Module
//!
//! The wallet-facing keyring interface and its biometric hardware
//! implementation:
//! - Lifecycle: unlock, account listing, forget
//! - Transaction, personal message and typed-data signing
//! - Snapshot serialization
//!
//! A keyring exposes exactly one account. All signing is delegated to the
//! device; the keyring verifies that the device signed with the requested
//! address before handing anything back.

mod biometric;
mod snapshot;
mod state;

pub use biometric::*;
pub use snapshot::*;
pub use state::{SessionState, SINGLE_ACCOUNT_INDEX};

use crate::error::KeyringResult;
use crate::tx::{SignedTransaction, TransactionInput};
use crate::types::{AccountEntry, TypedDataOptions};
use async_trait::async_trait;

/// Common keyring interface consumed by the host wallet
#[async_trait]
pub trait Keyring: Send + Sync {
    /// Keyring type tag
    fn keyring_type(&self) -> &'static str;

    /// True once an address has been retrieved from the device
    fn is_unlocked(&self) -> bool;

    /// Retrieve (or return the cached) device address
    async fn unlock(&self) -> KeyringResult<String>;

    /// Unlock and expose the single account. `n` is accepted for interface
    /// compatibility; only one account is ever added.
    async fn add_accounts(&self, n: usize) -> KeyringResult<Vec<String>>;

    async fn get_first_page(&self) -> KeyringResult<Vec<AccountEntry>>;
    async fn get_next_page(&self) -> KeyringResult<Vec<AccountEntry>>;
    async fn get_previous_page(&self) -> KeyringResult<Vec<AccountEntry>>;

    /// Copy of the exposed accounts; no device I/O
    fn get_accounts(&self) -> Vec<String>;

    /// Remove an exposed account (case-insensitive match)
    fn remove_account(&self, address: &str) -> KeyringResult<()>;

    async fn sign_transaction(
        &self,
        address: &str,
        tx: TransactionInput,
    ) -> KeyringResult<SignedTransaction>;

    async fn sign_personal_message(&self, address: &str, message: &str) -> KeyringResult<String>;

    /// Alias of [`Keyring::sign_personal_message`]
    async fn sign_message(&self, address: &str, message: &str) -> KeyringResult<String> {
        self.sign_personal_message(address, message).await
    }

    async fn sign_typed_data(
        &self,
        address: &str,
        typed_data: serde_json::Value,
        options: TypedDataOptions,
    ) -> KeyringResult<String>;

    /// Always fails: private keys never leave the device
    async fn export_account(&self, address: &str) -> KeyringResult<String>;

    fn serialize(&self) -> KeyringSnapshot;

    fn deserialize(&self, snapshot: &KeyringSnapshot) -> KeyringResult<()>;

    /// Drop all cached accounts and return to the locked state
    fn forget(&self);
}
