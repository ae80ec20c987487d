//! Session state owned by one keyring instance

use crate::error::{KeyringError, KeyringResult};
use crate::types::AccountEntry;
use crate::wallet::{resolve_path, same_address, CoinType, DerivationPath};

/// Index of the only account this keyring exposes
pub const SINGLE_ACCOUNT_INDEX: u32 = 0;

/// Mutable state behind the keyring's lock.
///
/// Path and coin type are resolved from the template once and never change
/// for the lifetime of the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub(crate) path_template: String,
    pub(crate) path: DerivationPath,
    pub(crate) coin_type: CoinType,
    pub(crate) accounts: Vec<String>,
    pub(crate) cached_addresses: Vec<String>,
    pub(crate) unlocked_account: u32,
    pub(crate) page: u32,
}

impl SessionState {
    pub fn new(
        path_template: &str,
        accounts: Vec<String>,
        cached_addresses: Vec<String>,
    ) -> KeyringResult<Self> {
        let (path, coin_type) = resolve_path(path_template, SINGLE_ACCOUNT_INDEX)?;
        Ok(Self {
            path_template: path_template.to_string(),
            path,
            coin_type,
            accounts,
            cached_addresses,
            unlocked_account: 0,
            page: 0,
        })
    }

    pub fn is_unlocked(&self) -> bool {
        !self.cached_addresses.is_empty()
    }

    /// Address retrieved from the device, if any
    pub fn cached_address(&self) -> Option<&str> {
        self.cached_addresses.first().map(String::as_str)
    }

    /// Record the device address; a repeated unlock writes the same value
    pub fn cache_address(&mut self, address: &str) {
        self.cached_addresses = vec![address.to_string()];
    }

    pub fn account_page(&self) -> Vec<AccountEntry> {
        self.cached_address()
            .map(|address| vec![AccountEntry::new(address, SINGLE_ACCOUNT_INDEX)])
            .unwrap_or_default()
    }

    pub fn remove_account(&mut self, address: &str) -> KeyringResult<()> {
        let before = self.accounts.len();
        self.accounts.retain(|account| !same_address(account, address));
        if self.accounts.len() == before {
            return Err(KeyringError::AddressNotFound(address.to_string()));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.accounts.clear();
        self.cached_addresses.clear();
        self.unlocked_account = 0;
        self.page = 0;
    }
}
