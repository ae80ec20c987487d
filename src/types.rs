//! Shared types for the keyring
//!
//! Data structures that cross module boundaries are defined here
//! for consistent serialization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Keyring type tag reported to the host wallet
pub const KEYRING_TYPE: &str = "Biometric Hardware";

/// Human-readable device model
pub const DEVICE_MODEL: &str = "Biometric Wallet";

/// One row of an account page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEntry {
    pub address: String,
    /// Balances are never fetched by the keyring
    pub balance: Option<String>,
    pub index: u32,
}

impl AccountEntry {
    pub fn new(address: impl Into<String>, index: u32) -> Self {
        Self {
            address: address.into(),
            balance: None,
            index,
        }
    }
}

/// `eth_signTypedData` variant requested by the dapp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignTypedDataVersion {
    V1,
    V3,
    #[default]
    V4,
}

impl fmt::Display for SignTypedDataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignTypedDataVersion::V1 => write!(f, "V1"),
            SignTypedDataVersion::V3 => write!(f, "V3"),
            SignTypedDataVersion::V4 => write!(f, "V4"),
        }
    }
}

/// Options accepted by typed-data signing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypedDataOptions {
    pub version: SignTypedDataVersion,
}

impl TypedDataOptions {
    pub fn new(version: SignTypedDataVersion) -> Self {
        Self { version }
    }
}
