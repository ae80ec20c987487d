//! Biometric Keyring Library
//!
//! Keyring adapter that lets a wallet treat a biometric hardware device as a
//! source of accounts and signatures.
//!
//! # Architecture
//!
//! This crate provides:
//! - **wallet**: Derivation path resolution, coin types, address normalization
//! - **tx**: Transaction input shapes, device signing requests, signed payload decoding
//! - **device**: The device service boundary, response envelopes, error normalization
//! - **keyring**: The keyring interface and the biometric implementation
//! - **config**: Construction options
//!
//! # Security
//!
//! No private key material exists in this process. Every signature comes from
//! the device, and the keyring checks that the device signed with the
//! requested address before returning it.
//!
//! # Example
//!
//! ```rust,ignore
//! use biometric_keyring::{BiometricKeyring, Keyring, KeyringOptions};
//!
//! let keyring = BiometricKeyring::new(device, KeyringOptions::default())?;
//! let address = keyring.unlock().await?;
//! let signature = keyring.sign_personal_message(&address, "0x68656c6c6f").await?;
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod keyring;
pub mod tx;
pub mod types;
pub mod utils;
pub mod wallet;

// Re-export key types for convenience
pub use config::KeyringOptions;
pub use device::{DeviceService, PopupGuard, TypedDataPayload};
pub use error::{ErrorCode, KeyringError, KeyringResult};
pub use keyring::{BiometricKeyring, Keyring, KeyringSnapshot};
pub use tx::{LegacyTransaction, SignedTransaction, SigningRequest, TransactionInput, TxType, TypedTransactionInput};
pub use types::*;
pub use wallet::{resolve_path, CoinType, DerivationPath, DEFAULT_PATH_TEMPLATE};

#[cfg(feature = "simulation")]
pub use device::simulation::SimulatedDevice;
