//! Wallet Module
//!
//! Derivation-path resolution and address helpers shared by the keyring.

mod address;
mod derivation_path;

pub use address::*;
pub use derivation_path::*;
