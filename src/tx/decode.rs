//! Signed Transaction Decoding
//!
//! Decodes the device's signed payload to recover who actually signed it,
//! and builds the value handed back to the caller.

use super::input::LegacyTransaction;
use crate::error::{KeyringError, KeyringResult};
use ethers_core::types::{Address, Bytes, Transaction};

/// Signed payload decoded with its recovered sender
#[derive(Debug, Clone)]
pub struct DecodedTransaction {
    pub transaction: Transaction,
    pub sender: Address,
}

/// Decode a hex-encoded signed transaction (legacy RLP list or typed envelope)
pub fn decode_signed_transaction(signed_hex: &str) -> KeyringResult<DecodedTransaction> {
    let raw = hex::decode(strip_hex_prefix(signed_hex))?;
    if raw.is_empty() {
        return Err(KeyringError::InvalidTransaction(
            "device returned an empty signed transaction".to_string(),
        ));
    }

    let transaction: Transaction = rlp::decode(&raw)
        .map_err(|e| KeyringError::InvalidTransaction(format!("RLP decode failed: {}", e)))?;
    let sender = transaction
        .recover_from()
        .map_err(|e| KeyringError::InvalidTransaction(format!("Sender recovery failed: {}", e)))?;

    Ok(DecodedTransaction { transaction, sender })
}

/// Decode a device hex field into raw bytes, padding odd-length input
pub fn hex_field_bytes(value: &str) -> KeyringResult<Bytes> {
    let stripped = strip_hex_prefix(value);
    let bytes = if stripped.len() % 2 == 1 {
        hex::decode(format!("0{}", stripped))?
    } else {
        hex::decode(stripped)?
    };
    Ok(Bytes::from(bytes))
}

fn strip_hex_prefix(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}

/// Result of a successful transaction signing
#[derive(Debug, Clone)]
pub enum SignedTransaction {
    /// The caller's legacy transaction with the device's v/r/s applied
    Legacy(LegacyTransaction),
    /// The decoded typed transaction
    Typed(Box<Transaction>),
}

impl SignedTransaction {
    /// Apply raw v/r/s returned by the device onto a legacy transaction
    pub fn legacy_with_signature(
        mut tx: LegacyTransaction,
        sign_v: &str,
        sign_r: &str,
        sign_s: &str,
    ) -> KeyringResult<Self> {
        tx.v = hex_field_bytes(sign_v)?;
        tx.r = hex_field_bytes(sign_r)?;
        tx.s = hex_field_bytes(sign_s)?;
        Ok(SignedTransaction::Legacy(tx))
    }

    pub fn as_legacy(&self) -> Option<&LegacyTransaction> {
        match self {
            SignedTransaction::Legacy(tx) => Some(tx),
            SignedTransaction::Typed(_) => None,
        }
    }

    pub fn as_typed(&self) -> Option<&Transaction> {
        match self {
            SignedTransaction::Legacy(_) => None,
            SignedTransaction::Typed(tx) => Some(tx),
        }
    }
}
