//! Device Signing Request
//!
//! Normalizes either transaction shape into the flat hex-string parameter set
//! the device signs. The device rejects a bare `0x` quantity, so empty nonce
//! and value fields are sent as `0x0`.

use super::input::{LegacyTransaction, TransactionInput, TxType, TypedTransactionInput};
use ethers_core::types::transaction::eip2930::AccessList;
use serde::{Deserialize, Serialize};

/// Type-specific signing options
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedTxOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<AccessList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<String>,
}

impl TypedTxOptions {
    /// Options for `tx_type`: access list for type 1, access list and fee caps
    /// for type 2, nothing for type 0.
    pub fn for_type(tx_type: TxType, tx: &TypedTransactionInput) -> Self {
        match tx_type {
            TxType::Legacy => Self::default(),
            TxType::AccessList => Self {
                access_list: tx.access_list.clone(),
                ..Default::default()
            },
            TxType::FeeMarket => Self {
                access_list: tx.access_list.clone(),
                max_priority_fee_per_gas: tx.max_priority_fee_per_gas.clone(),
                max_fee_per_gas: tx.max_fee_per_gas.clone(),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_list.is_none()
            && self.max_priority_fee_per_gas.is_none()
            && self.max_fee_per_gas.is_none()
    }
}

/// Device-agnostic view of a transaction to sign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningRequest {
    pub nonce: String,
    /// Absent for fee-market transactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    pub gas_limit: String,
    pub to: String,
    pub value: String,
    pub data: String,
    pub chain_id: u64,
    #[serde(rename = "txType")]
    pub tx_type: TxType,
    pub options: TypedTxOptions,
}

impl SigningRequest {
    pub fn from_input(input: &TransactionInput) -> Self {
        match input {
            TransactionInput::Legacy(tx) => Self::from_legacy(tx),
            TransactionInput::Typed(tx) => Self::from_typed(tx),
        }
    }

    fn from_legacy(tx: &LegacyTransaction) -> Self {
        Self {
            nonce: normalize_quantity(to_hex(&tx.nonce)),
            gas_price: Some(to_hex(&tx.gas_price)),
            gas_limit: to_hex(&tx.gas_limit),
            to: to_hex(&tx.to),
            value: normalize_quantity(to_hex(&tx.value)),
            data: to_hex(&tx.data),
            chain_id: tx.chain_id(),
            tx_type: TxType::Legacy,
            options: TypedTxOptions::default(),
        }
    }

    fn from_typed(tx: &TypedTransactionInput) -> Self {
        Self {
            nonce: normalize_quantity(tx.nonce.clone()),
            gas_price: tx.gas_price.clone(),
            gas_limit: tx.gas_limit.clone(),
            to: tx
                .to
                .as_deref()
                .map(str::to_lowercase)
                .unwrap_or_else(|| "0x".to_string()),
            value: normalize_quantity(tx.value.clone()),
            data: tx.data.clone(),
            chain_id: tx.chain_id(),
            tx_type: tx.tx_type,
            options: TypedTxOptions::for_type(tx.tx_type, tx),
        }
    }
}

/// `0x`-prefixed lowercase hex of raw bytes; empty input yields `0x`
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Replace a bare `0x` quantity with `0x0`
pub fn normalize_quantity(value: String) -> String {
    if value == "0x" {
        "0x0".to_string()
    } else {
        value
    }
}
