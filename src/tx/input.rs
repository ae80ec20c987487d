//! Transaction Input Shapes
//!
//! Hosts hand the keyring one of two transaction representations. The shape
//! is decided once, when the value is wrapped in [`TransactionInput`].
//!
//! - [`LegacyTransaction`]: raw big-endian byte fields with a dedicated chain id
//!   and signature slots that are filled in place after signing
//! - [`TypedTransactionInput`]: hex-string fields, a type tag (0, 1 or 2) and an
//!   embedded chain configuration

use crate::error::KeyringError;
use ethers_core::types::transaction::eip2930::AccessList;
use ethers_core::types::{Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// EIP-2718 transaction type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TxType {
    #[default]
    Legacy = 0,
    AccessList = 1,
    FeeMarket = 2,
}

impl TxType {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for TxType {
    type Error = KeyringError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(TxType::Legacy),
            1 => Ok(TxType::AccessList),
            2 => Ok(TxType::FeeMarket),
            other => Err(KeyringError::InvalidTransaction(format!(
                "unsupported transaction type {}",
                other
            ))),
        }
    }
}

impl From<TxType> for u8 {
    fn from(tx_type: TxType) -> Self {
        tx_type.as_u8()
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Minimal big-endian encoding of a quantity; zero encodes as an empty buffer
pub fn quantity_bytes(value: U256) -> Bytes {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    let first = buf.iter().position(|b| *b != 0).unwrap_or(buf.len());
    Bytes::from(buf[first..].to_vec())
}

/// Legacy transaction with raw byte fields
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTransaction {
    pub nonce: Bytes,
    pub gas_price: Bytes,
    pub gas_limit: Bytes,
    /// Empty for contract creation
    pub to: Bytes,
    pub value: Bytes,
    pub data: Bytes,
    pub v: Bytes,
    pub r: Bytes,
    pub s: Bytes,
    chain_id: u64,
}

impl LegacyTransaction {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            ..Default::default()
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = quantity_bytes(U256::from(nonce));
        self
    }

    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = quantity_bytes(gas_price);
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = quantity_bytes(U256::from(gas_limit));
        self
    }

    pub fn with_to(mut self, to: ethers_core::types::Address) -> Self {
        self.to = Bytes::from(to.as_bytes().to_vec());
        self
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = quantity_bytes(value);
        self
    }

    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    /// Placeholder signature slots expected before the device signs:
    /// `v` carries the chain id, `r` and `s` a single zero byte.
    pub fn prepare_for_signing(&mut self) {
        self.v = quantity_bytes(U256::from(self.chain_id));
        self.r = Bytes::from(vec![0u8]);
        self.s = Bytes::from(vec![0u8]);
    }

    pub fn is_signed(&self) -> bool {
        self.r.iter().any(|b| *b != 0) && self.s.iter().any(|b| *b != 0)
    }
}

/// Chain configuration embedded in typed transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub chain_id: u64,
}

/// Typed (EIP-2718) transaction with hex-string fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedTransactionInput {
    #[serde(rename = "type", default)]
    pub tx_type: TxType,
    pub nonce: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    pub gas_limit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub value: String,
    #[serde(default = "empty_hex")]
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<AccessList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<String>,
    pub common: ChainConfig,
}

fn empty_hex() -> String {
    "0x".to_string()
}

impl TypedTransactionInput {
    pub fn chain_id(&self) -> u64 {
        self.common.chain_id
    }
}

/// Transaction handed to the keyring for signing
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionInput {
    Legacy(LegacyTransaction),
    Typed(TypedTransactionInput),
}

impl TransactionInput {
    pub fn chain_id(&self) -> u64 {
        match self {
            TransactionInput::Legacy(tx) => tx.chain_id(),
            TransactionInput::Typed(tx) => tx.chain_id(),
        }
    }

    pub fn tx_type(&self) -> TxType {
        match self {
            TransactionInput::Legacy(_) => TxType::Legacy,
            TransactionInput::Typed(tx) => tx.tx_type,
        }
    }
}

impl From<LegacyTransaction> for TransactionInput {
    fn from(tx: LegacyTransaction) -> Self {
        TransactionInput::Legacy(tx)
    }
}

impl From<TypedTransactionInput> for TransactionInput {
    fn from(tx: TypedTransactionInput) -> Self {
        TransactionInput::Typed(tx)
    }
}
