//! Simulated Device
//!
//! In-process stand-in for the hardware device. It holds a single local
//! secp256k1 key and answers every path with it, so the keyring's request
//! translation and signer verification can be exercised without hardware.
//!
//! Typed data is signed as a personal message over its canonical JSON; the
//! simulation does not implement EIP-712 hashing.

use super::{
    AddressParameter, DeviceResponse, DeviceResult, DeviceService, SignatureParameter,
    SignedTransactionParameter, TypedDataPayload,
};
use crate::error::{KeyringError, KeyringResult};
use crate::tx::{SigningRequest, TxType};
use crate::wallet::{checksum_address, parse_address, CoinType};
use async_trait::async_trait;
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{
    Address, Bytes, Eip1559TransactionRequest, Eip2930TransactionRequest, Signature,
    TransactionRequest, U256,
};
use ethers_signers::{LocalWallet, Signer};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Well-known development key (first account of the standard test mnemonic)
pub const DEV_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Simulated device backed by a local key
pub struct SimulatedDevice {
    wallet: LocalWallet,
    popups_closed: AtomicUsize,
}

impl SimulatedDevice {
    /// Simulated device using [`DEV_PRIVATE_KEY`]
    pub fn with_dev_key() -> KeyringResult<Self> {
        Self::from_private_key(DEV_PRIVATE_KEY)
    }

    pub fn from_private_key(private_key_hex: &str) -> KeyringResult<Self> {
        let wallet = LocalWallet::from_str(private_key_hex.trim_start_matches("0x"))
            .map_err(|e| KeyringError::Serialization(format!("invalid simulation key: {}", e)))?;
        Ok(Self {
            wallet,
            popups_closed: AtomicUsize::new(0),
        })
    }

    /// Checksummed address of the simulated key
    pub fn address(&self) -> String {
        checksum_address(&self.wallet.address())
    }

    /// Number of popup-close notifications received
    pub fn popups_closed(&self) -> usize {
        self.popups_closed.load(Ordering::SeqCst)
    }

    fn build_transaction(request: &SigningRequest) -> Result<TypedTransaction, String> {
        let nonce = parse_quantity(&request.nonce)?;
        let gas = parse_quantity(&request.gas_limit)?;
        let value = parse_quantity(&request.value)?;
        let data = parse_data(&request.data)?;
        let to = parse_destination(&request.to)?;
        let access_list = request.options.access_list.clone().unwrap_or_default();

        let typed = match request.tx_type {
            TxType::Legacy | TxType::AccessList => {
                let mut tx = TransactionRequest::new()
                    .gas(gas)
                    .value(value)
                    .data(data)
                    .nonce(nonce)
                    .chain_id(request.chain_id);
                if let Some(to) = to {
                    tx = tx.to(to);
                }
                if let Some(gas_price) = &request.gas_price {
                    tx = tx.gas_price(parse_quantity(gas_price)?);
                }
                if request.tx_type == TxType::AccessList {
                    TypedTransaction::Eip2930(Eip2930TransactionRequest::new(tx, access_list))
                } else {
                    TypedTransaction::Legacy(tx)
                }
            }
            TxType::FeeMarket => {
                let mut tx = Eip1559TransactionRequest::new()
                    .gas(gas)
                    .value(value)
                    .data(data)
                    .nonce(nonce)
                    .chain_id(request.chain_id)
                    .access_list(access_list);
                if let Some(to) = to {
                    tx = tx.to(to);
                }
                if let Some(fee) = &request.options.max_priority_fee_per_gas {
                    tx = tx.max_priority_fee_per_gas(parse_quantity(fee)?);
                }
                if let Some(fee) = &request.options.max_fee_per_gas {
                    tx = tx.max_fee_per_gas(parse_quantity(fee)?);
                }
                TypedTransaction::Eip1559(tx)
            }
        };
        Ok(typed)
    }

    async fn sign_bytes(&self, message: &[u8]) -> DeviceResult<SignatureParameter> {
        match self.wallet.sign_message(message).await {
            Ok(signature) => Ok(DeviceResponse::success(SignatureParameter {
                address: self.address(),
                signature: format!("0x{}", hex::encode(signature.to_vec())),
            })),
            Err(e) => Ok(DeviceResponse::error("sign_failed", e.to_string())),
        }
    }
}

#[async_trait]
impl DeviceService for SimulatedDevice {
    async fn get_address(&self, coin_type: CoinType, path: &str) -> DeviceResult<AddressParameter> {
        debug!(%coin_type, path, "simulated getAddress");
        if coin_type != CoinType::Ethereum {
            return Ok(DeviceResponse::error(
                "coin_type_not_supported",
                format!("{} is not available on the simulated device", coin_type),
            ));
        }
        Ok(DeviceResponse::success(AddressParameter {
            address: self.address(),
        }))
    }

    async fn get_signed_transaction(
        &self,
        coin_type: CoinType,
        request: &SigningRequest,
        path: &str,
    ) -> DeviceResult<SignedTransactionParameter> {
        debug!(%coin_type, path, tx_type = %request.tx_type, "simulated getSignedTransaction");
        let tx = match Self::build_transaction(request) {
            Ok(tx) => tx,
            Err(message) => return Ok(DeviceResponse::error("invalid_parameter", message)),
        };
        let signature: Signature = match self.wallet.sign_transaction(&tx).await {
            Ok(signature) => signature,
            Err(e) => return Ok(DeviceResponse::error("sign_failed", e.to_string())),
        };
        let signed = tx.rlp_signed(&signature);

        Ok(DeviceResponse::success(SignedTransactionParameter {
            signed: hex::encode(&signed),
            sign_v: format!("0x{:02x}", signature.v),
            sign_r: format!("0x{}", hex::encode(u256_bytes(signature.r))),
            sign_s: format!("0x{}", hex::encode(u256_bytes(signature.s))),
        }))
    }

    async fn get_signed_message(&self, message: &str, path: &str) -> DeviceResult<SignatureParameter> {
        debug!(path, message_len = message.len(), "simulated getSignedMessage");
        let bytes = match message.strip_prefix("0x") {
            Some(body) => match hex::decode(body) {
                Ok(bytes) => bytes,
                Err(e) => return Ok(DeviceResponse::error("invalid_parameter", e.to_string())),
            },
            None => message.as_bytes().to_vec(),
        };
        self.sign_bytes(&bytes).await
    }

    async fn get_signed_data(
        &self,
        path: &str,
        data: &TypedDataPayload,
    ) -> DeviceResult<SignatureParameter> {
        debug!(path, version = %data.version, "simulated getSignedData");
        let canonical = match serde_json::to_vec(&data.payload) {
            Ok(bytes) => bytes,
            Err(e) => return Ok(DeviceResponse::error("invalid_parameter", e.to_string())),
        };
        self.sign_bytes(&canonical).await
    }

    fn close_popup(&self) {
        self.popups_closed.fetch_add(1, Ordering::SeqCst);
    }
}

fn parse_quantity(value: &str) -> Result<U256, String> {
    let body = value.trim_start_matches("0x");
    if body.is_empty() {
        return Err(format!("bare quantity '{}'", value));
    }
    U256::from_str_radix(body, 16).map_err(|e| format!("invalid quantity '{}': {}", value, e))
}

fn parse_data(value: &str) -> Result<Bytes, String> {
    hex::decode(value.trim_start_matches("0x"))
        .map(Bytes::from)
        .map_err(|e| format!("invalid data '{}': {}", value, e))
}

fn parse_destination(value: &str) -> Result<Option<Address>, String> {
    if value.trim_start_matches("0x").is_empty() {
        return Ok(None);
    }
    parse_address(value)
        .map(Some)
        .map_err(|e| format!("invalid destination: {}", e))
}

fn u256_bytes(value: U256) -> [u8; 32] {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    buf
}
