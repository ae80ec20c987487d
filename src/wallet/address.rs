//! EVM address parsing and EIP-55 normalization

use crate::error::{KeyringError, KeyringResult};
use ethers_core::types::Address;
use ethers_core::utils::to_checksum;

/// Parse a `0x`-prefixed 20-byte hex address, any casing accepted
pub fn parse_address(address: &str) -> KeyringResult<Address> {
    let trimmed = address.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| KeyringError::InvalidAddress(format!("{} (missing 0x prefix)", address)))?;

    if body.len() != 40 {
        return Err(KeyringError::InvalidAddress(format!(
            "{} (expected 40 hex characters, got {})",
            address,
            body.len()
        )));
    }

    let bytes = hex::decode(body)
        .map_err(|e| KeyringError::InvalidAddress(format!("{} ({})", address, e)))?;
    Ok(Address::from_slice(&bytes))
}

/// EIP-55 checksummed form of `address`
pub fn checksum_address(address: &Address) -> String {
    to_checksum(address, None)
}

/// Parse and re-render `address` in checksummed form
pub fn normalize_address(address: &str) -> KeyringResult<String> {
    parse_address(address).map(|parsed| checksum_address(&parsed))
}

/// Case-insensitive address equality
pub fn same_address(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
