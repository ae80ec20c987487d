//! Key Derivation Path Resolution
//!
//! Turns a path template such as `m/44'/60'/0'/0/0` into the fixed
//! five-segment path the device expects, and maps the coin-type segment to
//! the device's coin identifier.
//!
//! Rules:
//! - Empty segments are ignored and at most five segments after the root are used
//! - A missing segment takes the account index at the first missing position,
//!   then `0` for the rest
//! - Purpose, coin type and account (positions 1-3) are always hardened

use crate::error::{KeyringError, KeyringResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default template used when none is configured
pub const DEFAULT_PATH_TEMPLATE: &str = "m/44'/60'/0'/0/0";

/// Number of segments after the root marker
pub const PATH_DEPTH: usize = 5;

/// 1-indexed positions that are always hardened
const HARDENED_POSITIONS: [usize; 3] = [1, 2, 3];

/// Hardened offset for BIP-32 derivation
pub const HARDENED: u32 = 0x80000000;

/// Coin types from SLIP-0044 the device understands
pub mod coin_types {
    pub const BITCOIN: u32 = 0;
    pub const BITCOIN_TESTNET: u32 = 1;
    pub const MONACOIN: u32 = 22;
    pub const ETHEREUM: u32 = 60;
    pub const RSK: u32 = 137;
    pub const RIPPLE: u32 = 144;
    pub const KLAYTN: u32 = 8217;
}

/// Device-side coin identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoinType {
    #[serde(rename = "BITCOIN")]
    Bitcoin,
    #[serde(rename = "BITCOIN-TESTNET")]
    BitcoinTestnet,
    #[serde(rename = "ETHEREUM")]
    Ethereum,
    #[serde(rename = "RSK")]
    Rsk,
    #[serde(rename = "RIPPLE")]
    Ripple,
    #[serde(rename = "MONACOIN")]
    Monacoin,
    #[serde(rename = "KLAYTN")]
    Klaytn,
}

impl CoinType {
    /// Map a SLIP-0044 coin-type index to the device identifier
    pub fn from_slip44(index: u32) -> KeyringResult<Self> {
        match index {
            coin_types::BITCOIN => Ok(CoinType::Bitcoin),
            coin_types::BITCOIN_TESTNET => Ok(CoinType::BitcoinTestnet),
            coin_types::ETHEREUM => Ok(CoinType::Ethereum),
            coin_types::RSK => Ok(CoinType::Rsk),
            coin_types::RIPPLE => Ok(CoinType::Ripple),
            coin_types::MONACOIN => Ok(CoinType::Monacoin),
            coin_types::KLAYTN => Ok(CoinType::Klaytn),
            other => Err(KeyringError::UnsupportedPath(format!(
                "coin type {} has no device identifier",
                other
            ))),
        }
    }

    pub fn slip44(&self) -> u32 {
        match self {
            CoinType::Bitcoin => coin_types::BITCOIN,
            CoinType::BitcoinTestnet => coin_types::BITCOIN_TESTNET,
            CoinType::Ethereum => coin_types::ETHEREUM,
            CoinType::Rsk => coin_types::RSK,
            CoinType::Ripple => coin_types::RIPPLE,
            CoinType::Monacoin => coin_types::MONACOIN,
            CoinType::Klaytn => coin_types::KLAYTN,
        }
    }

    /// Identifier string as the device names it
    pub fn as_str(&self) -> &'static str {
        match self {
            CoinType::Bitcoin => "BITCOIN",
            CoinType::BitcoinTestnet => "BITCOIN-TESTNET",
            CoinType::Ethereum => "ETHEREUM",
            CoinType::Rsk => "RSK",
            CoinType::Ripple => "RIPPLE",
            CoinType::Monacoin => "MONACOIN",
            CoinType::Klaytn => "KLAYTN",
        }
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single component of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivationComponent {
    pub index: u32,
    pub hardened: bool,
}

impl DerivationComponent {
    pub fn new(index: u32, hardened: bool) -> Self {
        Self { index, hardened }
    }

    /// Get the full index including hardened bit
    pub fn full_index(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED
        } else {
            self.index
        }
    }
}

impl fmt::Display for DerivationComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// Fully qualified five-segment path: purpose / coin type / account / change / index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivationPath {
    components: [DerivationComponent; PATH_DEPTH],
}

impl DerivationPath {
    pub fn components(&self) -> &[DerivationComponent; PATH_DEPTH] {
        &self.components
    }

    pub fn purpose(&self) -> u32 {
        self.components[0].index
    }

    pub fn coin_type_index(&self) -> u32 {
        self.components[1].index
    }

    pub fn account(&self) -> u32 {
        self.components[2].index
    }

    pub fn change(&self) -> u32 {
        self.components[3].index
    }

    pub fn address_index(&self) -> u32 {
        self.components[4].index
    }

    /// BIP-32 child numbers with the hardened bit applied
    pub fn to_child_numbers(&self) -> [u32; PATH_DEPTH] {
        self.components.map(|c| c.full_index())
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

/// Resolve a path template for `account_index` into the device path and coin type.
///
/// Pure and deterministic. Fails with [`KeyringError::UnsupportedPath`] when
/// the template is malformed or its coin type is not in the device table.
pub fn resolve_path(template: &str, account_index: u32) -> KeyringResult<(DerivationPath, CoinType)> {
    let pieces: Vec<&str> = template
        .split('/')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect();

    match pieces.first() {
        Some(root) if root.eq_ignore_ascii_case("m") => {}
        _ => {
            return Err(KeyringError::UnsupportedPath(format!(
                "derivation path '{}' must start with 'm'",
                template
            )))
        }
    }

    // pieces[0] is the root marker, so template segment N lives at pieces[N]
    let mut components = [DerivationComponent::new(0, false); PATH_DEPTH];
    for (slot, position) in components.iter_mut().zip(1..=PATH_DEPTH) {
        let mut component = if position < pieces.len() {
            parse_component(pieces[position])?
        } else if position == pieces.len() {
            DerivationComponent::new(account_index, false)
        } else {
            DerivationComponent::new(0, false)
        };
        if HARDENED_POSITIONS.contains(&position) {
            component.hardened = true;
        }
        *slot = component;
    }

    let path = DerivationPath { components };
    let coin_type = CoinType::from_slip44(path.coin_type_index())?;
    Ok((path, coin_type))
}

/// Parse a single path component
fn parse_component(s: &str) -> KeyringResult<DerivationComponent> {
    let (number_str, hardened) = match s.strip_suffix(&['\'', 'h', 'H'][..]) {
        Some(stripped) => (stripped, true),
        None => (s, false),
    };

    let index: u32 = number_str.parse().map_err(|e| {
        KeyringError::UnsupportedPath(format!("Invalid path component '{}': {}", s, e))
    })?;

    if index >= HARDENED {
        return Err(KeyringError::UnsupportedPath(format!(
            "Path component {} exceeds maximum value",
            index
        )));
    }

    Ok(DerivationComponent::new(index, hardened))
}
