//! Keyring Configuration
//!
//! Construction options for the keyring:
//! - Previously retrieved accounts and cached device addresses
//! - Derivation path template
//! - Device call timeout
//!
//! Options are plain serde data so a host can persist the same JSON blob it
//! passes to the constructor.

use crate::error::{KeyringError, KeyringResult};
use crate::wallet::DEFAULT_PATH_TEMPLATE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default device call timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(60_000);

/// Environment override for the path template
pub const ENV_HD_PATH: &str = "KEYRING_HD_PATH";

/// Environment override for the device timeout in milliseconds
pub const ENV_TIMEOUT_MS: &str = "KEYRING_TIMEOUT_MS";

/// Keyring construction options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyringOptions {
    /// Accounts already exposed to the wallet
    pub accounts: Vec<String>,
    /// Addresses previously retrieved from the device
    pub cached_addresses: Vec<String>,
    pub path_template: String,
    #[serde(rename = "timeoutMs", with = "duration_ms")]
    pub timeout: Duration,
}

impl Default for KeyringOptions {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            cached_addresses: Vec::new(),
            path_template: DEFAULT_PATH_TEMPLATE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl KeyringOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path_template(mut self, template: impl Into<String>) -> Self {
        self.path_template = template.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_json(json: &str) -> KeyringResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults with `KEYRING_HD_PATH` / `KEYRING_TIMEOUT_MS` overrides applied
    pub fn from_env() -> KeyringResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides read through `lookup`
    pub fn from_lookup<F>(lookup: F) -> KeyringResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        if let Some(template) = lookup(ENV_HD_PATH) {
            let template = template.trim();
            if template.is_empty() {
                return Err(KeyringError::Serialization(format!("{} is empty", ENV_HD_PATH)));
            }
            options.path_template = template.to_string();
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let millis: u64 = raw.trim().parse().map_err(|e| {
                KeyringError::Serialization(format!("{}='{}': {}", ENV_TIMEOUT_MS, raw, e))
            })?;
            if millis == 0 {
                return Err(KeyringError::Serialization(format!(
                    "{} must be greater than zero",
                    ENV_TIMEOUT_MS
                )));
            }
            options.timeout = Duration::from_millis(millis);
        }

        Ok(options)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
