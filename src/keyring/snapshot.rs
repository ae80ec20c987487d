//! Serialized keyring state
//!
//! The snapshot carries enough to rebuild an equivalent keyring without
//! contacting the device: path and coin type are re-derived from the
//! template on restore.

use super::state::SessionState;
use crate::error::KeyringResult;
use crate::wallet::DEFAULT_PATH_TEMPLATE;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyringSnapshot {
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub cached_addresses: Vec<String>,
    #[serde(default = "default_template")]
    pub path_template: String,
    #[serde(default)]
    pub unlocked_account_index: u32,
}

fn default_template() -> String {
    DEFAULT_PATH_TEMPLATE.to_string()
}

impl KeyringSnapshot {
    pub fn from_json(json: &str) -> KeyringResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> KeyringResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub(crate) fn capture(state: &SessionState) -> Self {
        Self {
            accounts: state.accounts.clone(),
            cached_addresses: state.cached_addresses.clone(),
            path_template: state.path_template.clone(),
            unlocked_account_index: state.unlocked_account,
        }
    }

    pub(crate) fn restore(&self) -> KeyringResult<SessionState> {
        let mut state = SessionState::new(
            &self.path_template,
            self.accounts.clone(),
            self.cached_addresses.clone(),
        )?;
        state.unlocked_account = self.unlocked_account_index;
        Ok(state)
    }
}
