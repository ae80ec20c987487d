//! Unified error types for the keyring
//!
//! Every device-layer failure is normalized into [`KeyringError`] before it
//! reaches the caller. [`ErrorCode`] gives a stable, serializable category for
//! hosts that pass errors across a JSON boundary.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main error type for all keyring operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyringError {
    /// The coin-type segment of the derivation path has no device identifier
    #[error("Not supported path: {0}")]
    UnsupportedPath(String),

    /// The device reported a structured failure
    #[error("{code} - {message}")]
    Device { code: String, message: String },

    /// The device did not answer within the configured window
    #[error("Device timeout after {}ms", .0.as_millis())]
    DeviceTimeout(Duration),

    /// The device layer failed without structured error information
    #[error("Unknown error - {0}")]
    UnknownDevice(String),

    #[error("Address {0} not found in this keyring")]
    AddressNotFound(String),

    /// The signer recovered from the device output is not the requested account
    #[error("signature doesn't match the right address (expected {expected}, got {actual})")]
    SignatureMismatch { expected: String, actual: String },

    #[error("Not supported on this device: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl KeyringError {
    pub fn device(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Device {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::SignatureMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Stable category for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedPath(_) => ErrorCode::UnsupportedPath,
            Self::Device { .. } => ErrorCode::DeviceError,
            Self::DeviceTimeout(_) => ErrorCode::DeviceTimeout,
            Self::UnknownDevice(_) => ErrorCode::UnknownDeviceError,
            Self::AddressNotFound(_) => ErrorCode::AddressNotFound,
            Self::SignatureMismatch { .. } => ErrorCode::SignatureMismatch,
            Self::UnsupportedOperation(_) => ErrorCode::UnsupportedOperation,
            Self::InvalidAddress(_) => ErrorCode::InvalidAddress,
            Self::InvalidTransaction(_) => ErrorCode::InvalidTransaction,
            Self::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    /// True when the failure originated on the device side of the boundary
    pub fn is_device_failure(&self) -> bool {
        matches!(
            self,
            Self::Device { .. } | Self::DeviceTimeout(_) | Self::UnknownDevice(_)
        )
    }
}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    UnsupportedPath,
    DeviceError,
    DeviceTimeout,
    UnknownDeviceError,
    AddressNotFound,
    SignatureMismatch,
    UnsupportedOperation,
    InvalidAddress,
    InvalidTransaction,
    SerializationError,
}

/// Result type alias for keyring operations
pub type KeyringResult<T> = Result<T, KeyringError>;

impl From<serde_json::Error> for KeyringError {
    fn from(e: serde_json::Error) -> Self {
        KeyringError::Serialization(e.to_string())
    }
}

impl From<hex::FromHexError> for KeyringError {
    fn from(e: hex::FromHexError) -> Self {
        KeyringError::InvalidTransaction(format!("Invalid hex: {}", e))
    }
}
