//! Device Service Boundary
//!
//! The hardware device is an external collaborator reached through
//! [`DeviceService`]. Transport, firmware protocol and the cryptography all
//! live behind it; the keyring only translates requests and responses.
//!
//! Every call goes through [`settle`], which applies the configured timeout
//! and normalizes failures into [`KeyringError`], and is paired with a
//! [`PopupGuard`] so the device popup is closed on every exit path.

mod response;
#[cfg(feature = "simulation")]
pub mod simulation;

pub use response::*;

use crate::error::{KeyringError, KeyringResult};
use crate::tx::SigningRequest;
use crate::types::SignTypedDataVersion;
use crate::wallet::CoinType;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Typed-data payload forwarded to the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedDataPayload {
    pub payload: serde_json::Value,
    pub version: SignTypedDataVersion,
}

/// Capability set exposed by the device connector.
///
/// The device serializes interactions and shows one prompt at a time, so
/// callers must not issue overlapping sign requests against one device.
#[async_trait]
pub trait DeviceService: Send + Sync {
    /// Retrieve the address at `path`
    async fn get_address(&self, coin_type: CoinType, path: &str) -> DeviceResult<AddressParameter>;

    /// Sign a normalized transaction request at `path`
    async fn get_signed_transaction(
        &self,
        coin_type: CoinType,
        request: &SigningRequest,
        path: &str,
    ) -> DeviceResult<SignedTransactionParameter>;

    /// Sign a personal message at `path`
    async fn get_signed_message(&self, message: &str, path: &str) -> DeviceResult<SignatureParameter>;

    /// Sign typed data at `path`
    async fn get_signed_data(
        &self,
        path: &str,
        data: &TypedDataPayload,
    ) -> DeviceResult<SignatureParameter>;

    /// Close the device popup. Fire-and-forget.
    fn close_popup(&self);
}

/// Closes the device popup when dropped
#[must_use = "the popup closes as soon as the guard is dropped"]
pub struct PopupGuard<'a, D: DeviceService + ?Sized> {
    device: &'a D,
}

impl<'a, D: DeviceService + ?Sized> PopupGuard<'a, D> {
    pub fn new(device: &'a D) -> Self {
        Self { device }
    }
}

impl<D: DeviceService + ?Sized> Drop for PopupGuard<'_, D> {
    fn drop(&mut self) {
        self.device.close_popup();
    }
}

/// Await a device call within `timeout` and normalize its outcome.
///
/// `operation` names the call in error messages and log context.
pub async fn settle<P, F>(operation: &'static str, timeout: Duration, call: F) -> KeyringResult<P>
where
    F: Future<Output = DeviceResult<P>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(outcome) => normalize_outcome(operation, outcome),
        Err(_) => {
            warn!(operation, timeout_ms = timeout.as_millis() as u64, "device call timed out");
            Err(KeyringError::DeviceTimeout(timeout))
        }
    }
}

/// Map a device outcome onto the keyring error taxonomy
pub fn normalize_outcome<P>(operation: &'static str, outcome: DeviceResult<P>) -> KeyringResult<P> {
    let result = match outcome {
        Ok(DeviceResponse {
            status: DeviceStatus::Success,
            parameter: Some(parameter),
            ..
        }) => return Ok(parameter),
        Ok(DeviceResponse {
            status: DeviceStatus::Success,
            parameter: None,
            ..
        }) => KeyringError::UnknownDevice(format!("{}: success response without payload", operation)),
        Ok(DeviceResponse {
            error: Some(body), ..
        })
        | Err(DeviceFailure::Reported(body)) => KeyringError::device(body.code, body.message),
        Ok(DeviceResponse { error: None, .. }) => {
            KeyringError::UnknownDevice(format!("{}: error response without details", operation))
        }
        Err(DeviceFailure::Transport(detail)) => {
            KeyringError::UnknownDevice(format!("{}: {}", operation, detail))
        }
    };

    warn!(operation, error = %result, "device call failed");
    Err(result)
}
