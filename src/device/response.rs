//! Device Response Envelopes
//!
//! The device answers every request with a status plus either a
//! parameter payload or a structured error. A call can also fail outright
//! (transport dropped, popup closed by the user), optionally still carrying
//! a structured error.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Success,
    Error,
}

/// Structured error reported by the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceErrorBody {
    pub code: String,
    pub message: String,
}

impl DeviceErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Response envelope for a device operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceResponse<P> {
    pub status: DeviceStatus,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub parameter: Option<P>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<DeviceErrorBody>,
}

impl<P> DeviceResponse<P> {
    pub fn success(parameter: P) -> Self {
        Self {
            status: DeviceStatus::Success,
            parameter: Some(parameter),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: DeviceStatus::Error,
            parameter: None,
            error: Some(DeviceErrorBody::new(code, message)),
        }
    }

    /// Error status without any error body
    pub fn bare_error() -> Self {
        Self {
            status: DeviceStatus::Error,
            parameter: None,
            error: None,
        }
    }
}

/// A device call that did not produce a response envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceFailure {
    /// Failure that still carries the device's structured error
    Reported(DeviceErrorBody),
    /// Transport-level failure with no structured information
    Transport(String),
}

impl fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFailure::Reported(body) => write!(f, "{} - {}", body.code, body.message),
            DeviceFailure::Transport(detail) => write!(f, "{}", detail),
        }
    }
}

/// Outcome of a single device call
pub type DeviceResult<P> = Result<DeviceResponse<P>, DeviceFailure>;

/// `getAddress` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressParameter {
    pub address: String,
}

/// `getSignedTransaction` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransactionParameter {
    /// Hex-encoded signed transaction
    pub signed: String,
    pub sign_v: String,
    pub sign_r: String,
    pub sign_s: String,
}

/// `getSignedMessage` / `getSignedData` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureParameter {
    /// Address the device signed with
    pub address: String,
    #[serde(rename = "sign")]
    pub signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_json() {
        let json = r#"{"status":"success","parameter":{"address":"0xabc"}}"#;
        let response: DeviceResponse<AddressParameter> = serde_json::from_str(json).unwrap();
        assert_eq!(response, DeviceResponse::success(AddressParameter { address: "0xabc".into() }));
    }

    #[test]
    fn test_error_envelope_json() {
        let json = r#"{"status":"error","error":{"code":"user_cancel","message":"canceled"}}"#;
        let response: DeviceResponse<SignatureParameter> = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, DeviceStatus::Error);
        assert_eq!(response.error.unwrap().code, "user_cancel");
    }

    #[test]
    fn test_signature_parameter_field_name() {
        let json = r#"{"address":"0xabc","sign":"0x1234"}"#;
        let parameter: SignatureParameter = serde_json::from_str(json).unwrap();
        assert_eq!(parameter.signature, "0x1234");
    }
}
