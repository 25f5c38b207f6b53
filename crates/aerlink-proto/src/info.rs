//! Device identity document.

use serde::Deserialize;

use crate::ProtoError;

/// Name and model reported by the plaintext `/sys/dev/info` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceInfo {
    /// Device name.
    #[serde(rename = "D01-03")]
    pub name: String,
    /// Device model.
    #[serde(rename = "D01-05")]
    pub model: String,
}

impl DeviceInfo {
    /// Decode an info response body.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Malformed`] if either identity field is
    /// missing.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ProtoError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
