//! Transport abstraction.
//!
//! The device speaks a lightweight request/response protocol addressed
//! by path. The client only needs GET and POST; whether the transport
//! implements `/sys/dev/status` via a plain request or its observe mode
//! is its own concern.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Device endpoint paths.
pub mod paths {
    /// Session key handshake. Unauthenticated, unencrypted.
    pub const SYNC: &str = "/sys/dev/sync";

    /// Encrypted reported-state document.
    pub const STATUS: &str = "/sys/dev/status";

    /// Encrypted desired-state commands.
    pub const CONTROL: &str = "/sys/dev/control";

    /// Plaintext device identity.
    pub const INFO: &str = "/sys/dev/info";
}

/// A network or request failure in the underlying transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct TransportError {
    /// Description of the failure.
    pub reason: String,
}

impl TransportError {
    /// Create a transport error with the given description.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Request/response transport towards the device.
///
/// Implementations must be usable concurrently; the client serializes
/// operations per class itself and may issue a read and a send at the
/// same time.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Issue a GET for the given path, returning the response body.
    async fn get(&self, path: &str) -> Result<Vec<u8>, TransportError>;

    /// Issue a POST with the given body, returning the response body.
    async fn post(&self, path: &str, payload: Vec<u8>) -> Result<Vec<u8>, TransportError>;
}

#[async_trait]
impl<T: Transport> Transport for Arc<T> {
    async fn get(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        self.as_ref().get(path).await
    }

    async fn post(&self, path: &str, payload: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        self.as_ref().post(path, payload).await
    }
}
