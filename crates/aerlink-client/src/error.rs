//! Client error types.

use std::fmt;

use aerlink_crypto::CryptoError;
use thiserror::Error;

use crate::transport::TransportError;

/// Named operation lock classes.
///
/// Operations within a class are strictly serialized; classes are
/// independent of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockClass {
    /// Session key handshake.
    Sync,
    /// Status reads and observation-triggered decodes.
    ReadState,
    /// Control command sends.
    SendCommand,
}

impl fmt::Display for LockClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sync => "sync",
            Self::ReadState => "read-state",
            Self::SendCommand => "send-command",
        })
    }
}

/// Errors from client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request failure. Transient; the observer loop
    /// continues past it and the command channel rejects without retry.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Envelope digest mismatch or an undecryptable frame. The frame is
    /// discarded and a resync is scheduled for the read class.
    #[error("integrity failure: {0}")]
    Integrity(#[from] CryptoError),

    /// A well-formed response with the wrong shape (bad JSON, a sync
    /// body that is not a session key).
    #[error("protocol error: {reason}")]
    Protocol {
        /// What was wrong with the response.
        reason: String,
    },

    /// An operation lock was not acquired within its timeout ceiling.
    /// Retryable.
    #[error("operation lock `{class}` timed out")]
    Busy {
        /// The lock class that timed out.
        class: LockClass,
    },
}

impl ClientError {
    /// Returns true if the same call can reasonably be retried as-is.
    ///
    /// Integrity and protocol errors need a resync or a fixed device
    /// first; transport hiccups and lock contention do not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Busy { .. })
    }
}
