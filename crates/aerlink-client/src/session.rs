//! Session state and operation locks.
//!
//! The session key is the only shared mutable resource in the client.
//! Callers take the relevant class lock before touching it; the key's
//! own mutex only protects the read-modify-write itself.

use std::time::Duration;

use aerlink_crypto::ClientKey;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::{ClientError, LockClass};

/// A device session: address, current session key, and the three named
/// operation locks.
pub(crate) struct Session {
    host: String,
    port: u16,
    key: Mutex<ClientKey>,
    sync_lock: Mutex<()>,
    read_lock: Mutex<()>,
    send_lock: Mutex<()>,
}

impl Session {
    pub(crate) fn new(host: String, port: u16, key: ClientKey) -> Self {
        Self {
            host,
            port,
            key: Mutex::new(key),
            sync_lock: Mutex::new(()),
            read_lock: Mutex::new(()),
            send_lock: Mutex::new(()),
        }
    }

    pub(crate) fn host(&self) -> &str {
        &self.host
    }

    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    pub(crate) async fn current_key(&self) -> ClientKey {
        *self.key.lock().await
    }

    /// Replace the session key after a handshake.
    pub(crate) async fn replace_key(&self, key: ClientKey) {
        *self.key.lock().await = key;
    }

    /// Advance the session key by one and return the new value.
    ///
    /// Called exactly once per command send, under the send lock,
    /// immediately before encrypting. The key stays advanced even if
    /// the send later fails - the device may have observed the new
    /// value despite a lost acknowledgement.
    pub(crate) async fn advance_key(&self) -> ClientKey {
        let mut key = self.key.lock().await;
        *key = key.next();
        *key
    }

    /// Acquire the lock for an operation class, bounded by `timeout`.
    pub(crate) async fn lock(
        &self,
        class: LockClass,
        timeout: Duration,
    ) -> Result<MutexGuard<'_, ()>, ClientError> {
        let mutex = match class {
            LockClass::Sync => &self.sync_lock,
            LockClass::ReadState => &self.read_lock,
            LockClass::SendCommand => &self.send_lock,
        };

        tokio::time::timeout(timeout, mutex.lock())
            .await
            .map_err(|_| ClientError::Busy { class })
    }
}
