//! Device client: handshake, state reads, and the command channel.

use std::{sync::Arc, time::Duration};

use aerlink_crypto::{ClientKey, envelope};
use aerlink_proto::{
    CommandResult, DeviceInfo, DeviceState, Instruction, Mode, Status, control_document,
};

use crate::{
    error::{ClientError, LockClass},
    session::Session,
    transport::{Transport, paths},
};

/// Client tuning knobs.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Ceiling for acquiring an operation lock before reporting
    /// [`ClientError::Busy`].
    pub lock_timeout: Duration,
    /// Interval between state observations.
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Protocol client for one device session.
///
/// Owns the session key and the operation locks; all methods take
/// `&self` and serialize themselves per lock class, so the client can
/// be shared behind an [`Arc`].
pub struct DeviceClient<T: Transport> {
    transport: Arc<T>,
    session: Session,
    config: ClientConfig,
}

impl<T: Transport> DeviceClient<T> {
    /// Establish a session: perform the sync handshake and return a
    /// ready client.
    pub async fn connect(
        transport: T,
        host: impl Into<String>,
        port: u16,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let transport = Arc::new(transport);
        let key = fetch_session_key(transport.as_ref()).await?;
        let host = host.into();

        tracing::debug!(host = %host, port, "device session established");

        Ok(Self { session: Session::new(host, port, key), transport, config })
    }

    /// The device host this session talks to.
    pub fn host(&self) -> &str {
        self.session.host()
    }

    /// The device port this session talks to.
    pub fn port(&self) -> u16 {
        self.session.port()
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The current session key. Mainly useful for diagnostics.
    pub async fn session_key(&self) -> ClientKey {
        self.session.current_key().await
    }

    /// Fetch a fresh session key and replace the current one.
    ///
    /// Idempotent; each call invalidates any encryption keyed on the
    /// prior key. Retrying a failed operation afterwards is the
    /// caller's responsibility.
    pub async fn resync(&self) -> Result<(), ClientError> {
        let _guard = self.session.lock(LockClass::Sync, self.config.lock_timeout).await?;

        let key = fetch_session_key(self.transport.as_ref()).await?;
        self.session.replace_key(key).await;
        tracing::info!("session key rotated");

        Ok(())
    }

    /// Fetch the plaintext device identity document.
    ///
    /// Informational and not state-mutating; takes no class lock.
    pub async fn info(&self) -> Result<DeviceInfo, ClientError> {
        let body = self.transport.get(paths::INFO).await?;

        DeviceInfo::from_json(&body).map_err(|err| ClientError::Protocol { reason: err.to_string() })
    }

    /// Read the current device state under the read-state lock.
    ///
    /// A transport or integrity failure triggers a resync before this
    /// class is attempted again, so a stale or rotated session key does
    /// not keep failing. The original error is still returned.
    pub async fn read_state(&self) -> Result<DeviceState, ClientError> {
        let _guard = self.session.lock(LockClass::ReadState, self.config.lock_timeout).await?;

        match self.fetch_state().await {
            Ok(state) => {
                tracing::debug!(
                    pm2_5 = state.pm2_5,
                    mode = ?state.mode,
                    status = ?state.status,
                    "device state received"
                );
                Ok(state)
            },
            Err(err @ (ClientError::Transport(_) | ClientError::Integrity(_))) => {
                if let Err(sync_err) = self.resync().await {
                    tracing::warn!(error = %sync_err, "resync after failed read did not complete");
                }
                Err(err)
            },
            Err(err) => Err(err),
        }
    }

    /// Switch the purifier on or off.
    pub async fn change_status(&self, status: Status) -> Result<CommandResult, ClientError> {
        self.send_command(Instruction::Power(status)).await
    }

    /// Change the fan mode.
    pub async fn change_mode(&self, mode: Mode) -> Result<CommandResult, ClientError> {
        self.send_command(Instruction::Mode(mode)).await
    }

    /// Send one instruction under the send-command lock.
    async fn send_command(&self, instruction: Instruction) -> Result<CommandResult, ClientError> {
        let _guard = self.session.lock(LockClass::SendCommand, self.config.lock_timeout).await?;

        // Advance before encrypting; the device tracks the same counter.
        // On a transport failure the key stays advanced - the device may
        // have observed the new value even though the acknowledgement
        // was lost. Whether it accepts a retry at that value is
        // firmware-defined, so retry is left to the caller.
        let key = self.session.advance_key().await;

        let document = control_document(instruction);
        let payload = envelope::encrypt(key, document.to_string().as_bytes());

        tracing::debug!(
            field = instruction.field_code(),
            value = instruction.wire_value(),
            "sending control command"
        );

        let response = self.transport.post(paths::CONTROL, payload.into_bytes()).await?;
        let result = CommandResult::from_json(&response)
            .map_err(|err| ClientError::Protocol { reason: err.to_string() })?;

        tracing::debug!(outcome = ?result.status, "command acknowledged");
        Ok(result)
    }

    /// One status fetch and decode, without lock handling.
    async fn fetch_state(&self) -> Result<DeviceState, ClientError> {
        let body = self.transport.get(paths::STATUS).await?;
        let frame = String::from_utf8(body)
            .map_err(|_| ClientError::Protocol { reason: "status frame is not UTF-8".to_owned() })?;

        let plaintext = envelope::decrypt(&frame)?;

        DeviceState::from_status_json(&plaintext)
            .map_err(|err| ClientError::Protocol { reason: err.to_string() })
    }
}

/// Run the sync handshake: POST four random bytes, read back the
/// session key. No encryption is involved in this exchange.
async fn fetch_session_key<T: Transport>(transport: &T) -> Result<ClientKey, ClientError> {
    let seed: [u8; 4] = rand::random();
    let payload = hex::encode_upper(seed);

    let body = transport.post(paths::SYNC, payload.into_bytes()).await?;
    let text = String::from_utf8(body)
        .map_err(|_| ClientError::Protocol { reason: "sync response is not UTF-8".to_owned() })?;

    ClientKey::parse(text.trim()).map_err(|err| ClientError::Protocol {
        reason: format!("sync response is not a session key: {err}"),
    })
}
