//! Polling state observer.
//!
//! A spawned task that reads the device state on a fixed interval and
//! publishes each successful decode to a watch channel. Subscribers see
//! only the most recently decoded state - latest value wins, nothing is
//! queued. A failed read is logged and swallowed; the loop never stops
//! on its own and the next poll happens after the interval regardless
//! of outcome (`read_state` already resyncs the session key after a
//! transport or integrity failure).

use std::sync::Arc;

use aerlink_proto::DeviceState;
use tokio::{sync::watch, task::JoinHandle};

use crate::{client::DeviceClient, transport::Transport};

/// Handle to a running observation loop.
///
/// Dropping the handle closes the shutdown channel, which stops the
/// loop at its next select point; only [`StateObserver::stop`] also
/// waits for the task to finish.
pub struct StateObserver {
    updates: watch::Receiver<Option<DeviceState>>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl StateObserver {
    /// Spawn the observation loop for a client.
    ///
    /// Polls every `config.poll_interval`. The channel starts at `None`
    /// and carries `Some` after the first successful decode; every
    /// successful decode is published, so subscribers awaiting
    /// `changed()` see each update at least once unless a newer one has
    /// already superseded it.
    pub fn spawn<T: Transport>(client: Arc<DeviceClient<T>>) -> Self {
        let interval = client.config().poll_interval;
        let (updates_tx, updates_rx) = watch::channel(None);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    result = client.read_state() => match result {
                        Ok(state) => {
                            let _ = updates_tx.send(Some(state));
                        },
                        Err(err) => {
                            tracing::debug!(error = %err, "state observation failed, continuing");
                        },
                    },
                }

                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    () = tokio::time::sleep(interval) => {},
                }
            }

            tracing::debug!("state observer stopped");
        });

        Self { updates: updates_rx, shutdown: shutdown_tx, task }
    }

    /// Subscribe to state updates.
    pub fn subscribe(&self) -> watch::Receiver<Option<DeviceState>> {
        self.updates.clone()
    }

    /// Stop the loop and wait for the task to finish.
    ///
    /// An in-flight read is cancelled at its next suspension point.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
