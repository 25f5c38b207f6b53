//! Aerlink Device Client
//!
//! Protocol client for a networked air purifier speaking an encrypted
//! control-and-telemetry protocol over a lightweight request/response
//! transport.
//!
//! ## Architecture
//!
//! ```text
//! aerlink-client
//!   ├─ Transport       (GET/POST abstraction, implemented by the caller)
//!   ├─ DeviceClient    (handshake, command channel, state reads)
//!   ├─ Session         (session key + named operation locks)
//!   └─ StateObserver   (polling loop publishing DeviceState updates)
//! ```
//!
//! The transport is a black box assumed to provide GET and POST against
//! the device; if it supports an observe mode, that stays internal to
//! the transport. Envelope encryption lives in `aerlink-crypto`, wire
//! documents in `aerlink-proto`.
//!
//! ## Concurrency
//!
//! Three independent operation locks (`sync`, `read-state`,
//! `send-command`) serialize operations within a class; acquisition is
//! bounded by a timeout and fails with [`ClientError::Busy`] instead of
//! blocking indefinitely. The classes are deliberately not ordered
//! against each other: a resync triggered by a failed read may
//! interleave with an in-flight command send keyed on the pre-resync
//! session key, whose acknowledgement can then fail. That interleaving
//! matches the device's observed behavior and is left intact.

#![forbid(unsafe_code)]

mod client;
mod error;
mod observer;
mod session;
mod transport;

pub use aerlink_crypto::ClientKey;
pub use aerlink_proto::{
    AirQuality, CommandOutcome, CommandResult, DeviceInfo, DeviceState, Mode, Status,
};
pub use client::{ClientConfig, DeviceClient};
pub use error::{ClientError, LockClass};
pub use observer::StateObserver;
pub use transport::{Transport, TransportError, paths};
