//! Aerlink Wire Documents
//!
//! JSON documents exchanged with the device and the domain types they
//! decode into. The device firmware addresses everything through opaque
//! `D0x-yy` attribute codes; this crate is the only place those codes
//! appear.
//!
//! Nothing here performs I/O or encryption - `aerlink-crypto` handles
//! the envelope layer and `aerlink-client` the transport.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod fields;
pub mod info;
pub mod state;

pub use command::{CommandOutcome, CommandResult, Instruction, control_document};
pub use info::DeviceInfo;
pub use state::{AirQuality, DeviceState, Mode, Status};
use thiserror::Error;

/// Errors from decoding device documents.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// A document did not have the expected JSON shape.
    #[error("malformed device document: {0}")]
    Malformed(#[from] serde_json::Error),
}
