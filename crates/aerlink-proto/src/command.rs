//! Control commands and their acknowledgements.
//!
//! A command is a desired-state document carrying exactly one
//! instruction field. The mapping from domain enums to wire strings is
//! an exhaustive match, so a new enum variant cannot silently fall
//! through to a wrong default.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::{
    ProtoError, fields,
    state::{Mode, Status},
};

/// A single device instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Switch the purifier on or off.
    Power(Status),
    /// Change the fan mode.
    Mode(Mode),
}

impl Instruction {
    /// Firmware attribute code this instruction writes to.
    pub fn field_code(self) -> &'static str {
        match self {
            Self::Power(_) => fields::POWER,
            Self::Mode(_) => fields::MODE,
        }
    }

    /// Wire value for the instruction.
    pub fn wire_value(self) -> &'static str {
        match self {
            Self::Power(status) => status.wire_value(),
            Self::Mode(mode) => mode.wire_value(),
        }
    }
}

/// Build the desired-state document for an instruction.
///
/// Shape: `{"state":{"desired":{"CommandType":"app","DeviceId":"",
/// "EnduserId":"",<field>:<value>}}}`.
pub fn control_document(instruction: Instruction) -> Value {
    let mut desired = Map::new();
    desired.insert("CommandType".to_owned(), Value::from("app"));
    desired.insert("DeviceId".to_owned(), Value::from(""));
    desired.insert("EnduserId".to_owned(), Value::from(""));
    desired.insert(
        instruction.field_code().to_owned(),
        Value::from(instruction.wire_value()),
    );

    json!({ "state": { "desired": desired } })
}

/// Device acknowledgement outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandOutcome {
    /// The device accepted the command.
    Success,
    /// The device rejected the command.
    Failed,
}

/// Acknowledgement for a control command. Transient, not retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CommandResult {
    /// Outcome reported by the device.
    pub status: CommandOutcome,
}

impl CommandResult {
    /// Decode a plaintext `/sys/dev/control` response body.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Malformed`] on an unexpected document
    /// shape or unknown outcome string.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ProtoError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
