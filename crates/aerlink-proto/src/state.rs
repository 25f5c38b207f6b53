//! Reported device state.
//!
//! The device pushes its state as an encrypted JSON document of the
//! shape `{"state":{"reported":{...}}}`. Decoding produces a
//! [`DeviceState`]; each observation supersedes the previous one
//! wholesale, fields are never patched individually.

use serde::Deserialize;

use crate::ProtoError;

/// Power status of the purifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Purifier is running.
    On,
    /// Purifier is off.
    Off,
}

impl Status {
    /// The wire string for this status.
    pub fn wire_value(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }

    /// Decode a reported wire string. Anything but `"ON"` reads as off.
    fn from_wire(value: &str) -> Self {
        match value {
            "ON" => Self::On,
            _ => Self::Off,
        }
    }
}

/// Fan mode of the purifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Automatic fan control.
    Auto,
    /// Quiet night mode.
    Sleep,
    /// Maximum fan speed.
    Turbo,
}

impl Mode {
    /// The wire string for this mode.
    pub fn wire_value(self) -> &'static str {
        match self {
            Self::Auto => "Auto General",
            Self::Sleep => "Sleep",
            Self::Turbo => "Turbo",
        }
    }

    /// Decode a reported wire string. Unknown values read as auto.
    fn from_wire(value: &str) -> Self {
        match value {
            "Turbo" => Self::Turbo,
            "Sleep" => Self::Sleep,
            _ => Self::Auto,
        }
    }
}

/// Air quality bucket derived from the PM2.5 reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AirQuality {
    /// PM2.5 at or below 12.
    Excellent,
    /// PM2.5 in 13..=19.
    Good,
    /// PM2.5 in 20..=35.
    Fair,
    /// PM2.5 in 36..=55.
    Inferior,
    /// PM2.5 above 55.
    Poor,
}

impl AirQuality {
    /// Bucket a PM2.5 reading.
    pub fn from_pm2_5(pm2_5: u32) -> Self {
        match pm2_5 {
            0..=12 => Self::Excellent,
            13..=19 => Self::Good,
            20..=35 => Self::Fair,
            36..=55 => Self::Inferior,
            _ => Self::Poor,
        }
    }
}

/// A decoded device state observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    /// PM2.5 particulate reading.
    pub pm2_5: u32,
    /// Current fan mode.
    pub mode: Mode,
    /// Current power status.
    pub status: Status,
}

impl DeviceState {
    /// Decode a decrypted `/sys/dev/status` document.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Malformed`] if the document does not have
    /// the reported-state shape.
    pub fn from_status_json(bytes: &[u8]) -> Result<Self, ProtoError> {
        let document: StatusDocument = serde_json::from_slice(bytes)?;
        let reported = document.state.reported;

        Ok(Self {
            pm2_5: reported.pm2_5,
            mode: Mode::from_wire(&reported.mode),
            status: Status::from_wire(&reported.power),
        })
    }

    /// Air quality bucket for this observation.
    pub fn air_quality(&self) -> AirQuality {
        AirQuality::from_pm2_5(self.pm2_5)
    }
}

#[derive(Deserialize)]
struct StatusDocument {
    state: ReportedSection,
}

#[derive(Deserialize)]
struct ReportedSection {
    reported: ReportedFields,
}

#[derive(Deserialize)]
struct ReportedFields {
    #[serde(rename = "D03-02")]
    power: String,
    #[serde(rename = "D03-12")]
    mode: String,
    #[serde(rename = "D03-33")]
    pm2_5: u32,
}
