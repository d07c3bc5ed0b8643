//! Shared types for the power control plane.
//!
//! These are the types every other crate in the workspace speaks:
//! the fleet entry mapping an internal management address to BMC
//! credentials, the power actions the control plane supports, and
//! the shared error enum.

use serde::{Deserialize, Serialize};

/// One server in the managed fleet.
///
/// All fields are plain strings, immutable after the config is loaded.
/// The internal address is the lookup key; uniqueness is assumed, not
/// enforced (first match wins on duplicates).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    /// In-band management address used as the lookup key.
    pub internal_ip: String,
    /// Out-of-band BMC address the power tool is pointed at.
    pub bmc_ip: String,
    pub username: String,
    pub password: String,
}

/// Power actions accepted by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerAction {
    On,
    Off,
    Status,
}

impl PowerAction {
    /// The action keyword as passed to the external power tool.
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerAction::On => "on",
            PowerAction::Off => "off",
            PowerAction::Status => "status",
        }
    }
}

impl std::fmt::Display for PowerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced across crate boundaries.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PowerControlError {
    #[error("no server configured for internal address {0}")]
    ServerNotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("power command failed: {0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, PowerControlError>;
