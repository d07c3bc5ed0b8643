//! The `PowerRuntime` trait: the seam between HTTP handlers and the
//! external power tool.
//!
//! Subprocess invocation and tool-output parsing live behind this
//! interface; the phrasing a given tool version or locale emits is an
//! implementation detail of the runtime crate, and the handlers only
//! ever see a classified [`PowerState`] plus the raw text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use power_shared_types::{Result, ServerEntry};

/// Credentials and address for one BMC, as handed to a runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BmcEndpoint {
    pub address: String,
    pub username: String,
    pub password: String,
}

impl From<&ServerEntry> for BmcEndpoint {
    fn from(entry: &ServerEntry) -> Self {
        BmcEndpoint {
            address: entry.bmc_ip.clone(),
            username: entry.username.clone(),
            password: entry.password.clone(),
        }
    }
}

/// Classified chassis power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
    Unknown,
}

impl PowerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerState::On => "on",
            PowerState::Off => "off",
            PowerState::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a status query: the classification plus the trimmed raw
/// tool output it was derived from. The raw text is always carried,
/// whatever the classification outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerReport {
    pub state: PowerState,
    pub raw_output: String,
}

/// Interface to an external power-management tool.
///
/// One invocation per call, awaited to completion. Implementations do
/// not retry, queue, or coordinate concurrent calls against the same
/// endpoint.
#[async_trait]
pub trait PowerRuntime: Send + Sync {
    /// Power the machine on. Success is defined by the tool exiting zero.
    async fn power_on(&self, endpoint: &BmcEndpoint) -> Result<()>;

    /// Power the machine off. Success is defined by the tool exiting zero.
    async fn power_off(&self, endpoint: &BmcEndpoint) -> Result<()>;

    /// Query chassis power state.
    async fn power_status(&self, endpoint: &BmcEndpoint) -> Result<PowerReport>;
}
