//! Power runtime implementations for the control plane.
//!
//! This crate provides implementations of the `PowerRuntime` trait:
//! - `IpmiCliRuntime`: shells out to the `ipmitool` binary
//! - `MockPowerRuntime`: in-memory scripted runtime for testing (default
//!   `mock-runtime` feature)

pub mod ipmi_cli;

#[cfg(feature = "mock-runtime")]
pub mod mock;

// Re-export common types
pub use power_runtime_interface::{BmcEndpoint, PowerReport, PowerRuntime, PowerState};

pub use ipmi_cli::{IpmiCliConfig, IpmiCliError, IpmiCliRuntime};

#[cfg(feature = "mock-runtime")]
pub use mock::MockPowerRuntime;
