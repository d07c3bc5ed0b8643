//! CLI-based IPMI power runtime.
//!
//! This module provides a power runtime implementation that uses the
//! `ipmitool` CLI binary to drive BMCs over the lanplus transport.
//!
//! # Requirements
//!
//! - `ipmitool` binary must be installed and in PATH
//! - Network reachability from this host to the BMC addresses
//!
//! # Output contract
//!
//! `ipmitool` reports chassis state as free text ("Chassis Power is on").
//! Classification of that text lives here, behind [`PowerRuntime`], so a
//! change in the tool's phrasing only ever touches this module.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use power_runtime_interface::{BmcEndpoint, PowerReport, PowerRuntime, PowerState};
use power_shared_types::{PowerAction, PowerControlError, Result};

/// Errors specific to ipmitool CLI operations.
#[derive(Debug, thiserror::Error)]
pub enum IpmiCliError {
    #[error("ipmitool binary not found: {0}")]
    BinaryNotFound(String),

    #[error("ipmitool command failed: power {action} ({status}) - {output}")]
    CommandFailed {
        action: PowerAction,
        status: String,
        output: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IpmiCliError> for PowerControlError {
    fn from(err: IpmiCliError) -> Self {
        PowerControlError::Runtime(err.to_string())
    }
}

/// Configuration for IpmiCliRuntime.
#[derive(Debug, Clone)]
pub struct IpmiCliConfig {
    /// Path to ipmitool binary (default: "ipmitool")
    pub ipmi_binary: PathBuf,
    /// IPMI transport interface passed via `-I` (default: "lanplus")
    pub interface: String,
}

impl Default for IpmiCliConfig {
    fn default() -> Self {
        Self {
            ipmi_binary: PathBuf::from("ipmitool"),
            interface: "lanplus".to_string(),
        }
    }
}

/// CLI-based IPMI power runtime.
///
/// Holds no per-endpoint state: every call is one subprocess invocation,
/// awaited to completion with no timeout. A hung tool call blocks its
/// caller only.
pub struct IpmiCliRuntime {
    config: IpmiCliConfig,
}

impl IpmiCliRuntime {
    /// Create a new IpmiCliRuntime with default configuration.
    pub fn new() -> Self {
        Self::with_config(IpmiCliConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(config: IpmiCliConfig) -> Self {
        Self { config }
    }

    /// Probe that the ipmitool binary exists and runs.
    ///
    /// `ipmitool -V` prints a version banner and exits zero.
    pub async fn verify_binary(&self) -> std::result::Result<(), IpmiCliError> {
        let output = Command::new(&self.config.ipmi_binary)
            .arg("-V")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                IpmiCliError::BinaryNotFound(format!("{:?}: {}", self.config.ipmi_binary, e))
            })?;

        if !output.status.success() {
            return Err(IpmiCliError::BinaryNotFound(format!(
                "{:?} returned non-zero exit code",
                self.config.ipmi_binary
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout);
        info!("ipmitool version: {}", version.trim());
        Ok(())
    }

    /// ipmitool -I <interface> -H <address> -U <user> -P <pass> power <action>
    async fn exec_power(
        &self,
        endpoint: &BmcEndpoint,
        action: PowerAction,
    ) -> std::result::Result<std::process::Output, IpmiCliError> {
        // Credentials go through argv, never a shell; password is not logged.
        debug!(
            "Executing: {:?} -I {} -H {} power {}",
            self.config.ipmi_binary, self.config.interface, endpoint.address, action
        );

        let output = Command::new(&self.config.ipmi_binary)
            .arg("-I")
            .arg(&self.config.interface)
            .arg("-H")
            .arg(&endpoint.address)
            .arg("-U")
            .arg(&endpoint.username)
            .arg("-P")
            .arg(&endpoint.password)
            .arg("power")
            .arg(action.as_str())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(IpmiCliError::Io)?;

        Ok(output)
    }

    /// Run one power action, requiring a zero exit code.
    ///
    /// Returns the combined stdout/stderr text on success; on non-zero
    /// exit the same combined text is wrapped into the error.
    async fn run_checked(
        &self,
        endpoint: &BmcEndpoint,
        action: PowerAction,
    ) -> std::result::Result<String, IpmiCliError> {
        let output = self.exec_power(endpoint, action).await?;
        let combined = combined_output(&output);

        if !output.status.success() {
            return Err(IpmiCliError::CommandFailed {
                action,
                status: output.status.to_string(),
                output: combined.trim().to_string(),
            });
        }

        debug!("power {} against {} succeeded", action, endpoint.address);
        Ok(combined)
    }
}

impl Default for IpmiCliRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Interleave stdout and stderr the way the tool printed them, stdout
/// first. ipmitool writes session errors to stderr and state to stdout.
fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

/// Classify ipmitool chassis output into a power state.
///
/// Matching is substring-based on the lower-cased text: "is on" / "is off".
/// Anything else is `Unknown`.
pub fn classify_power_output(raw: &str) -> PowerState {
    let lower = raw.to_lowercase();
    if lower.contains("is on") {
        PowerState::On
    } else if lower.contains("is off") {
        PowerState::Off
    } else {
        PowerState::Unknown
    }
}

#[async_trait]
impl PowerRuntime for IpmiCliRuntime {
    async fn power_on(&self, endpoint: &BmcEndpoint) -> Result<()> {
        info!("IpmiCliRuntime: powering on {}", endpoint.address);
        self.run_checked(endpoint, PowerAction::On).await?;
        Ok(())
    }

    async fn power_off(&self, endpoint: &BmcEndpoint) -> Result<()> {
        info!("IpmiCliRuntime: powering off {}", endpoint.address);
        self.run_checked(endpoint, PowerAction::Off).await?;
        Ok(())
    }

    async fn power_status(&self, endpoint: &BmcEndpoint) -> Result<PowerReport> {
        debug!("IpmiCliRuntime: querying status of {}", endpoint.address);

        let combined = self.run_checked(endpoint, PowerAction::Status).await?;
        let raw = combined.trim();

        Ok(PowerReport {
            state: classify_power_output(raw),
            raw_output: raw.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> BmcEndpoint {
        BmcEndpoint {
            address: "192.168.1.10".to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn test_config_default() {
        let config = IpmiCliConfig::default();
        assert_eq!(config.ipmi_binary, PathBuf::from("ipmitool"));
        assert_eq!(config.interface, "lanplus");
    }

    #[test]
    fn test_classify_on() {
        assert_eq!(classify_power_output("Chassis Power is on"), PowerState::On);
        assert_eq!(classify_power_output("CHASSIS POWER IS ON"), PowerState::On);
    }

    #[test]
    fn test_classify_off() {
        assert_eq!(classify_power_output("Chassis Power is off"), PowerState::Off);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify_power_output(""), PowerState::Unknown);
        assert_eq!(
            classify_power_output("Unable to establish IPMI v2 / RMCP+ session"),
            PowerState::Unknown
        );
    }

    #[cfg(unix)]
    mod scripted {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        /// Stand-in for ipmitool: a shell script that ignores its
        /// arguments and prints a canned response.
        fn fake_tool(dir: &TempDir, body: &str) -> IpmiCliRuntime {
            let path = dir.path().join("fake-ipmitool");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            let mut perms = std::fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).unwrap();

            IpmiCliRuntime::with_config(IpmiCliConfig {
                ipmi_binary: path,
                interface: "lanplus".to_string(),
            })
        }

        #[tokio::test]
        async fn test_power_on_zero_exit_is_success() {
            let dir = TempDir::new().unwrap();
            let runtime = fake_tool(&dir, "echo 'Chassis Power Control: Up/On'");

            runtime.power_on(&endpoint()).await.unwrap();
        }

        #[tokio::test]
        async fn test_power_off_nonzero_exit_carries_combined_output() {
            let dir = TempDir::new().unwrap();
            let runtime = fake_tool(
                &dir,
                "echo 'Error: Unable to establish IPMI v2 / RMCP+ session' >&2\nexit 1",
            );

            let err = runtime.power_off(&endpoint()).await.unwrap_err();
            let message = err.to_string();
            assert!(message.contains("RMCP+ session"), "got: {}", message);
        }

        #[tokio::test]
        async fn test_status_classifies_and_returns_raw_output() {
            let dir = TempDir::new().unwrap();
            let runtime = fake_tool(&dir, "echo 'Chassis Power is on'");

            let report = runtime.power_status(&endpoint()).await.unwrap();
            assert_eq!(report.state, PowerState::On);
            assert_eq!(report.raw_output, "Chassis Power is on");
        }

        #[tokio::test]
        async fn test_status_unrecognized_output_is_unknown() {
            let dir = TempDir::new().unwrap();
            let runtime = fake_tool(&dir, "echo 'chassis power state undetermined'");

            let report = runtime.power_status(&endpoint()).await.unwrap();
            assert_eq!(report.state, PowerState::Unknown);
            assert_eq!(report.raw_output, "chassis power state undetermined");
        }

        #[tokio::test]
        async fn test_status_nonzero_exit_is_error_not_unknown() {
            let dir = TempDir::new().unwrap();
            let runtime = fake_tool(&dir, "exit 1");

            assert!(runtime.power_status(&endpoint()).await.is_err());
        }

        #[tokio::test]
        async fn test_verify_binary_missing() {
            let runtime = IpmiCliRuntime::with_config(IpmiCliConfig {
                ipmi_binary: PathBuf::from("/nonexistent/ipmitool"),
                interface: "lanplus".to_string(),
            });

            assert!(matches!(
                runtime.verify_binary().await,
                Err(IpmiCliError::BinaryNotFound(_))
            ));
        }

        #[tokio::test]
        async fn test_verify_binary_present() {
            let dir = TempDir::new().unwrap();
            let runtime = fake_tool(&dir, "echo 'ipmitool version 1.8.19'");

            runtime.verify_binary().await.unwrap();
        }
    }
}
