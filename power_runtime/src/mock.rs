//! In-memory mock power runtime for testing.
//!
//! Scripted per BMC address: tests seed a chassis state, an optional
//! canned raw output, or a failure message, and can inspect the list of
//! invocations afterwards. No subprocess is ever spawned.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;

use power_runtime_interface::{BmcEndpoint, PowerReport, PowerRuntime, PowerState};
use power_shared_types::{PowerAction, PowerControlError, Result};

/// Scripted in-memory power runtime.
#[derive(Default)]
pub struct MockPowerRuntime {
    states: RwLock<HashMap<String, PowerState>>,
    raw_outputs: RwLock<HashMap<String, String>>,
    failures: RwLock<HashMap<String, String>>,
    invocations: Mutex<Vec<(String, PowerAction)>>,
}

impl MockPowerRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the chassis state reported for an address.
    pub fn set_state(&self, address: &str, state: PowerState) {
        self.states
            .write()
            .unwrap()
            .insert(address.to_string(), state);
    }

    /// Seed the raw tool output reported for an address. When unset, a
    /// canned line matching the seeded state is synthesized.
    pub fn set_raw_output(&self, address: &str, raw: &str) {
        self.raw_outputs
            .write()
            .unwrap()
            .insert(address.to_string(), raw.to_string());
    }

    /// Make every action against an address fail with the given message.
    pub fn fail_with(&self, address: &str, message: &str) {
        self.failures
            .write()
            .unwrap()
            .insert(address.to_string(), message.to_string());
    }

    /// All (address, action) pairs seen so far, in call order.
    pub fn invocations(&self) -> Vec<(String, PowerAction)> {
        self.invocations.lock().unwrap().clone()
    }

    fn record(&self, endpoint: &BmcEndpoint, action: PowerAction) -> Result<()> {
        self.invocations
            .lock()
            .unwrap()
            .push((endpoint.address.clone(), action));

        if let Some(message) = self.failures.read().unwrap().get(&endpoint.address) {
            return Err(PowerControlError::Runtime(message.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl PowerRuntime for MockPowerRuntime {
    async fn power_on(&self, endpoint: &BmcEndpoint) -> Result<()> {
        self.record(endpoint, PowerAction::On)?;
        self.set_state(&endpoint.address, PowerState::On);
        Ok(())
    }

    async fn power_off(&self, endpoint: &BmcEndpoint) -> Result<()> {
        self.record(endpoint, PowerAction::Off)?;
        self.set_state(&endpoint.address, PowerState::Off);
        Ok(())
    }

    async fn power_status(&self, endpoint: &BmcEndpoint) -> Result<PowerReport> {
        self.record(endpoint, PowerAction::Status)?;

        let state = self
            .states
            .read()
            .unwrap()
            .get(&endpoint.address)
            .copied()
            .unwrap_or(PowerState::Unknown);

        let raw_output = self
            .raw_outputs
            .read()
            .unwrap()
            .get(&endpoint.address)
            .cloned()
            .unwrap_or_else(|| match state {
                PowerState::On => "Chassis Power is on".to_string(),
                PowerState::Off => "Chassis Power is off".to_string(),
                PowerState::Unknown => String::new(),
            });

        Ok(PowerReport { state, raw_output })
    }
}
