//! Fleet configuration: the pipe-delimited server list and lookup.
//!
//! The config file maps internal management addresses to BMC credentials,
//! one server per line:
//!
//! ```text
//! # internal_ip | bmc_ip | username | password
//! 10.0.0.1 | 192.168.1.1 | admin | changeme
//! ```
//!
//! Blank lines and `#` comments are ignored. The file is parsed once at
//! startup into an immutable [`FleetConfig`] that request handlers share
//! by reference; nothing is ever written back.

use std::path::Path;

use tracing::debug;

use power_shared_types::{PowerControlError, Result, ServerEntry};

/// Errors raised while loading the fleet config. Both variants are fatal
/// at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("config line {line}: {reason}")]
    Format { line: usize, reason: String },
}

/// The loaded server list. Ordered, immutable after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetConfig {
    servers: Vec<ServerEntry>,
}

impl FleetConfig {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        debug!("loaded {} servers from {}", config.len(), path.display());
        Ok(config)
    }

    /// Parse config text. Line numbers are 1-based and count every
    /// physical line, including blanks and comments.
    pub fn parse(content: &str) -> std::result::Result<Self, ConfigError> {
        let mut servers = Vec::new();

        for (idx, raw_line) in content.lines().enumerate() {
            let line = idx + 1;
            let text = raw_line.trim();

            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = text.split('|').collect();
            if fields.len() != 4 {
                return Err(ConfigError::Format {
                    line,
                    reason: format!(
                        "expected 4 pipe-delimited fields (internal_ip | bmc_ip | username | password), found {}",
                        fields.len()
                    ),
                });
            }

            let trimmed: Vec<&str> = fields.iter().map(|f| f.trim()).collect();
            if trimmed.iter().any(|f| f.is_empty()) {
                return Err(ConfigError::Format {
                    line,
                    reason: "empty field".to_string(),
                });
            }

            servers.push(ServerEntry {
                internal_ip: trimmed[0].to_string(),
                bmc_ip: trimmed[1].to_string(),
                username: trimmed[2].to_string(),
                password: trimmed[3].to_string(),
            });
        }

        Ok(FleetConfig { servers })
    }

    /// Linear scan by internal address; first match wins. Exact string
    /// comparison, no case-normalization or partial matching.
    pub fn find(&self, internal_ip: &str) -> Option<&ServerEntry> {
        self.servers.iter().find(|s| s.internal_ip == internal_ip)
    }

    /// Like [`find`](Self::find), surfacing a `ServerNotFound` error for
    /// absent addresses.
    pub fn lookup(&self, internal_ip: &str) -> Result<&ServerEntry> {
        self.find(internal_ip)
            .ok_or_else(|| PowerControlError::ServerNotFound(internal_ip.to_string()))
    }

    pub fn servers(&self) -> &[ServerEntry] {
        &self.servers
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}
