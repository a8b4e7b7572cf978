//! Console client configuration
//!
//! Every field has a default matching the roboRIO's standard deployment, so an
//! empty YAML document is a valid configuration:
//!
//! ```rust
//! use riolog::ConsoleConfig;
//!
//! let config = ConsoleConfig::from_yaml_str("team_number: 254\nconnect_timeout_ms: 3000\n")?;
//! assert_eq!(config.port, 1741);
//! assert_eq!(config.team_number, 254);
//! # Ok::<(), riolog::RioLogError>(())
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Result, RioLogError};

/// Placeholder replaced with the team number in host templates
pub const TEAM_PLACEHOLDER: &str = "{team}";

/// Tunables for connection discovery, the reconnect loop, and display buffering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Console port on the robot
    pub port: u16,

    /// Upper bound on one connection race
    pub connect_timeout_ms: u64,

    /// TCP keep-alive idle time on the winning socket
    pub keepalive_ms: u64,

    /// Local driver-station port reporting the robot address
    pub discovery_port: u16,

    /// Addresses tried regardless of team number
    pub fixed_hosts: Vec<String>,

    /// Hostnames containing `{team}`
    pub host_templates: Vec<String>,

    /// Try `10.TE.AM.2`
    pub static_ip: bool,

    /// Ask the local driver station for the robot address
    pub discovery: bool,

    /// Records buffered for a display that is not currently receptive
    pub hidden_capacity: usize,

    /// Initial target
    pub team_number: u32,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            port: 1741,
            connect_timeout_ms: 2000,
            keepalive_ms: 500,
            discovery_port: 1742,
            fixed_hosts: vec!["172.22.11.2".to_string(), "127.0.0.1".to_string()],
            host_templates: vec![
                "roboRIO-{team}-FRC.local".to_string(),
                "roboRIO-{team}-FRC.lan".to_string(),
                "roboRIO-{team}-FRC.frc-field.local".to_string(),
            ],
            static_ip: true,
            discovery: true,
            hidden_capacity: 10_000,
            team_number: 0,
        }
    }
}

impl ConsoleConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| RioLogError::config_error(None, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            RioLogError::config_error(Some(path.to_path_buf()), format!("cannot read file: {}", e))
        })?;
        Self::from_yaml_str(&yaml).map_err(|e| match e {
            RioLogError::Config { details, .. } => {
                RioLogError::config_error(Some(path.to_path_buf()), details)
            }
            other => other,
        })
    }

    /// Config that only dials one local port, for tests and loopback tools
    pub fn loopback(port: u16) -> Self {
        Self {
            port,
            fixed_hosts: vec!["127.0.0.1".to_string()],
            host_templates: Vec::new(),
            static_ip: false,
            discovery: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(RioLogError::config_error(None, "port must be non-zero"));
        }
        if self.connect_timeout_ms == 0 {
            return Err(RioLogError::config_error(None, "connect_timeout_ms must be non-zero"));
        }
        if self.fixed_hosts.is_empty()
            && self.host_templates.is_empty()
            && !self.static_ip
            && !self.discovery
        {
            return Err(RioLogError::config_error(None, "no connection candidates enabled"));
        }
        if let Some(template) = self.host_templates.iter().find(|t| !t.contains(TEAM_PLACEHOLDER)) {
            return Err(RioLogError::config_error(
                None,
                format!("host template '{}' has no {} placeholder", template, TEAM_PLACEHOLDER),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_millis(self.keepalive_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = ConsoleConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, ConsoleConfig::default());
        assert_eq!(config.connect_timeout(), Duration::from_secs(2));
        assert_eq!(config.keepalive(), Duration::from_millis(500));
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = ConsoleConfig::from_yaml_str(
            "team_number: 1678\nstatic_ip: false\nfixed_hosts:\n  - 10.0.0.5\n",
        )
        .unwrap();

        assert_eq!(config.team_number, 1678);
        assert!(!config.static_ip);
        assert_eq!(config.fixed_hosts, vec!["10.0.0.5".to_string()]);
        assert_eq!(config.discovery_port, 1742);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(ConsoleConfig::from_yaml_str("port: 0").is_err());
        assert!(ConsoleConfig::from_yaml_str("connect_timeout_ms: 0").is_err());
        assert!(ConsoleConfig::from_yaml_str("host_templates: [\"roborio.local\"]").is_err());
        assert!(ConsoleConfig::from_yaml_str("port: not-a-number").is_err());

        let none = "fixed_hosts: []\nhost_templates: []\nstatic_ip: false\ndiscovery: false\n";
        let err = ConsoleConfig::from_yaml_str(none).unwrap_err();
        assert!(err.to_string().contains("no connection candidates"));
    }

    #[test]
    fn loads_from_file_with_path_context() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("riolog.yaml");
        std::fs::write(&good, "port: 5800\n").unwrap();
        assert_eq!(ConsoleConfig::from_path(&good).unwrap().port, 5800);

        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "port: 0\n").unwrap();
        match ConsoleConfig::from_path(&bad) {
            Err(RioLogError::Config { path, .. }) => assert_eq!(path, Some(bad)),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn loopback_config_is_valid() {
        let config = ConsoleConfig::loopback(4000);
        config.validate().unwrap();
        assert_eq!(config.fixed_hosts, vec!["127.0.0.1".to_string()]);
    }
}
