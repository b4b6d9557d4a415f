use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::Path;

use crate::destination::SERVER_PORT;
use crate::error::{Error, Result};
use crate::helpers::{ip_add, ip_in_range};
use crate::option_map::options_from_map;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_address: Ipv4Addr,
    pub server_port: u16,
    /// Network device to bind to (SO_BINDTODEVICE, Linux only).
    pub bind_device: Option<String>,
    /// Receive interfaces to serve; empty serves all of them.
    pub interface_indices: Vec<u32>,
    /// Send replies for relayed requests back to the relay agent.
    pub relay_diversion: bool,
    /// Relay agents allowed when `relay_diversion` is on; empty allows all.
    pub permitted_relays: Vec<Ipv4Addr>,
    pub server_ip: Ipv4Addr,
    pub pool_start: Ipv4Addr,
    pub lease_range: u32,
    pub lease_duration_seconds: u32,
    /// Options sent to clients, keyed by option name.
    pub options: BTreeMap<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        let options = [
            ("SubnetMask", json!("255.255.255.0")),
            ("Router", json!(["192.168.1.1"])),
            ("DomainNameServer", json!(["8.8.8.8", "8.8.4.4"])),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();

        Self {
            listen_address: Ipv4Addr::UNSPECIFIED,
            server_port: SERVER_PORT,
            bind_device: None,
            interface_indices: Vec::new(),
            relay_diversion: false,
            permitted_relays: Vec::new(),
            server_ip: Ipv4Addr::new(192, 168, 1, 1),
            pool_start: Ipv4Addr::new(192, 168, 1, 100),
            lease_range: 101,
            lease_duration_seconds: 86400,
            options,
        }
    }
}

impl Config {
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(Error::InvalidConfig(
                "server_port must be greater than 0".to_string(),
            ));
        }

        if self.lease_range == 0 {
            return Err(Error::InvalidConfig(
                "lease_range must be greater than 0".to_string(),
            ));
        }

        if u64::from(u32::from(self.pool_start)) + u64::from(self.lease_range) - 1
            > u64::from(u32::MAX)
        {
            return Err(Error::InvalidConfig(format!(
                "pool of {} addresses starting at {} extends past 255.255.255.255",
                self.lease_range, self.pool_start
            )));
        }

        if self.ip_in_pool(self.server_ip) {
            return Err(Error::InvalidConfig(
                "server_ip must not be within the pool range".to_string(),
            ));
        }

        if self.lease_duration_seconds == 0 {
            return Err(Error::InvalidConfig(
                "lease_duration_seconds must be greater than 0".to_string(),
            ));
        }

        options_from_map(&self.options)
            .map_err(|error| Error::InvalidConfig(format!("options: {}", error)))?;

        Ok(())
    }

    /// Last address of the pool. Only meaningful for a validated config.
    pub fn pool_end(&self) -> Ipv4Addr {
        ip_add(self.pool_start, self.lease_range.saturating_sub(1))
    }

    pub fn ip_in_pool(&self, ip: Ipv4Addr) -> bool {
        self.lease_range > 0 && ip_in_range(self.pool_start, self.pool_end(), ip)
    }
}
