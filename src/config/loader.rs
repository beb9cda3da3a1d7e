use std::fs;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, warn};
use crate::config::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub const ENV_PREFIX: &str = "LIGHT_WHISPER_";

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address both the TCP listener and the UDP socket bind to.
    #[serde(default = "defaults::bind_address")]
    pub bind_address: String,

    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Largest packet accepted in one reliable-channel frame.
    #[serde(default = "defaults::max_frame_size")]
    pub max_frame_size: usize,

    #[serde(default = "defaults::event_queue_size")]
    pub event_queue_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: defaults::bind_address(),
            port: defaults::port(),
            max_frame_size: defaults::max_frame_size(),
            event_queue_size: defaults::event_queue_size(),
        }
    }
}

impl Config {
    /// Resolves `bind_address` and `port` into a listen address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if let Ok(ip) = self.bind_address.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }

        (self.bind_address.as_str(), self.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ConfigError::InvalidAddress(self.bind_address.clone()))
    }
}

pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let config_path = PathBuf::from(path);

    if config_path.exists() {
        let config_str = fs::read_to_string(&config_path)?;
        info!("loaded config from {}", path);
        return Ok(toml::from_str(&config_str)?);
    }

    // Fallback to environment variables
    match envy::prefixed(ENV_PREFIX).from_env::<Config>() {
        Ok(cfg) => Ok(cfg),
        Err(e) => {
            warn!("ignoring invalid {}* environment: {}", ENV_PREFIX, e);
            Ok(Config::default())
        }
    }
}

mod defaults {
    pub fn bind_address() -> String { "0.0.0.0".to_string() }
    pub fn port() -> u16 { 8083 }
    pub fn max_frame_size() -> usize { crate::protocol::frame::DEFAULT_MAX_FRAME_SIZE }
    pub fn event_queue_size() -> usize { 1024 }
}
