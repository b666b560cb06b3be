use log::warn;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,

    /// Size of the per-connection read buffer handed to the socket. Requests
    /// larger than this still parse; they just take several reads.
    pub buffer_size: usize,

    pub server_name: String,

    /// Directory the demo handler serves files from.
    pub static_root: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 8080,
            buffer_size: 1024,
            server_name: "wirehttp/0.1".to_string(),
            static_root: "./static".to_string(),
        }
    }
}

impl ServerConfig {
    /// Loads a TOML config, falling back to defaults if the file is missing
    /// or malformed. Absent keys take their default values.
    pub fn from_file(path: &str) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!("failed to read {path}: {err}; using default config");
                return ServerConfig::default();
            }
        };

        match toml::from_str::<ServerConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                warn!("failed to parse {path}: {err}; using default config");
                ServerConfig::default()
            }
        }
    }
}
