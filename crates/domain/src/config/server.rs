use crate::wire::MAX_PACKET_SIZE;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_dns_port")]
    pub dns_port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Largest client datagram accepted; bigger ones are dropped unparsed.
    #[serde(default = "default_max_packet_size")]
    pub max_packet_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            dns_port: default_dns_port(),
            bind_address: default_bind_address(),
            max_packet_size: default_max_packet_size(),
        }
    }
}

fn default_dns_port() -> u16 {
    8053
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_max_packet_size() -> usize {
    MAX_PACKET_SIZE
}
