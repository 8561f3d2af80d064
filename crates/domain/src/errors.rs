use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid IP address: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR format: {0}")]
    InvalidCidr(String),

    #[error("Query timeout waiting for {server}")]
    QueryTimeout { server: String },

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Region table error: {0}")]
    RegionTable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
