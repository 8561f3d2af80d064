use regional_dns_domain::DomainError;
use std::net::{IpAddr, SocketAddr};
use tokio::net::lookup_host;
use tracing::{debug, info};

/// Turns the configured upstream into a socket address.
///
/// Accepts `ip`, `ip:port`, `[v6]:port`, `host` and `host:port`. Hostnames
/// are looked up once and the first IPv4 address wins.
pub async fn resolve_upstream(server: &str, default_port: u16) -> Result<SocketAddr, DomainError> {
    let server = server.trim();
    if server.is_empty() {
        return Err(DomainError::ConfigError(
            "upstream server is empty".to_string(),
        ));
    }

    if let Ok(addr) = server.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = server.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port));
    }

    let (host, port) = match server.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|_| {
                DomainError::ConfigError(format!("invalid port in upstream '{}'", server))
            })?;
            (host, port)
        }
        None => (server, default_port),
    };

    debug!(host, port, "Looking up upstream host");
    let addrs = lookup_host((host, port))
        .await
        .map_err(|e| DomainError::IoError(format!("cannot resolve upstream {}: {}", host, e)))?;

    let addr = addrs.into_iter().find(SocketAddr::is_ipv4).ok_or_else(|| {
        DomainError::InvalidIpAddress(format!("upstream {} has no IPv4 address", host))
    })?;

    info!(host, upstream = %addr, "Upstream host resolved");
    Ok(addr)
}
