use async_trait::async_trait;
use regional_dns_domain::DomainError;
use std::net::SocketAddr;
use std::time::Duration;

/// One request/response exchange with an upstream name server.
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    /// Sends `query` to `server` and waits at most `timeout` for the matching
    /// reply. Implementations must discard datagrams whose transaction ID
    /// (the first two bytes of `query`) or source address does not match.
    ///
    /// Running out of time is reported as [`DomainError::QueryTimeout`].
    async fn exchange(
        &self,
        server: SocketAddr,
        query: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, DomainError>;
}
