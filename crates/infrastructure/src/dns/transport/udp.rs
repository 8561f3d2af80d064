//! UDP Transport for upstream DNS queries (RFC 1035 §4.2.1)
//!
//! Messages are sent as-is (no framing). Each exchange binds its own
//! ephemeral socket; the reply must come from the queried address and echo
//! the query's transaction ID. Anything else arriving on the socket is
//! discarded while the same deadline keeps running.

use async_trait::async_trait;
use regional_dns_application::ports::UpstreamTransport;
use regional_dns_domain::wire::MAX_PACKET_SIZE;
use regional_dns_domain::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, warn};

/// DNS over UDP transport
#[derive(Debug, Clone)]
pub struct UdpTransport {
    max_response_size: usize,
}

impl UdpTransport {
    pub fn new() -> Self {
        Self {
            max_response_size: MAX_PACKET_SIZE,
        }
    }

    /// Responses longer than this are rejected instead of parsed truncated.
    pub fn with_max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }

    pub fn max_response_size(&self) -> usize {
        self.max_response_size
    }
}

impl Default for UdpTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn transaction_id(packet: &[u8]) -> Option<u16> {
    match packet {
        [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
        _ => None,
    }
}

#[async_trait]
impl UpstreamTransport for UdpTransport {
    async fn exchange(
        &self,
        server: SocketAddr,
        query: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, DomainError> {
        let expected_id = transaction_id(query).ok_or_else(|| {
            DomainError::MalformedPacket("query is shorter than a transaction ID".to_string())
        })?;

        // Bind to ephemeral port (0 = OS assigns)
        let bind_addr = if server.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| DomainError::IoError(format!("Failed to bind UDP socket: {}", e)))?;

        let deadline = Instant::now() + timeout;
        let timed_out = || DomainError::QueryTimeout {
            server: server.to_string(),
        };

        let bytes_sent = tokio::time::timeout_at(deadline, socket.send_to(query, server))
            .await
            .map_err(|_| timed_out())?
            .map_err(|e| {
                DomainError::IoError(format!("Failed to send UDP query to {}: {}", server, e))
            })?;

        debug!(server = %server, bytes_sent, id = expected_id, "UDP query sent");

        // One spare byte tells an exactly-full datagram from a cut one.
        let mut recv_buf = vec![0u8; self.max_response_size + 1];

        loop {
            let (bytes_received, from_addr) =
                tokio::time::timeout_at(deadline, socket.recv_from(&mut recv_buf))
                    .await
                    .map_err(|_| timed_out())?
                    .map_err(|e| {
                        DomainError::IoError(format!(
                            "Failed to receive UDP response from {}: {}",
                            server, e
                        ))
                    })?;

            if from_addr != server {
                warn!(
                    expected = %server,
                    received_from = %from_addr,
                    "UDP response from unexpected source, discarding"
                );
                continue;
            }

            if bytes_received > self.max_response_size {
                return Err(DomainError::MalformedPacket(format!(
                    "response from {} exceeds {} bytes",
                    server, self.max_response_size
                )));
            }

            let received_id = transaction_id(&recv_buf[..bytes_received]);
            if received_id != Some(expected_id) {
                debug!(
                    server = %server,
                    expected = expected_id,
                    received = ?received_id,
                    "UDP response with mismatched transaction ID, discarding"
                );
                continue;
            }

            recv_buf.truncate(bytes_received);
            debug!(server = %server, bytes_received, "UDP response received");
            return Ok(recv_buf);
        }
    }
}
