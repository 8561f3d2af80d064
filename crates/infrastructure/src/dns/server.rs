use regional_dns_application::use_cases::{HandleDnsQueryUseCase, QueryOutcome};
use regional_dns_domain::wire::MAX_PACKET_SIZE;
use regional_dns_domain::Message;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, error, info, warn};

/// Turns raw client datagrams into raw replies.
pub struct DnsServerHandler {
    use_case: Arc<HandleDnsQueryUseCase>,
    max_packet_size: usize,
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<HandleDnsQueryUseCase>) -> Self {
        Self {
            use_case,
            max_packet_size: MAX_PACKET_SIZE,
        }
    }

    pub fn with_max_packet_size(mut self, size: usize) -> Self {
        self.max_packet_size = size;
        self
    }

    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    /// Returns the encoded reply, or `None` when the client gets nothing:
    /// oversized or undecodable packets, ignored queries and failed
    /// resolutions.
    pub async fn handle_raw_udp(&self, packet: &[u8], client: SocketAddr) -> Option<Vec<u8>> {
        if packet.len() > self.max_packet_size {
            warn!(
                client = %client,
                limit = self.max_packet_size,
                "Oversized datagram dropped"
            );
            return None;
        }

        let query = match Message::decode(packet) {
            Ok(query) => query,
            Err(e) => {
                debug!(client = %client, error = %e, "Malformed query dropped");
                return None;
            }
        };

        match self.use_case.execute(&query).await {
            QueryOutcome::Answered(reply) => Some(reply.encode()),
            QueryOutcome::Ignored(reason) => {
                debug!(client = %client, %reason, "Query ignored");
                None
            }
            QueryOutcome::Failed(failure) => {
                debug!(client = %client, error = %failure, "No reply sent");
                None
            }
        }
    }
}

/// Serves client queries one at a time until the socket fails.
///
/// Each query is resolved to completion before the next datagram is read.
pub async fn run_udp_server(socket: UdpSocket, handler: Arc<DnsServerHandler>) -> io::Result<()> {
    // One spare byte tells an exactly-full datagram from a cut one.
    let mut recv_buf = vec![0u8; handler.max_packet_size() + 1];

    if let Ok(addr) = socket.local_addr() {
        info!(bind_address = %addr, "DNS server ready");
    }

    loop {
        let (len, client) = match socket.recv_from(&mut recv_buf).await {
            Ok(received) => received,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::ConnectionReset
                ) =>
            {
                continue
            }
            Err(e) => {
                error!(error = %e, "UDP recv error");
                return Err(e);
            }
        };

        let Some(reply) = handler.handle_raw_udp(&recv_buf[..len], client).await else {
            continue;
        };

        if let Err(e) = socket.send_to(&reply, client).await {
            warn!(client = %client, error = %e, "Failed to send reply");
        }
    }
}
