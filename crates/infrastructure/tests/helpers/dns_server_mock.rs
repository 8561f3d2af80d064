use regional_dns_domain::{Message, ResourceRecord};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

/// How the mock answers each query it receives.
#[derive(Debug, Clone, Copy)]
pub enum MockBehavior {
    /// Authoritative answer with one A record for the queried name.
    Answer(Ipv4Addr),
    /// Reads queries and never replies.
    Silent,
    /// Sends a reply with the wrong transaction ID, then the real answer.
    WrongIdFirst(Ipv4Addr),
    /// Replies with a datagram of the given size.
    Oversized(usize),
}

pub struct MockDnsServer {
    addr: SocketAddr,
    received: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn start(behavior: MockBehavior) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = socket.local_addr()?;
        let received = Arc::new(AtomicUsize::new(0));
        let counter = received.clone();

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    result = socket.recv_from(&mut buf) => {
                        if let Ok((len, peer)) = result {
                            counter.fetch_add(1, Ordering::SeqCst);
                            for response in Self::build_mock_responses(&buf[..len], behavior) {
                                let _ = socket.send_to(&response, peer).await;
                            }
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            received,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn queries_received(&self) -> usize {
        self.received.load(Ordering::SeqCst)
    }

    fn answer(query: &Message, addr: Ipv4Addr) -> Vec<u8> {
        let mut reply = query.clone();
        reply.header.is_query = false;
        reply.header.authoritative = true;
        reply.header.recursion_desired = false;
        if let Some(question) = query.question() {
            reply
                .answers
                .push(ResourceRecord::a(question.name.clone(), addr, 60));
        }
        reply.encode()
    }

    fn build_mock_responses(query: &[u8], behavior: MockBehavior) -> Vec<Vec<u8>> {
        let Ok(query) = Message::decode(query) else {
            return vec![];
        };

        match behavior {
            MockBehavior::Answer(addr) => vec![Self::answer(&query, addr)],
            MockBehavior::Silent => vec![],
            MockBehavior::WrongIdFirst(addr) => {
                let mut stale = query.clone();
                stale.header.id = query.header.id.wrapping_add(1);
                vec![Self::answer(&stale, Ipv4Addr::new(192, 0, 2, 66)), Self::answer(&query, addr)]
            }
            MockBehavior::Oversized(size) => {
                let mut bytes = Self::answer(&query, Ipv4Addr::LOCALHOST);
                bytes.resize(size, 0);
                vec![bytes]
            }
        }
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
