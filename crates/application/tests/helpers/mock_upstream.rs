use async_trait::async_trait;
use regional_dns_application::ports::UpstreamTransport;
use regional_dns_domain::{DomainError, Message};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

pub enum Scripted {
    Reply(Message),
    Raw(Vec<u8>),
    Timeout,
    Error(DomainError),
}

/// Upstream transport answering from per-server scripts. A server with no
/// script left behaves as if it never answered.
#[derive(Default)]
pub struct MockUpstream {
    scripts: Mutex<HashMap<SocketAddr, VecDeque<Scripted>>>,
    exchanges: Mutex<Vec<(SocketAddr, Message)>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, server: &str, reply: Scripted) -> &Self {
        let server: SocketAddr = server.parse().unwrap();
        self.scripts
            .lock()
            .unwrap()
            .entry(server)
            .or_default()
            .push_back(reply);
        self
    }

    pub fn reply(&self, server: &str, message: Message) -> &Self {
        self.script(server, Scripted::Reply(message))
    }

    /// Every query sent so far, in order, with the server it went to.
    pub fn exchanges(&self) -> Vec<(SocketAddr, Message)> {
        self.exchanges.lock().unwrap().clone()
    }

    pub fn servers_contacted(&self) -> Vec<SocketAddr> {
        self.exchanges().into_iter().map(|(server, _)| server).collect()
    }
}

#[async_trait]
impl UpstreamTransport for MockUpstream {
    async fn exchange(
        &self,
        server: SocketAddr,
        query: &[u8],
        _timeout: Duration,
    ) -> Result<Vec<u8>, DomainError> {
        let query = Message::decode(query)?;
        self.exchanges.lock().unwrap().push((server, query.clone()));

        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&server)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Scripted::Reply(mut reply)) => {
                reply.header.id = query.header.id;
                reply.questions = query.questions.clone();
                Ok(reply.encode())
            }
            Some(Scripted::Raw(bytes)) => Ok(bytes),
            Some(Scripted::Error(e)) => Err(e),
            Some(Scripted::Timeout) | None => Err(DomainError::QueryTimeout {
                server: server.to_string(),
            }),
        }
    }
}
