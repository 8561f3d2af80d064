use async_trait::async_trait;
use regional_dns_domain::{
    DomainError, DomainName, Header, Message, Question, RecordType, ResolutionMode,
    ResourceRecord, ResponseCode, UpstreamConfig,
};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::RegionAnnotator;
use crate::ports::{DnsResolver, Resolution, ResolutionFailure, UpstreamTransport};

/// Where resolution starts and how far it may go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Root/TLD server in iterative mode, the recursive resolver in forward mode.
    pub upstream: SocketAddr,
    pub mode: ResolutionMode,
    /// Budget for each single exchange, not for the whole resolution.
    pub query_timeout: Duration,
    /// Exchanges allowed per client query, referrals and aliases included.
    pub max_hops: usize,
}

impl ResolverSettings {
    pub fn new(upstream: SocketAddr, mode: ResolutionMode) -> Self {
        let defaults = UpstreamConfig::default();
        Self {
            upstream,
            mode,
            query_timeout: Duration::from_millis(defaults.query_timeout_ms),
            max_hops: defaults.max_hops,
        }
    }

    pub fn from_config(upstream: SocketAddr, config: &UpstreamConfig) -> Self {
        Self {
            upstream,
            mode: config.mode,
            query_timeout: Duration::from_millis(config.query_timeout_ms),
            max_hops: config.max_hops,
        }
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }
}

/// Engine states. `Querying` sends to the current target; the two
/// `Following*` states retarget before the next exchange.
#[derive(Debug)]
enum ResolutionState {
    Querying,
    FollowingDelegation(Ipv4Addr),
    FollowingAlias(DomainName),
    Done(Message),
    Failed(ResolutionFailure),
}

/// Per-query working set. Dropped when the query is answered or abandoned.
struct Walk<'a> {
    client: &'a Message,
    question: &'a Question,
    target: SocketAddr,
    qname: DomainName,
    answers: Vec<ResourceRecord>,
    aliases: Vec<DomainName>,
    hops: usize,
}

/// Drives upstream exchanges for one client query until an answer is ready
/// or the attempt has to be abandoned.
pub struct ResolutionEngine {
    transport: Arc<dyn UpstreamTransport>,
    annotator: RegionAnnotator,
    settings: ResolverSettings,
}

impl ResolutionEngine {
    pub fn new(
        transport: Arc<dyn UpstreamTransport>,
        annotator: RegionAnnotator,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            transport,
            annotator,
            settings,
        }
    }

    async fn run(&self, walk: &mut Walk<'_>) -> Resolution {
        let mut state = ResolutionState::Querying;

        loop {
            match state {
                ResolutionState::Done(message) => return Resolution::Done(message),
                ResolutionState::Failed(failure) => return Resolution::Failed(failure),
                ResolutionState::FollowingDelegation(addr) => {
                    walk.target = SocketAddr::new(addr.into(), self.settings.upstream.port());
                    debug!(server = %walk.target, "Following delegation");
                }
                ResolutionState::FollowingAlias(name) => {
                    debug!(alias = %name, "Following alias from configured upstream");
                    walk.qname = name;
                    walk.target = self.settings.upstream;
                }
                ResolutionState::Querying => {}
            }

            state = self.step(walk).await;
        }
    }

    /// One exchange with the current target.
    async fn step(&self, walk: &mut Walk<'_>) -> ResolutionState {
        if walk.hops >= self.settings.max_hops {
            return ResolutionState::Failed(ResolutionFailure::HopLimitExceeded { hops: walk.hops });
        }
        walk.hops += 1;

        let server = walk.target;
        let query = Message::query(
            fastrand::u16(..),
            Question {
                name: walk.qname.clone(),
                qtype: walk.question.qtype,
                qclass: walk.question.qclass,
            },
            self.settings.mode.recursion_desired(),
        );

        debug!(
            hop = walk.hops,
            server = %server,
            name = %walk.qname,
            record_type = %walk.question.qtype,
            "Querying upstream"
        );

        let bytes = match self
            .transport
            .exchange(server, &query.encode(), self.settings.query_timeout)
            .await
        {
            Ok(bytes) => bytes,
            Err(DomainError::QueryTimeout { .. }) => {
                return ResolutionState::Failed(ResolutionFailure::Timeout { server });
            }
            Err(e) => {
                return ResolutionState::Failed(ResolutionFailure::Transport {
                    server,
                    reason: e.to_string(),
                });
            }
        };

        match Message::decode(&bytes) {
            Ok(response) => self.interpret(walk, response),
            Err(e) => ResolutionState::Failed(ResolutionFailure::MalformedResponse {
                server,
                reason: e.to_string(),
            }),
        }
    }

    fn interpret(&self, walk: &mut Walk<'_>, response: Message) -> ResolutionState {
        // A recursive server that clears RD has answered as far as it will.
        if self.settings.mode.recursion_desired() && !response.header.recursion_desired {
            return ResolutionState::Done(self.finalize(walk, response));
        }

        if response.header.response_code != ResponseCode::NoError {
            return ResolutionState::Done(self.finalize(walk, response));
        }

        let qtype = walk.question.qtype;

        if !response.answers.is_empty() {
            if response.answers.iter().any(|r| r.record_type == qtype) {
                return ResolutionState::Done(self.finalize(walk, response));
            }

            if let Some(target) = alias_target(&walk.qname, &response.answers) {
                return self.follow_alias(walk, target, response.answers);
            }

            return ResolutionState::Done(self.finalize(walk, response));
        }

        if qtype == RecordType::NS {
            let Message {
                header,
                authorities,
                additional,
                ..
            } = response;
            let response = Message {
                header,
                answers: additional,
                authorities,
                ..Message::default()
            };
            return ResolutionState::Done(self.finalize(walk, response));
        }

        let Some(zone) = response
            .authorities
            .iter()
            .find(|r| r.record_type == RecordType::NS)
            .map(|r| r.name.to_string())
        else {
            // NXDOMAIN/NODATA style answer: nothing left to chase.
            return ResolutionState::Done(self.finalize(walk, response));
        };

        for ns in response
            .authorities
            .iter()
            .filter(|r| r.record_type == RecordType::NS)
        {
            let Some(server_name) = ns.target_name() else {
                continue;
            };
            let glue = response
                .additional
                .iter()
                .filter(|r| r.name.eq_ignore_case(server_name))
                .find_map(ResourceRecord::ipv4);
            if let Some(addr) = glue {
                debug!(zone = %ns.name, name_server = %server_name, %addr, "Referral with glue");
                return ResolutionState::FollowingDelegation(addr);
            }
        }

        ResolutionState::Failed(ResolutionFailure::UnsatisfiableDelegation { zone })
    }

    fn follow_alias(
        &self,
        walk: &mut Walk<'_>,
        target: DomainName,
        chain: Vec<ResourceRecord>,
    ) -> ResolutionState {
        if target.eq_ignore_case(&walk.question.name)
            || walk.aliases.iter().any(|seen| seen.eq_ignore_case(&target))
        {
            return ResolutionState::Failed(ResolutionFailure::AliasLoop {
                name: target.to_string(),
            });
        }

        walk.answers.extend(chain);
        walk.aliases.push(target.clone());
        ResolutionState::FollowingAlias(target)
    }

    /// Builds the client-facing reply around the terminal upstream response.
    fn finalize(&self, walk: &mut Walk<'_>, response: Message) -> Message {
        let client = walk.client.header;
        let mut answers = std::mem::take(&mut walk.answers);
        answers.extend(response.answers);

        let mut reply = Message {
            header: Header {
                id: client.id,
                is_query: false,
                opcode: client.opcode,
                authoritative: false,
                truncated: response.header.truncated,
                recursion_desired: client.recursion_desired,
                recursion_available: true,
                authenticated_data: false,
                checking_disabled: client.checking_disabled,
                response_code: response.header.response_code,
            },
            questions: vec![walk.question.clone()],
            answers,
            authorities: response.authorities,
            additional: response.additional,
        };

        if walk.question.qtype == RecordType::A {
            self.annotator.annotate(&mut reply.answers);
        }

        reply
    }
}

/// End of the CNAME chain in `answers` that starts at `qname`. Falls back to
/// the first CNAME present when none is owned by `qname`.
fn alias_target(qname: &DomainName, answers: &[ResourceRecord]) -> Option<DomainName> {
    let cname_of = |owner: &DomainName| {
        answers
            .iter()
            .filter(|r| r.record_type == RecordType::CNAME && r.name.eq_ignore_case(owner))
            .find_map(ResourceRecord::target_name)
    };

    let mut current = match cname_of(qname) {
        Some(target) => target,
        None => answers
            .iter()
            .filter(|r| r.record_type == RecordType::CNAME)
            .find_map(ResourceRecord::target_name)?,
    };

    // bounded by the number of records so a cycle inside one answer ends
    for _ in 0..answers.len() {
        match cname_of(current) {
            Some(next) if !next.eq_ignore_case(current) => current = next,
            _ => break,
        }
    }

    Some(current.clone())
}

#[async_trait]
impl DnsResolver for ResolutionEngine {
    #[instrument(skip_all, fields(id = query.header.id))]
    async fn resolve(&self, query: &Message) -> Resolution {
        let Some(question) = query.question() else {
            return Resolution::Failed(ResolutionFailure::MissingQuestion);
        };

        let mut walk = Walk {
            client: query,
            question,
            target: self.settings.upstream,
            qname: question.name.clone(),
            answers: Vec::new(),
            aliases: Vec::new(),
            hops: 0,
        };

        let resolution = self.run(&mut walk).await;
        if let Resolution::Failed(failure) = &resolution {
            warn!(
                name = %question.name,
                record_type = %question.qtype,
                hops = walk.hops,
                error = %failure,
                "Resolution failed"
            );
        }
        resolution
    }
}
