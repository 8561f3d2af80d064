mod helpers;

use helpers::builders::{client_query, name, ReplyBuilder};
use helpers::mock_upstream::{MockUpstream, Scripted};
use regional_dns_application::ports::{DnsResolver, Resolution, ResolutionFailure};
use regional_dns_application::services::{RegionAnnotator, ResolutionEngine, ResolverSettings};
use regional_dns_domain::{
    DomainError, Message, Rdata, RecordType, RegionTable, ResolutionMode, ResourceRecord,
    ResponseCode, SoaData,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

const ROOT: &str = "198.41.0.4:53";
const TLD: &str = "192.0.2.10:53";
const AUTH: &str = "192.0.2.20:53";

fn addr(s: &str) -> SocketAddr {
    s.parse().unwrap()
}

fn engine(upstream: &Arc<MockUpstream>, mode: ResolutionMode, regions: &str) -> ResolutionEngine {
    let (table, _) = RegionTable::parse(regions);
    ResolutionEngine::new(
        upstream.clone(),
        RegionAnnotator::new(Arc::new(table)),
        ResolverSettings::new(addr(ROOT), mode).with_query_timeout(Duration::from_millis(50)),
    )
}

fn iterative(upstream: &Arc<MockUpstream>) -> ResolutionEngine {
    engine(upstream, ResolutionMode::Iterative, "")
}

fn done(resolution: Resolution) -> Message {
    assert!(resolution.is_done(), "expected an answer, got {:?}", resolution);
    resolution.into_message().unwrap()
}

fn failed(resolution: Resolution) -> ResolutionFailure {
    assert!(!resolution.is_done());
    match resolution {
        Resolution::Failed(failure) => failure,
        Resolution::Done(message) => panic!("expected a failure, got {:?}", message),
    }
}

fn a_addresses(message: &Message) -> Vec<String> {
    message
        .answers
        .iter()
        .filter_map(ResourceRecord::ipv4)
        .map(|a| a.to_string())
        .collect()
}

// ── delegation walk ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delegation_walk_follows_glue() {
    let upstream = Arc::new(MockUpstream::new());
    upstream
        .reply(
            ROOT,
            ReplyBuilder::new()
                .authority_ns("com", "a.gtld-servers.net")
                .glue_a("a.gtld-servers.net", "192.0.2.10")
                .build(),
        )
        .reply(
            TLD,
            ReplyBuilder::new()
                .authority_ns("example.com", "ns1.example.com")
                .glue_a("ns1.example.com", "192.0.2.20")
                .build(),
        )
        .reply(
            AUTH,
            ReplyBuilder::new()
                .authoritative()
                .answer_a("www.example.com", "93.184.216.34")
                .build(),
        );

    let query = client_query(0x1234, "www.example.com", RecordType::A);
    let reply = done(iterative(&upstream).resolve(&query).await);

    assert_eq!(upstream.servers_contacted(), vec![addr(ROOT), addr(TLD), addr(AUTH)]);
    assert_eq!(a_addresses(&reply), vec!["93.184.216.34"]);
    assert_eq!(reply.header.id, 0x1234);
    assert!(!reply.header.is_query);
    assert!(reply.header.recursion_available);
    assert!(!reply.header.authoritative);
    assert_eq!(reply.questions, query.questions);
}

#[tokio::test]
async fn test_iterative_queries_do_not_request_recursion() {
    let upstream = Arc::new(MockUpstream::new());
    upstream.reply(ROOT, ReplyBuilder::new().answer_a("example.com", "192.0.2.1").build());

    let query = client_query(1, "example.com", RecordType::A);
    done(iterative(&upstream).resolve(&query).await);

    let (_, sent) = &upstream.exchanges()[0];
    assert!(sent.header.is_query);
    assert!(!sent.header.recursion_desired);
    assert!(sent.authorities.is_empty());
    assert!(sent.additional.is_empty());
    assert_eq!(sent.questions, query.questions);
}

#[tokio::test]
async fn test_glue_match_is_case_insensitive() {
    let upstream = Arc::new(MockUpstream::new());
    upstream
        .reply(
            ROOT,
            ReplyBuilder::new()
                .authority_ns("example.com", "NS1.Example.COM")
                .glue_a("ns1.example.com", "192.0.2.20")
                .build(),
        )
        .reply(AUTH, ReplyBuilder::new().answer_a("example.com", "192.0.2.1").build());

    let query = client_query(1, "example.com", RecordType::A);
    done(iterative(&upstream).resolve(&query).await);

    assert_eq!(upstream.servers_contacted(), vec![addr(ROOT), addr(AUTH)]);
}

#[tokio::test]
async fn test_second_ns_used_when_first_has_no_glue() {
    let upstream = Arc::new(MockUpstream::new());
    upstream
        .reply(
            ROOT,
            ReplyBuilder::new()
                .authority_ns("example.com", "ns1.elsewhere.net")
                .authority_ns("example.com", "ns2.example.com")
                .glue_a("ns2.example.com", "192.0.2.20")
                .build(),
        )
        .reply(AUTH, ReplyBuilder::new().answer_a("example.com", "192.0.2.1").build());

    let query = client_query(1, "example.com", RecordType::A);
    done(iterative(&upstream).resolve(&query).await);

    assert_eq!(upstream.servers_contacted()[1], addr(AUTH));
}

#[tokio::test]
async fn test_referral_without_glue_fails() {
    let upstream = Arc::new(MockUpstream::new());
    upstream.reply(
        ROOT,
        ReplyBuilder::new()
            .authority_ns("example.com", "ns1.elsewhere.net")
            .glue_a("unrelated.example.com", "192.0.2.99")
            .build(),
    );

    let query = client_query(1, "example.com", RecordType::A);
    let failure = failed(iterative(&upstream).resolve(&query).await);

    assert_eq!(
        failure,
        ResolutionFailure::UnsatisfiableDelegation {
            zone: "example.com".to_string()
        }
    );
}

// ── aliases ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cname_chase_restarts_at_upstream() {
    let upstream = Arc::new(MockUpstream::new());
    upstream
        .reply(
            ROOT,
            ReplyBuilder::new()
                .answer_cname("www.example.com", "cdn.example.net")
                .build(),
        )
        .reply(
            ROOT,
            ReplyBuilder::new()
                .answer_a("cdn.example.net", "203.0.113.7")
                .build(),
        );

    let query = client_query(9, "www.example.com", RecordType::A);
    let reply = done(iterative(&upstream).resolve(&query).await);

    let exchanges = upstream.exchanges();
    assert_eq!(exchanges.len(), 2);
    assert_eq!(exchanges[1].0, addr(ROOT));
    assert_eq!(exchanges[1].1.questions[0].name, name("cdn.example.net"));
    assert_eq!(exchanges[1].1.questions[0].qtype, RecordType::A);

    assert_eq!(reply.answers.len(), 2);
    assert_eq!(reply.answers[0].record_type, RecordType::CNAME);
    assert_eq!(reply.answers[0].name, name("www.example.com"));
    assert_eq!(reply.answers[1].name, name("cdn.example.net"));
    assert_eq!(a_addresses(&reply), vec!["203.0.113.7"]);
    assert_eq!(reply.questions[0].name, name("www.example.com"));
}

#[tokio::test]
async fn test_cname_query_is_answered_by_cname() {
    let upstream = Arc::new(MockUpstream::new());
    upstream.reply(
        ROOT,
        ReplyBuilder::new()
            .answer_cname("www.example.com", "cdn.example.net")
            .build(),
    );

    let query = client_query(1, "www.example.com", RecordType::CNAME);
    let reply = done(iterative(&upstream).resolve(&query).await);

    assert_eq!(upstream.exchanges().len(), 1);
    assert_eq!(reply.answers.len(), 1);
}

#[tokio::test]
async fn test_alias_cycle_is_detected() {
    let upstream = Arc::new(MockUpstream::new());
    upstream
        .reply(ROOT, ReplyBuilder::new().answer_cname("a.example", "b.example").build())
        .reply(ROOT, ReplyBuilder::new().answer_cname("b.example", "a.example").build());

    let query = client_query(1, "a.example", RecordType::A);
    let failure = failed(iterative(&upstream).resolve(&query).await);

    assert_eq!(
        failure,
        ResolutionFailure::AliasLoop {
            name: "a.example".to_string()
        }
    );
    assert_eq!(upstream.exchanges().len(), 2);
}

// ── bounds and failures ────────────────────────────────────────────────────

#[tokio::test]
async fn test_hop_limit_stops_endless_referrals() {
    let upstream = Arc::new(MockUpstream::new());
    for _ in 0..10 {
        upstream.reply(
            ROOT,
            ReplyBuilder::new()
                .authority_ns("example.com", "ns.example.com")
                .glue_a("ns.example.com", "198.41.0.4")
                .build(),
        );
    }

    let (table, _) = RegionTable::parse("");
    let engine = ResolutionEngine::new(
        upstream.clone(),
        RegionAnnotator::new(Arc::new(table)),
        ResolverSettings::new(addr(ROOT), ResolutionMode::Iterative).with_max_hops(4),
    );

    let query = client_query(1, "example.com", RecordType::A);
    let failure = failed(engine.resolve(&query).await);

    assert_eq!(failure, ResolutionFailure::HopLimitExceeded { hops: 4 });
    assert_eq!(upstream.exchanges().len(), 4);
}

#[tokio::test]
async fn test_timeout_fails_resolution() {
    let upstream = Arc::new(MockUpstream::new());
    upstream.script(ROOT, Scripted::Timeout);

    let query = client_query(1, "example.com", RecordType::A);
    let failure = failed(iterative(&upstream).resolve(&query).await);

    assert_eq!(failure, ResolutionFailure::Timeout { server: addr(ROOT) });
}

#[tokio::test]
async fn test_timeout_mid_walk_fails_resolution() {
    let upstream = Arc::new(MockUpstream::new());
    upstream.reply(
        ROOT,
        ReplyBuilder::new()
            .authority_ns("example.com", "ns1.example.com")
            .glue_a("ns1.example.com", "192.0.2.20")
            .build(),
    );

    let query = client_query(1, "example.com", RecordType::A);
    let failure = failed(iterative(&upstream).resolve(&query).await);

    assert_eq!(failure, ResolutionFailure::Timeout { server: addr(AUTH) });
}

#[tokio::test]
async fn test_transport_error_fails_resolution() {
    let upstream = Arc::new(MockUpstream::new());
    upstream.script(
        ROOT,
        Scripted::Error(DomainError::IoError("network unreachable".to_string())),
    );

    let query = client_query(1, "example.com", RecordType::A);
    let failure = failed(iterative(&upstream).resolve(&query).await);

    assert!(matches!(failure, ResolutionFailure::Transport { .. }));
}

#[tokio::test]
async fn test_malformed_response_fails_resolution() {
    let upstream = Arc::new(MockUpstream::new());
    upstream.script(ROOT, Scripted::Raw(vec![0x00, 0x01, 0x80]));

    let query = client_query(1, "example.com", RecordType::A);
    let failure = failed(iterative(&upstream).resolve(&query).await);

    assert!(matches!(failure, ResolutionFailure::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_query_without_question_fails() {
    let upstream = Arc::new(MockUpstream::new());
    let query = Message::default();

    let failure = failed(iterative(&upstream).resolve(&query).await);

    assert_eq!(failure, ResolutionFailure::MissingQuestion);
    assert!(upstream.exchanges().is_empty());
}

// ── terminal responses ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_nxdomain_is_relayed() {
    let soa = ResourceRecord::new(
        name("example.com"),
        RecordType::SOA,
        900,
        Rdata::Soa(SoaData {
            mname: name("ns1.example.com"),
            rname: name("hostmaster.example.com"),
            serial: 1,
            refresh: 7200,
            retry: 900,
            expire: 1209600,
            minimum: 300,
        }),
    );
    let upstream = Arc::new(MockUpstream::new());
    upstream.reply(
        ROOT,
        ReplyBuilder::new()
            .rcode(ResponseCode::NxDomain)
            .authority_record(soa.clone())
            .build(),
    );

    let query = client_query(5, "missing.example.com", RecordType::A);
    let reply = done(iterative(&upstream).resolve(&query).await);

    assert_eq!(reply.header.response_code, ResponseCode::NxDomain);
    assert!(reply.answers.is_empty());
    assert_eq!(reply.authorities, vec![soa]);
}

#[tokio::test]
async fn test_empty_answer_without_referral_is_relayed() {
    let upstream = Arc::new(MockUpstream::new());
    upstream.reply(ROOT, ReplyBuilder::new().build());

    let query = client_query(5, "example.com", RecordType::AAAA);
    let reply = done(iterative(&upstream).resolve(&query).await);

    assert_eq!(reply.header.response_code, ResponseCode::NoError);
    assert!(reply.answers.is_empty());
}

#[tokio::test]
async fn test_ns_query_with_empty_answer_uses_additional() {
    let upstream = Arc::new(MockUpstream::new());
    upstream.reply(
        ROOT,
        ReplyBuilder::new()
            .authority_ns("example.com", "ns1.example.com")
            .glue_a("ns1.example.com", "192.0.2.20")
            .build(),
    );

    let query = client_query(5, "example.com", RecordType::NS);
    let reply = done(iterative(&upstream).resolve(&query).await);

    assert_eq!(upstream.exchanges().len(), 1);
    assert_eq!(a_addresses(&reply), vec!["192.0.2.20"]);
    assert_eq!(reply.authorities.len(), 1);
    assert!(reply.additional.is_empty());
}

#[tokio::test]
async fn test_ns_query_with_answer_is_returned() {
    let upstream = Arc::new(MockUpstream::new());
    upstream.reply(
        ROOT,
        ReplyBuilder::new()
            .answer_ns("example.com", "ns1.example.com")
            .answer_ns("example.com", "ns2.example.com")
            .build(),
    );

    let query = client_query(5, "example.com", RecordType::NS);
    let reply = done(iterative(&upstream).resolve(&query).await);

    assert_eq!(reply.answers.len(), 2);
}

// ── forward mode ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_forward_mode_sets_rd_and_stops_on_cleared_rd() {
    let upstream = Arc::new(MockUpstream::new());
    upstream.reply(
        ROOT,
        ReplyBuilder::new()
            .recursion_desired(false)
            .authority_ns("example.com", "ns1.example.com")
            .glue_a("ns1.example.com", "192.0.2.20")
            .build(),
    );

    let query = client_query(5, "example.com", RecordType::A);
    let reply = done(engine(&upstream, ResolutionMode::Forward, "").resolve(&query).await);

    let exchanges = upstream.exchanges();
    assert_eq!(exchanges.len(), 1);
    assert!(exchanges[0].1.header.recursion_desired);
    assert!(reply.answers.is_empty());
    assert_eq!(reply.authorities.len(), 1);
}

#[tokio::test]
async fn test_forward_mode_recursive_answer() {
    let upstream = Arc::new(MockUpstream::new());
    upstream.reply(
        ROOT,
        ReplyBuilder::new()
            .recursion_desired(true)
            .answer_cname("www.example.com", "cdn.example.net")
            .answer_a("cdn.example.net", "203.0.113.7")
            .build(),
    );

    let query = client_query(5, "www.example.com", RecordType::A);
    let reply = done(engine(&upstream, ResolutionMode::Forward, "").resolve(&query).await);

    assert_eq!(upstream.exchanges().len(), 1);
    assert_eq!(reply.answers.len(), 2);
    assert_eq!(a_addresses(&reply), vec!["203.0.113.7"]);
}

// ── region annotation ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_a_answer_is_annotated() {
    let upstream = Arc::new(MockUpstream::new());
    upstream.reply(
        ROOT,
        ReplyBuilder::new()
            .authoritative()
            .answer_a("example.com", "93.184.216.34")
            .build(),
    );

    let query = client_query(5, "example.com", RecordType::A);
    let reply = done(
        engine(&upstream, ResolutionMode::Iterative, "93.184.216.0/24,test-region\n")
            .resolve(&query)
            .await,
    );

    assert_eq!(reply.answers.len(), 2);
    assert_eq!(reply.answers[1].record_type, RecordType::TXT);
    assert_eq!(
        reply.answers[1].rdata,
        Rdata::Text("test-region-93.184.216.34".to_string())
    );
}

#[tokio::test]
async fn test_non_a_question_is_not_annotated() {
    let upstream = Arc::new(MockUpstream::new());
    upstream.reply(
        ROOT,
        ReplyBuilder::new()
            .answer_ns("example.com", "ns1.example.com")
            .answer_a("ns1.example.com", "93.184.216.1")
            .build(),
    );

    let query = client_query(5, "example.com", RecordType::NS);
    let reply = done(
        engine(&upstream, ResolutionMode::Iterative, "93.184.216.0/24,test-region\n")
            .resolve(&query)
            .await,
    );

    assert!(reply
        .answers
        .iter()
        .all(|r| r.record_type != RecordType::TXT));
}
