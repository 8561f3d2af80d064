#![allow(dead_code)]
use regional_dns_domain::{
    DomainName, Message, Question, RecordType, ResourceRecord, ResponseCode,
};
use std::net::Ipv4Addr;

pub fn name(s: &str) -> DomainName {
    s.parse().unwrap()
}

/// Builds response messages without going through the wire format.
pub struct ResponseBuilder {
    message: Message,
}

impl ResponseBuilder {
    pub fn new(id: u16, qname: &str, qtype: RecordType) -> Self {
        let mut message = Message::query(id, Question::new(name(qname), qtype), false);
        message.header.is_query = false;
        Self { message }
    }

    pub fn rcode(mut self, rcode: ResponseCode) -> Self {
        self.message.header.response_code = rcode;
        self
    }

    pub fn authoritative(mut self) -> Self {
        self.message.header.authoritative = true;
        self
    }

    pub fn answer_a(mut self, owner: &str, addr: &str, ttl: i32) -> Self {
        let addr: Ipv4Addr = addr.parse().unwrap();
        self.message.answers.push(ResourceRecord::a(name(owner), addr, ttl));
        self
    }

    pub fn answer_cname(mut self, owner: &str, target: &str) -> Self {
        self.message
            .answers
            .push(ResourceRecord::cname(name(owner), name(target), 300));
        self
    }

    pub fn authority_ns(mut self, zone: &str, server: &str) -> Self {
        self.message
            .authorities
            .push(ResourceRecord::ns(name(zone), name(server), 172800));
        self
    }

    pub fn glue_a(mut self, owner: &str, addr: &str) -> Self {
        let addr: Ipv4Addr = addr.parse().unwrap();
        self.message
            .additional
            .push(ResourceRecord::a(name(owner), addr, 172800));
        self
    }

    pub fn build(self) -> Message {
        self.message
    }
}
