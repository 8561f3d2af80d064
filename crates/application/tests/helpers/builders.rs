use regional_dns_domain::{
    DomainName, Message, Question, RecordType, ResourceRecord, ResponseCode,
};
use std::net::Ipv4Addr;

pub fn name(s: &str) -> DomainName {
    s.parse().unwrap()
}

pub fn client_query(id: u16, qname: &str, qtype: RecordType) -> Message {
    Message::query(id, Question::new(name(qname), qtype), true)
}

/// Upstream reply skeleton; the mock copies the outgoing query's ID and
/// question into it before encoding.
pub struct ReplyBuilder {
    message: Message,
}

impl ReplyBuilder {
    pub fn new() -> Self {
        let mut message = Message::default();
        message.header.is_query = false;
        Self { message }
    }

    pub fn recursion_desired(mut self, rd: bool) -> Self {
        self.message.header.recursion_desired = rd;
        self
    }

    pub fn authoritative(mut self) -> Self {
        self.message.header.authoritative = true;
        self
    }

    pub fn rcode(mut self, rcode: ResponseCode) -> Self {
        self.message.header.response_code = rcode;
        self
    }

    pub fn answer_a(mut self, owner: &str, addr: &str) -> Self {
        let addr: Ipv4Addr = addr.parse().unwrap();
        self.message.answers.push(ResourceRecord::a(name(owner), addr, 300));
        self
    }

    pub fn answer_cname(mut self, owner: &str, target: &str) -> Self {
        self.message
            .answers
            .push(ResourceRecord::cname(name(owner), name(target), 300));
        self
    }

    pub fn answer_ns(mut self, zone: &str, server: &str) -> Self {
        self.message
            .answers
            .push(ResourceRecord::ns(name(zone), name(server), 3600));
        self
    }

    pub fn authority_ns(mut self, zone: &str, server: &str) -> Self {
        self.message
            .authorities
            .push(ResourceRecord::ns(name(zone), name(server), 172800));
        self
    }

    pub fn authority_record(mut self, record: ResourceRecord) -> Self {
        self.message.authorities.push(record);
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

impl Default for ReplyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
