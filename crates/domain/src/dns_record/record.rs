use super::{RecordClass, RecordType};
use crate::DomainName;
use std::net::{IpAddr, Ipv4Addr};

/// SOA payload (RFC 1035 §3.3.13).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoaData {
    pub mname: DomainName,
    pub rname: DomainName,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

/// Record payload, tagged by the shape of its wire encoding.
///
/// `Address` is 4 bytes for A and 16 for AAAA, `Name` serves NS, CNAME and
/// PTR, `Text` holds the concatenated character-strings of a TXT record.
/// Types without a structural decoder travel as `Opaque` bytes.
///
/// Any type that may carry a compressed name has to be decoded structurally:
/// names are re-encoded uncompressed, so a pointer copied inside opaque
/// bytes would dangle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rdata {
    Address(IpAddr),
    Name(DomainName),
    Text(String),
    Soa(SoaData),
    Mx { preference: u16, exchange: DomainName },
    Opaque(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: DomainName,
    pub record_type: RecordType,
    pub class: RecordClass,
    pub ttl: i32,
    pub rdata: Rdata,
}

impl ResourceRecord {
    pub fn new(name: DomainName, record_type: RecordType, ttl: i32, rdata: Rdata) -> Self {
        Self {
            name,
            record_type,
            class: RecordClass::IN,
            ttl,
            rdata,
        }
    }

    pub fn a(name: DomainName, address: Ipv4Addr, ttl: i32) -> Self {
        Self::new(name, RecordType::A, ttl, Rdata::Address(IpAddr::V4(address)))
    }

    pub fn ns(name: DomainName, server: DomainName, ttl: i32) -> Self {
        Self::new(name, RecordType::NS, ttl, Rdata::Name(server))
    }

    pub fn cname(name: DomainName, target: DomainName, ttl: i32) -> Self {
        Self::new(name, RecordType::CNAME, ttl, Rdata::Name(target))
    }

    pub fn txt(name: DomainName, text: impl Into<String>, ttl: i32) -> Self {
        Self::new(name, RecordType::TXT, ttl, Rdata::Text(text.into()))
    }

    pub fn mx(name: DomainName, preference: u16, exchange: DomainName, ttl: i32) -> Self {
        Self::new(name, RecordType::MX, ttl, Rdata::Mx { preference, exchange })
    }

    /// The IPv4 address of an A record.
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        match (self.record_type, &self.rdata) {
            (RecordType::A, Rdata::Address(IpAddr::V4(addr))) => Some(*addr),
            _ => None,
        }
    }

    /// The name an NS, CNAME or PTR record points at.
    pub fn target_name(&self) -> Option<&DomainName> {
        match &self.rdata {
            Rdata::Name(name) => Some(name),
            _ => None,
        }
    }
}
