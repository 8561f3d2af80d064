use super::MAX_CHARACTER_STRING;
use crate::{DomainName, Message, Question, Rdata, ResourceRecord};
use std::net::IpAddr;

const MAX_SECTION_LEN: usize = u16::MAX as usize;
const MAX_RDATA_LEN: usize = u16::MAX as usize;

/// Encodes a message. Section counts are taken from the section lengths.
pub fn encode(message: &Message) -> Vec<u8> {
    let mut buf = Vec::with_capacity(512);

    put_u16(&mut buf, message.header.id);
    put_u16(&mut buf, message.header.flags());
    for len in [
        message.questions.len(),
        message.answers.len(),
        message.authorities.len(),
        message.additional.len(),
    ] {
        put_u16(&mut buf, section_count(len));
    }

    for question in message.questions.iter().take(MAX_SECTION_LEN) {
        put_question(&mut buf, question);
    }
    for section in [&message.answers, &message.authorities, &message.additional] {
        for record in section.iter().take(MAX_SECTION_LEN) {
            put_record(&mut buf, record);
        }
    }

    buf
}

fn section_count(len: usize) -> u16 {
    u16::try_from(len).unwrap_or(u16::MAX)
}

fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_be_bytes());
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

fn put_name(buf: &mut Vec<u8>, name: &DomainName) {
    for label in name.labels() {
        // DomainName guarantees 1..=63 bytes per label
        buf.push(label.len() as u8);
        buf.extend_from_slice(label);
    }
    buf.push(0);
}

fn put_question(buf: &mut Vec<u8>, question: &Question) {
    put_name(buf, &question.name);
    put_u16(buf, question.qtype.to_u16());
    put_u16(buf, question.qclass.to_u16());
}

fn put_record(buf: &mut Vec<u8>, record: &ResourceRecord) {
    put_name(buf, &record.name);
    put_u16(buf, record.record_type.to_u16());
    put_u16(buf, record.class.to_u16());
    buf.extend_from_slice(&record.ttl.to_be_bytes());

    let len_at = buf.len();
    put_u16(buf, 0);
    put_rdata(buf, &record.rdata);

    let rdlength = section_count(buf.len() - len_at - 2);
    buf[len_at..len_at + 2].copy_from_slice(&rdlength.to_be_bytes());
}

fn put_rdata(buf: &mut Vec<u8>, rdata: &Rdata) {
    match rdata {
        Rdata::Address(IpAddr::V4(addr)) => buf.extend_from_slice(&addr.octets()),
        Rdata::Address(IpAddr::V6(addr)) => buf.extend_from_slice(&addr.octets()),
        Rdata::Name(name) => put_name(buf, name),
        Rdata::Text(text) => put_text(buf, text.as_bytes()),
        Rdata::Soa(soa) => {
            put_name(buf, &soa.mname);
            put_name(buf, &soa.rname);
            for value in [soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum] {
                put_u32(buf, value);
            }
        }
        Rdata::Mx {
            preference,
            exchange,
        } => {
            put_u16(buf, *preference);
            put_name(buf, exchange);
        }
        Rdata::Opaque(bytes) => buf.extend_from_slice(&bytes[..bytes.len().min(MAX_RDATA_LEN)]),
    }
}

/// Splits text into 255-byte character-strings, stopping before the rdata
/// would outgrow its 16-bit length field.
fn put_text(buf: &mut Vec<u8>, text: &[u8]) {
    if text.is_empty() {
        buf.push(0);
        return;
    }

    let mut budget = MAX_RDATA_LEN;
    for chunk in text.chunks(MAX_CHARACTER_STRING) {
        if chunk.len() + 1 > budget {
            break;
        }
        budget -= chunk.len() + 1;
        buf.push(chunk.len() as u8);
        buf.extend_from_slice(chunk);
    }
}
