use super::HEADER_LEN;
use crate::dns_name::MAX_NAME_LEN;
use crate::{
    DomainError, DomainName, Header, Message, Question, Rdata, RecordClass, RecordType,
    ResourceRecord, SoaData,
};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

fn malformed(reason: impl Into<String>) -> DomainError {
    DomainError::MalformedPacket(reason.into())
}

/// Decodes a complete message.
///
/// Section lengths come from the header counts; running out of bytes before
/// every declared entry is read is an error. Bytes after the last declared
/// record are ignored.
pub fn decode(buf: &[u8]) -> Result<Message, DomainError> {
    if buf.len() < HEADER_LEN {
        return Err(malformed(format!(
            "header needs {} bytes, packet has {}",
            HEADER_LEN,
            buf.len()
        )));
    }

    let mut reader = Reader::new(buf);
    let id = reader.u16()?;
    let flags = reader.u16()?;
    let qdcount = reader.u16()?;
    let ancount = reader.u16()?;
    let nscount = reader.u16()?;
    let arcount = reader.u16()?;

    let mut questions = Vec::with_capacity(preallocate(qdcount));
    for index in 0..qdcount {
        let question = reader
            .question()
            .map_err(|e| in_section(e, "question", index, qdcount))?;
        questions.push(question);
    }

    let answers = reader.section(ancount, "answer")?;
    let authorities = reader.section(nscount, "authority")?;
    let additional = reader.section(arcount, "additional")?;

    Ok(Message {
        header: Header::from_flags(id, flags),
        questions,
        answers,
        authorities,
        additional,
    })
}

/// Counts are attacker-controlled; never reserve more than a handful up front.
fn preallocate(count: u16) -> usize {
    usize::from(count).min(32)
}

fn in_section(err: DomainError, section: &str, index: u16, count: u16) -> DomainError {
    match err {
        DomainError::MalformedPacket(reason) => malformed(format!(
            "{} {} of {}: {}",
            section,
            index + 1,
            count,
            reason
        )),
        other => other,
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    names: NameArena,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            names: NameArena::default(),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DomainError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| {
                malformed(format!(
                    "need {} bytes at offset {}, packet has {}",
                    len,
                    self.pos,
                    self.buf.len()
                ))
            })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8, DomainError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, DomainError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, DomainError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i32(&mut self) -> Result<i32, DomainError> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn name(&mut self) -> Result<DomainName, DomainError> {
        let (head, end) = self.names.read(self.buf, self.pos)?;
        self.pos = end;
        self.names.materialize(self.buf, head)
    }

    fn question(&mut self) -> Result<Question, DomainError> {
        Ok(Question {
            name: self.name()?,
            qtype: RecordType::from_u16(self.u16()?),
            qclass: RecordClass::from_u16(self.u16()?),
        })
    }

    fn section(
        &mut self,
        count: u16,
        section: &str,
    ) -> Result<Vec<ResourceRecord>, DomainError> {
        let mut records = Vec::with_capacity(preallocate(count));
        for index in 0..count {
            let record = self
                .record()
                .map_err(|e| in_section(e, section, index, count))?;
            records.push(record);
        }
        Ok(records)
    }

    fn record(&mut self) -> Result<ResourceRecord, DomainError> {
        let name = self.name()?;
        let record_type = RecordType::from_u16(self.u16()?);
        let class = RecordClass::from_u16(self.u16()?);
        let ttl = self.i32()?;
        let rdlength = usize::from(self.u16()?);

        let start = self.pos;
        let end = start + rdlength;
        if end > self.buf.len() {
            return Err(malformed(format!(
                "{} rdata of {} bytes at offset {} runs past end of packet",
                record_type, rdlength, start
            )));
        }

        let rdata = self.rdata(record_type, rdlength, end)?;
        if self.pos != end {
            return Err(malformed(format!(
                "{} rdata length {} does not match its {} byte encoding",
                record_type,
                rdlength,
                self.pos - start
            )));
        }

        Ok(ResourceRecord {
            name,
            record_type,
            class,
            ttl,
            rdata,
        })
    }

    fn rdata(
        &mut self,
        record_type: RecordType,
        rdlength: usize,
        end: usize,
    ) -> Result<Rdata, DomainError> {
        match record_type {
            RecordType::A => {
                expect_len(record_type, rdlength, 4)?;
                let b = self.take(4)?;
                Ok(Rdata::Address(IpAddr::V4(Ipv4Addr::new(
                    b[0], b[1], b[2], b[3],
                ))))
            }
            RecordType::AAAA => {
                expect_len(record_type, rdlength, 16)?;
                let octets = <[u8; 16]>::try_from(self.take(16)?)
                    .map_err(|_| malformed("AAAA rdata is not 16 bytes"))?;
                Ok(Rdata::Address(IpAddr::V6(Ipv6Addr::from(octets))))
            }
            RecordType::NS | RecordType::CNAME | RecordType::PTR => {
                Ok(Rdata::Name(self.name()?))
            }
            RecordType::SOA => Ok(Rdata::Soa(SoaData {
                mname: self.name()?,
                rname: self.name()?,
                serial: self.u32()?,
                refresh: self.u32()?,
                retry: self.u32()?,
                expire: self.u32()?,
                minimum: self.u32()?,
            })),
            RecordType::MX => Ok(Rdata::Mx {
                preference: self.u16()?,
                exchange: self.name()?,
            }),
            RecordType::TXT => {
                let mut text = Vec::with_capacity(rdlength);
                while self.pos < end {
                    let len = usize::from(self.u8()?);
                    if self.pos + len > end {
                        return Err(malformed(format!(
                            "TXT character-string of {} bytes overruns rdata",
                            len
                        )));
                    }
                    text.extend_from_slice(self.take(len)?);
                }
                Ok(Rdata::Text(String::from_utf8_lossy(&text).into_owned()))
            }
            // SRV targets may not be compressed (RFC 2782), so raw bytes stay valid
            _ => Ok(Rdata::Opaque(self.take(rdlength)?.to_vec())),
        }
    }
}

fn expect_len(record_type: RecordType, rdlength: usize, expected: usize) -> Result<(), DomainError> {
    if rdlength != expected {
        return Err(malformed(format!(
            "{} rdata must be {} bytes, header says {}",
            record_type, expected, rdlength
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct LabelNode {
    /// Offset of the label's first content byte.
    start: usize,
    len: u8,
    next: Option<u32>,
    /// Wire length from this label down to the root, root byte included.
    suffix_len: u16,
}

/// Every label decoded so far, indexed by the offset of its length byte.
///
/// Names are chains of indices into `nodes`. A compression pointer that
/// lands on an offset already in `by_offset` reuses the stored chain instead
/// of re-reading the packet, and chains are only linked once fully read, so
/// they can never contain a cycle.
#[derive(Debug, Default)]
struct NameArena {
    nodes: Vec<LabelNode>,
    by_offset: FxHashMap<usize, u32>,
}

impl NameArena {
    /// Reads the name at `offset`. Returns the head of its label chain
    /// (`None` for the root) and the offset just past its in-place encoding.
    fn read(&mut self, buf: &[u8], offset: usize) -> Result<(Option<u32>, usize), DomainError> {
        let mut pending: SmallVec<[u32; 16]> = SmallVec::new();
        let mut pos = offset;
        let mut end: Option<usize> = None;
        let mut wire_len = 1usize;

        let tail = loop {
            // The inline part of a name is always read in full; sharing only
            // starts once a pointer has been followed.
            if end.is_some() {
                if let Some(&idx) = self.by_offset.get(&pos) {
                    if pending.contains(&idx) {
                        return Err(malformed(format!(
                            "compression loop through offset {}",
                            pos
                        )));
                    }
                    wire_len += usize::from(self.nodes[idx as usize].suffix_len) - 1;
                    if wire_len > MAX_NAME_LEN {
                        return Err(name_too_long(offset));
                    }
                    break Some(idx);
                }
            }

            let len_byte = *buf.get(pos).ok_or_else(|| {
                malformed(format!("name at offset {} runs past end of packet", offset))
            })?;

            match len_byte & 0xC0 {
                0x00 if len_byte == 0 => {
                    end.get_or_insert(pos + 1);
                    break None;
                }
                0x00 => {
                    let len = usize::from(len_byte);
                    let label_end = pos + 1 + len;
                    if label_end > buf.len() {
                        return Err(malformed(format!(
                            "label at offset {} runs past end of packet",
                            pos
                        )));
                    }
                    wire_len += 1 + len;
                    if wire_len > MAX_NAME_LEN {
                        return Err(name_too_long(offset));
                    }
                    let idx = u32::try_from(self.nodes.len())
                        .map_err(|_| malformed("too many labels"))?;
                    self.nodes.push(LabelNode {
                        start: pos + 1,
                        len: len_byte,
                        next: None,
                        suffix_len: 0,
                    });
                    self.by_offset.insert(pos, idx);
                    pending.push(idx);
                    pos = label_end;
                }
                0xC0 => {
                    let low = *buf.get(pos + 1).ok_or_else(|| {
                        malformed(format!("compression pointer at offset {} is cut short", pos))
                    })?;
                    let target = usize::from(u16::from_be_bytes([len_byte & 0x3F, low]));
                    if target >= pos {
                        return Err(malformed(format!(
                            "compression pointer at offset {} targets offset {}",
                            pos, target
                        )));
                    }
                    end.get_or_insert(pos + 2);
                    pos = target;
                }
                _ => {
                    return Err(malformed(format!(
                        "unsupported label type 0x{:02X} at offset {}",
                        len_byte, pos
                    )))
                }
            }
        };

        let mut next = tail;
        let mut suffix_len = tail.map_or(1, |idx| self.nodes[idx as usize].suffix_len);
        for &idx in pending.iter().rev() {
            let node = &mut self.nodes[idx as usize];
            suffix_len += 1 + u16::from(node.len);
            node.next = next;
            node.suffix_len = suffix_len;
            next = Some(idx);
        }

        // every exit from the loop above either errors or has set `end`
        Ok((next, end.unwrap_or(pos)))
    }

    fn materialize(&self, buf: &[u8], head: Option<u32>) -> Result<DomainName, DomainError> {
        let mut labels: SmallVec<[&[u8]; 8]> = SmallVec::new();
        let mut cursor = head;
        while let Some(idx) = cursor {
            let node = self.nodes[idx as usize];
            labels.push(&buf[node.start..node.start + usize::from(node.len)]);
            cursor = node.next;
        }
        DomainName::from_labels(labels).map_err(|e| malformed(e.to_string()))
    }
}

fn name_too_long(offset: usize) -> DomainError {
    malformed(format!(
        "name at offset {} exceeds {} bytes",
        offset, MAX_NAME_LEN
    ))
}
