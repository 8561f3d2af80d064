use crate::{DomainName, RecordClass, RecordType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: DomainName,
    pub qtype: RecordType,
    pub qclass: RecordClass,
}

impl Question {
    pub fn new(name: DomainName, qtype: RecordType) -> Self {
        Self {
            name,
            qtype,
            qclass: RecordClass::IN,
        }
    }
}
