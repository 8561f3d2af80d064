mod header;
mod question;

pub use header::{Header, Opcode, ResponseCode};
pub use question::Question;

use crate::{wire, DomainError, ResourceRecord};

/// One DNS packet: header plus the four record sections.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl Message {
    /// A standard query carrying a single question and empty record sections.
    pub fn query(id: u16, question: Question, recursion_desired: bool) -> Self {
        Self {
            header: Header {
                id,
                is_query: true,
                recursion_desired,
                ..Header::default()
            },
            questions: vec![question],
            ..Self::default()
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DomainError> {
        wire::decode(bytes)
    }

    pub fn encode(&self) -> Vec<u8> {
        wire::encode(self)
    }

    pub fn question(&self) -> Option<&Question> {
        self.questions.first()
    }
}
