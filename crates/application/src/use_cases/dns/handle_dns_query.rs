use crate::ports::{DnsResolver, Resolution, ResolutionFailure};
use regional_dns_domain::{Message, Opcode, RecordType};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Why a decoded client packet gets no reply at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotAQuery,
    UnsupportedOpcode(Opcode),
    QuestionCount(usize),
    UnsupportedType(RecordType),
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAQuery => f.write_str("packet is a response"),
            Self::UnsupportedOpcode(op) => write!(f, "opcode {} is not a standard query", op.to_u8()),
            Self::QuestionCount(n) => write!(f, "{} questions, expected exactly one", n),
            Self::UnsupportedType(t) => write!(f, "query type {} is not served", t),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Answered(Message),
    Ignored(IgnoreReason),
    Failed(ResolutionFailure),
}

impl QueryOutcome {
    pub fn into_reply(self) -> Option<Message> {
        match self {
            Self::Answered(message) => Some(message),
            Self::Ignored(_) | Self::Failed(_) => None,
        }
    }
}

/// Admits standard single-question queries of a served type and hands them
/// to the resolver. Everything else is dropped without a reply.
pub struct HandleDnsQueryUseCase {
    resolver: Arc<dyn DnsResolver>,
}

impl HandleDnsQueryUseCase {
    pub fn new(resolver: Arc<dyn DnsResolver>) -> Self {
        Self { resolver }
    }

    pub fn admit(query: &Message) -> Result<(), IgnoreReason> {
        if !query.header.is_query {
            return Err(IgnoreReason::NotAQuery);
        }
        if query.header.opcode != Opcode::Query {
            return Err(IgnoreReason::UnsupportedOpcode(query.header.opcode));
        }
        if query.questions.len() != 1 {
            return Err(IgnoreReason::QuestionCount(query.questions.len()));
        }
        let qtype = query.questions[0].qtype;
        if !qtype.is_supported_query() {
            return Err(IgnoreReason::UnsupportedType(qtype));
        }
        Ok(())
    }

    #[instrument(skip_all, fields(id = query.header.id))]
    pub async fn execute(&self, query: &Message) -> QueryOutcome {
        if let Err(reason) = Self::admit(query) {
            debug!(%reason, "Ignoring query");
            return QueryOutcome::Ignored(reason);
        }

        let start = Instant::now();
        let question = &query.questions[0];
        let resolution = self.resolver.resolve(query).await;
        let elapsed_us = start.elapsed().as_micros() as u64;

        match resolution {
            Resolution::Done(reply) => {
                info!(
                    name = %question.name,
                    record_type = %question.qtype,
                    status = %reply.header.response_code,
                    answers = reply.answers.len(),
                    elapsed_us,
                    "Query answered"
                );
                QueryOutcome::Answered(reply)
            }
            Resolution::Failed(failure) => {
                info!(
                    name = %question.name,
                    record_type = %question.qtype,
                    status = failure.status(),
                    elapsed_us,
                    "Query dropped"
                );
                QueryOutcome::Failed(failure)
            }
        }
    }
}
