use async_trait::async_trait;
use regional_dns_domain::Message;
use std::net::SocketAddr;
use thiserror::Error;

/// Why a resolution produced nothing to send back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionFailure {
    #[error("query carries no question")]
    MissingQuestion,

    #[error("no response from {server} before timeout")]
    Timeout { server: SocketAddr },

    #[error("exchange with {server} failed: {reason}")]
    Transport { server: SocketAddr, reason: String },

    #[error("undecodable response from {server}: {reason}")]
    MalformedResponse { server: SocketAddr, reason: String },

    #[error("referral for {zone} has no usable glue address")]
    UnsatisfiableDelegation { zone: String },

    #[error("gave up after {hops} upstream exchanges")]
    HopLimitExceeded { hops: usize },

    #[error("alias chain loops back to {name}")]
    AliasLoop { name: String },
}

impl ResolutionFailure {
    /// Short status label used in logs.
    pub fn status(&self) -> &'static str {
        match self {
            Self::MissingQuestion => "FORMERR",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Transport { .. } => "TRANSPORT",
            Self::MalformedResponse { .. } => "MALFORMED",
            Self::UnsatisfiableDelegation { .. } => "NO_GLUE",
            Self::HopLimitExceeded { .. } => "HOP_LIMIT",
            Self::AliasLoop { .. } => "ALIAS_LOOP",
        }
    }
}

/// Result of resolving one client query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Reply ready to encode and send to the client.
    Done(Message),
    /// Nothing is sent; the reason is kept for logging and tests.
    Failed(ResolutionFailure),
}

impl Resolution {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    pub fn into_message(self) -> Option<Message> {
        match self {
            Self::Done(message) => Some(message),
            Self::Failed(_) => None,
        }
    }
}

#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn resolve(&self, query: &Message) -> Resolution;
}
