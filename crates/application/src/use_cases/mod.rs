pub mod dns;

pub use dns::{HandleDnsQueryUseCase, IgnoreReason, QueryOutcome};
