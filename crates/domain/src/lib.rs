//! Regional DNS Domain Layer
pub mod config;
pub mod dns_message;
pub mod dns_name;
pub mod dns_record;
pub mod errors;
pub mod region;
pub mod wire;

pub use config::{
    CliOverrides, Config, ConfigError, LogFormat, LoggingConfig, RegionsConfig, ResolutionMode,
    ServerConfig, UpstreamConfig,
};
pub use dns_message::{Header, Message, Opcode, Question, ResponseCode};
pub use dns_name::DomainName;
pub use dns_record::{Rdata, RecordClass, RecordType, ResourceRecord, SoaData};
pub use errors::DomainError;
pub use region::{RegionEntry, RegionTable, RejectedLine};
