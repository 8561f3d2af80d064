pub mod errors;
pub mod logging;
pub mod regions;
pub mod root;
pub mod server;
pub mod upstream;

pub use errors::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use regions::RegionsConfig;
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
pub use upstream::{ResolutionMode, UpstreamConfig};
