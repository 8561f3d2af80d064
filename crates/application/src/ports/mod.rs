mod dns_resolver;
mod upstream_transport;

pub use dns_resolver::{DnsResolver, Resolution, ResolutionFailure};
pub use upstream_transport::UpstreamTransport;
