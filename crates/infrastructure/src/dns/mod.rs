pub mod server;
pub mod transport;
pub mod upstream_addr;

pub use server::{run_udp_server, DnsServerHandler};
pub use transport::UdpTransport;
pub use upstream_addr::resolve_upstream;
