use clap::Parser;
use regional_dns_domain::{CliOverrides, ResolutionMode};
use regional_dns_infrastructure::dns::DnsServerHandler;
use tracing::{error, info};

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "regional-dns")]
#[command(version)]
#[command(about = "Regional DNS - resolving name server that tags answers with cloud regions")]
struct Cli {
    /// Upstream server: root/TLD server (iterative) or recursive resolver (forward)
    #[arg(short = 'r', long, value_name = "ADDR|HOST")]
    server: Option<String>,

    /// Region table file (<ipv4>/<prefix>,<region> per line)
    #[arg(short = 'e', long, value_name = "FILE")]
    regions: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS server port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Resolution mode (iterative, forward)
    #[arg(long)]
    mode: Option<ResolutionMode>,

    /// Timeout for each upstream exchange, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        server: cli.server,
        regions_path: cli.regions,
        dns_port: cli.port,
        bind_address: cli.bind,
        mode: cli.mode,
        query_timeout_ms: cli.timeout_ms,
        log_level: cli.log_level,
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config.logging);

    info!("Starting Regional DNS v{}", env!("CARGO_PKG_VERSION"));

    let services = di::DnsServices::new(&config).await?;
    let handler = DnsServerHandler::new(services.handler_use_case)
        .with_max_packet_size(config.server.max_packet_size);

    let dns_addr = format!("{}:{}", config.server.bind_address, config.server.dns_port);
    if let Err(e) = server::start_dns_server(&dns_addr, handler).await {
        error!(error = %e, bind_address = %dns_addr, "DNS server error");
        return Err(e);
    }

    info!("Server shutdown complete");
    Ok(())
}
