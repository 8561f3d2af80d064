use anyhow::Context;
use regional_dns_application::services::{RegionAnnotator, ResolutionEngine, ResolverSettings};
use regional_dns_application::use_cases::HandleDnsQueryUseCase;
use regional_dns_domain::Config;
use regional_dns_infrastructure::dns::{resolve_upstream, UdpTransport};
use regional_dns_infrastructure::regions::RegionTableLoader;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct DnsServices {
    pub handler_use_case: Arc<HandleDnsQueryUseCase>,
}

impl DnsServices {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let server = config
            .upstream
            .server
            .as_deref()
            .context("No upstream server configured")?;
        let upstream = resolve_upstream(server, config.upstream.port)
            .await
            .with_context(|| format!("Cannot use upstream server '{}'", server))?;

        let settings = ResolverSettings::from_config(upstream, &config.upstream);
        info!(
            upstream = %settings.upstream,
            mode = %settings.mode,
            timeout_ms = config.upstream.query_timeout_ms,
            max_hops = settings.max_hops,
            "Initializing resolution engine"
        );

        let table_path = config
            .regions
            .table_path
            .as_deref()
            .context("No region table configured")?;
        let table = RegionTableLoader::load(Path::new(table_path));
        let transport = UdpTransport::new().with_max_response_size(config.server.max_packet_size);
        let engine = ResolutionEngine::new(
            Arc::new(transport),
            RegionAnnotator::new(Arc::new(table)),
            settings,
        );
        let handler_use_case = Arc::new(HandleDnsQueryUseCase::new(Arc::new(engine)));

        Ok(Self { handler_use_case })
    }
}
