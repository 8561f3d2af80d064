use anyhow::Context;
use regional_dns_domain::{CliOverrides, Config};

/// Loads, merges and validates configuration. Runs before logging exists,
/// so problems surface through the returned error.
pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
