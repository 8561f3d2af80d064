use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the configured upstream is used.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Walk referrals starting at a root or TLD server.
    #[default]
    Iterative,

    /// Hand the whole query to one recursive resolver.
    Forward,
}

impl ResolutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iterative => "iterative",
            Self::Forward => "forward",
        }
    }

    /// RD flag carried by outgoing queries in this mode.
    pub fn recursion_desired(&self) -> bool {
        matches!(self, Self::Forward)
    }
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "iterative" => Ok(Self::Iterative),
            "forward" => Ok(Self::Forward),
            _ => Err(format!(
                "Invalid resolution mode '{}'. Expected 'iterative' or 'forward'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// IP literal or hostname, optionally with `:port`.
    #[serde(default)]
    pub server: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub mode: ResolutionMode,

    /// Budget for each single upstream exchange.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Upstream exchanges allowed for one client query.
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            server: None,
            port: default_port(),
            mode: ResolutionMode::default(),
            query_timeout_ms: default_query_timeout_ms(),
            max_hops: default_max_hops(),
        }
    }
}

fn default_port() -> u16 {
    53
}

fn default_query_timeout_ms() -> u64 {
    2000
}

fn default_max_hops() -> usize {
    16
}
