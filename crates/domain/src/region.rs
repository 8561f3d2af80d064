use crate::DomainError;
use ipnetwork::Ipv4Network;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// One `address/prefix` range and the region it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionEntry {
    pub network: Ipv4Network,
    pub region: Arc<str>,
}

impl RegionEntry {
    /// Parses the literal `a.b.c.d/len` key used by the table file.
    ///
    /// The address is kept as written; host bits are masked off only when
    /// matching.
    pub fn parse_prefix(key: &str) -> Result<Ipv4Network, DomainError> {
        let (addr, prefix) = key
            .split_once('/')
            .ok_or_else(|| DomainError::InvalidCidr(format!("{} has no /prefix", key)))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| DomainError::InvalidIpAddress(addr.to_string()))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| DomainError::InvalidCidr(format!("bad prefix length in {}", key)))?;
        Ipv4Network::new(addr, prefix).map_err(|e| DomainError::InvalidCidr(format!("{}: {}", key, e)))
    }

    /// Masked comparison; a zero-length prefix matches every address.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.network.contains(addr)
    }
}

/// A line of the table file that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    pub line_number: usize,
    pub line: String,
    pub reason: String,
}

/// Address ranges keyed by their literal `address/prefix` text.
///
/// Ranges may overlap; an address collects every region whose range holds
/// it. Inserting the same literal key twice keeps the later region.
#[derive(Debug, Clone, Default)]
pub struct RegionTable {
    entries: BTreeMap<String, RegionEntry>,
}

impl RegionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `<ipv4>/<prefix>,<region>` lines. Unusable lines are returned
    /// alongside the table instead of aborting the load.
    pub fn parse(contents: &str) -> (Self, Vec<RejectedLine>) {
        let mut table = Self::new();
        let mut rejected = Vec::new();

        for (index, line) in contents.lines().enumerate() {
            let mut fields = line.split(',');
            let prefix = fields.next().unwrap_or_default();
            let outcome = match fields.next() {
                Some(region) if !region.is_empty() => table.insert(prefix, region).map(|_| ()),
                _ => Err(DomainError::RegionTable("expected <prefix>,<region>".to_string())),
            };

            if let Err(e) = outcome {
                rejected.push(RejectedLine {
                    line_number: index + 1,
                    line: line.to_string(),
                    reason: e.to_string(),
                });
            }
        }

        (table, rejected)
    }

    /// Adds or replaces the entry for `prefix`, returning the replaced one.
    pub fn insert(&mut self, prefix: &str, region: &str) -> Result<Option<RegionEntry>, DomainError> {
        let network = RegionEntry::parse_prefix(prefix)?;
        Ok(self.entries.insert(
            prefix.to_string(),
            RegionEntry {
                network,
                region: Arc::from(region),
            },
        ))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &RegionEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// Every entry whose range contains `addr`, in key order.
    pub fn regions_for(&self, addr: Ipv4Addr) -> impl Iterator<Item = &RegionEntry> {
        self.entries.values().filter(move |entry| entry.contains(addr))
    }
}
