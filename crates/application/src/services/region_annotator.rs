use regional_dns_domain::{RecordType, RegionTable, ResourceRecord};
use std::sync::Arc;
use tracing::debug;

/// Appends a `<region>-<address>` TXT record for every region whose range
/// contains an A answer.
#[derive(Debug, Clone, Default)]
pub struct RegionAnnotator {
    table: Arc<RegionTable>,
}

impl RegionAnnotator {
    pub fn new(table: Arc<RegionTable>) -> Self {
        Self { table }
    }

    /// TXT records for `answers`, in answer order then table order. Each one
    /// takes the owner name and TTL of the A record it describes.
    pub fn annotations(&self, answers: &[ResourceRecord]) -> Vec<ResourceRecord> {
        let mut out = Vec::new();
        if self.table.is_empty() {
            return out;
        }

        for record in answers.iter().filter(|r| r.record_type == RecordType::A) {
            let Some(addr) = record.ipv4() else {
                continue;
            };
            for entry in self.table.regions_for(addr) {
                out.push(ResourceRecord::txt(
                    record.name.clone(),
                    format!("{}-{}", entry.region, addr),
                    record.ttl,
                ));
            }
        }

        out
    }

    /// Appends the annotations after the existing answers and returns how
    /// many were added.
    pub fn annotate(&self, answers: &mut Vec<ResourceRecord>) -> usize {
        let extra = self.annotations(answers);
        let added = extra.len();
        if added > 0 {
            debug!(added, "Region annotations appended");
        }
        answers.extend(extra);
        added
    }
}
