use regional_dns_domain::{DomainError, RegionTable};
use std::path::Path;
use tracing::{error, info, warn};

/// Reads the `<ipv4>/<prefix>,<region>` table file.
pub struct RegionTableLoader;

impl RegionTableLoader {
    /// Loads the table, degrading to an empty one when the file cannot be
    /// read. Unusable lines are logged and skipped.
    pub fn load(path: &Path) -> RegionTable {
        match Self::try_load(path) {
            Ok(table) => table,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Region table not loaded, answers will not be annotated");
                RegionTable::new()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<RegionTable, DomainError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DomainError::IoError(format!("{}: {}", path.display(), e)))?;

        let (table, rejected) = RegionTable::parse(&contents);
        for line in &rejected {
            warn!(
                path = %path.display(),
                line_number = line.line_number,
                line = %line.line,
                reason = %line.reason,
                "Skipping region table line"
            );
        }

        for (key, entry) in table.entries() {
            if entry.network.prefix() == 0 {
                warn!(prefix = key, region = %entry.region, "Region entry matches every address");
            }
        }

        info!(
            path = %path.display(),
            entries = table.len(),
            skipped = rejected.len(),
            "Region table loaded"
        );
        Ok(table)
    }
}
