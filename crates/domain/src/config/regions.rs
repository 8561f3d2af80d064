use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RegionsConfig {
    /// Path of the `<ipv4>/<prefix>,<region>` table. Required; a file that
    /// cannot be read leaves answers unannotated.
    #[serde(default)]
    pub table_path: Option<String>,
}
