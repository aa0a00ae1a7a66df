//! Instance metadata (`meta-data`)

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use super::Document;

/// Host identity metadata consumed by the NoCloud datasource
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaData {
    #[serde(skip)]
    raw: Mapping,

    /// Hostname assigned on first boot
    #[serde(rename = "local-hostname", skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Instance identifier; cloud-init re-runs first-boot modules when
    /// this changes
    #[serde(rename = "instance-id", skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

impl Document for MetaData {
    const FILE_NAME: &'static str = "meta-data";

    fn raw(&self) -> &Mapping {
        &self.raw
    }

    fn set_raw(&mut self, raw: Mapping) {
        self.raw = raw;
    }
}
