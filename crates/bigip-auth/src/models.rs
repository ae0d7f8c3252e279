//! Partition models.

use bigip_core::types::Collection;
use serde::{Deserialize, Serialize};

/// Administrative partition as returned by `/mgmt/tm/auth/partition`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    /// Partition name (`Common`, `Tenant_A`, ...).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Resource kind (`tm:auth:partition:partitionstate`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Route domain used by objects created in the partition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_route_domain: Option<u32>,
    /// Full path (`/Tenant_A`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
    /// Link to the resource on the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Configuration generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
}

impl Partition {
    /// Create a partition payload carrying only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the default route domain.
    #[must_use]
    pub const fn with_default_route_domain(mut self, route_domain: u32) -> Self {
        self.default_route_domain = Some(route_domain);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partition collection envelope.
pub type Partitions = Collection<Partition>;
