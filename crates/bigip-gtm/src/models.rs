//! GTM models shared by the client and fixture tests.
//!
//! Every field except `name` is optional and skipped when unset, so a payload built with
//! only a name and partition serializes to exactly those two properties.

use bigip_core::path::{FullPath, DEFAULT_PARTITION};
use bigip_core::types::{Collection, Reference, SubcollectionReference};
use bigip_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// DNS record type of a wide IP or GTM pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
    /// Canonical name record
    Cname,
    /// Mail exchange record
    Mx,
    /// Naming authority pointer record
    Naptr,
    /// Service locator record
    Srv,
}

impl RecordType {
    /// URL segment used by the GTM endpoints (`wideip/a`, `pool/cname`, ...).
    #[must_use]
    pub const fn as_segment(&self) -> &'static str {
        match self {
            Self::A => "a",
            Self::Aaaa => "aaaa",
            Self::Cname => "cname",
            Self::Mx => "mx",
            Self::Naptr => "naptr",
            Self::Srv => "srv",
        }
    }

    /// Returns all record types.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::A,
            Self::Aaaa,
            Self::Cname,
            Self::Mx,
            Self::Naptr,
            Self::Srv,
        ]
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_segment())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|record_type| record_type.as_segment().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidRequest(format!("Unknown GTM record type: {s}")))
    }
}

/// Common accessors of named GTM configuration objects.
pub trait GtmObject {
    /// Object name.
    fn object_name(&self) -> &str;

    /// Partition, when reported or set.
    fn object_partition(&self) -> Option<&str>;

    /// Full path string, when reported by the device.
    fn object_full_path(&self) -> Option<&str>;

    /// Full path of the object.
    ///
    /// Uses the reported `fullPath` when present and falls back to `partition` (or
    /// `Common`) plus `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if the reported full path is malformed or the
    /// partition or name is empty or contains `/` or `~`.
    fn full_path(&self) -> Result<FullPath> {
        let path = match self.object_full_path() {
            Some(path) => FullPath::parse(path)?,
            None => FullPath::new(
                self.object_partition().unwrap_or(DEFAULT_PARTITION),
                self.object_name(),
            )?,
        };
        Ok(path)
    }
}

/// Pool attached to a wide IP.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GtmWideIpPool {
    /// Pool name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Pool partition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// Position in the wide IP's pool list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    /// Weight used by the `ratio` pool load-balancing mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<u32>,
}

/// Wide IP (`/mgmt/tm/gtm/wideip/{type}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GtmWideIp {
    /// DNS name answered by the wide IP.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Partition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// Full path (`/Common/www.example.com`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
    /// Resource kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Link to the resource on the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    /// Configuration generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
    /// Owning application service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_service: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Disabled flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    /// Enabled flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Whether to return a failure RCODE when no pool is available (`enabled`/`disabled`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_rcode: Option<String>,
    /// RCODE returned on failure (`noerror`, `servfail`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_rcode_response: Option<String>,
    /// Negative caching TTL of failure responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_rcode_ttl: Option<u32>,
    /// Pool used when every other pool is unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_resort_pool: Option<String>,
    /// Load balancing decisions written to the log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancing_decision_log_verbosity: Option<Vec<String>>,
    /// Minimal response mode (`enabled`/`disabled`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimal_response: Option<String>,
    /// IPv4 prefix length used for persistence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_cidr_ipv4: Option<u8>,
    /// IPv6 prefix length used for persistence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_cidr_ipv6: Option<u8>,
    /// Persistence mode (`enabled`/`disabled`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence: Option<String>,
    /// Persistence TTL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence_ttl: Option<u32>,
    /// Load-balancing mode across pools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_lb_mode: Option<String>,
    /// Persistence entry TTL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_persistence: Option<u32>,
    /// Pools answering for the wide IP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pools: Option<Vec<GtmWideIpPool>>,
    /// Alternate names, may contain wildcards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    /// iRules attached to the wide IP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<String>>,
}

impl GtmWideIp {
    /// Create a wide IP payload with a name and partition.
    #[must_use]
    pub fn new(name: impl Into<String>, partition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition: Some(partition.into()),
            ..Self::default()
        }
    }

    /// Append a pool reference.
    #[must_use]
    pub fn with_pool(mut self, pool: GtmWideIpPool) -> Self {
        self.pools.get_or_insert_with(Vec::new).push(pool);
        self
    }
}

impl GtmObject for GtmWideIp {
    fn object_name(&self) -> &str {
        &self.name
    }

    fn object_partition(&self) -> Option<&str> {
        self.partition.as_deref()
    }

    fn object_full_path(&self) -> Option<&str> {
        self.full_path.as_deref()
    }
}

/// Wide IP collection envelope.
pub type GtmWideIps = Collection<GtmWideIp>;

/// GTM pool (`/mgmt/tm/gtm/pool/{type}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GtmPool {
    /// Pool name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Partition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// Full path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
    /// Resource kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Link to the resource on the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    /// Configuration generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Disabled flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    /// Enabled flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Preferred load-balancing mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancing_mode: Option<String>,
    /// Alternate load-balancing mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_mode: Option<String>,
    /// Fallback load-balancing mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_mode: Option<String>,
    /// Address returned when fallback mode is `fallback-ip`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_ip: Option<String>,
    /// Whether members stay down until manually enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_resume: Option<String>,
    /// Maximum number of records in a response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_answers_returned: Option<u32>,
    /// Health monitor rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor: Option<String>,
    /// Record TTL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Whether member virtual server availability is verified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_member_availability: Option<String>,
    /// Members sub-collection; carries the members when sub-collections are expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members_reference: Option<SubcollectionReference<GtmPoolMember>>,
}

impl GtmPool {
    /// Create a pool payload with a name and partition.
    #[must_use]
    pub fn new(name: impl Into<String>, partition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition: Some(partition.into()),
            ..Self::default()
        }
    }
}

impl GtmPool {
    /// Members returned inline by an expanded listing.
    #[must_use]
    pub fn members(&self) -> &[GtmPoolMember] {
        self.members_reference
            .as_ref()
            .map(|reference| reference.items.as_slice())
            .unwrap_or_default()
    }
}

impl GtmObject for GtmPool {
    fn object_name(&self) -> &str {
        &self.name
    }

    fn object_partition(&self) -> Option<&str> {
        self.partition.as_deref()
    }

    fn object_full_path(&self) -> Option<&str> {
        self.full_path.as_deref()
    }
}

/// Pool collection envelope.
pub type GtmPools = Collection<GtmPool>;

/// Member of a GTM pool.
///
/// For `A`/`AAAA` pools the name is `server:virtual-server`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GtmPoolMember {
    /// Member name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Partition of the referenced server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// Full path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
    /// Resource kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Link to the resource on the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    /// Configuration generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Disabled flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    /// Enabled flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Position within the pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_order: Option<u32>,
    /// Health monitor rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor: Option<String>,
    /// Weight used by the `ratio` load-balancing mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<u32>,
}

impl GtmPoolMember {
    /// Create a member payload with a name and partition.
    #[must_use]
    pub fn new(name: impl Into<String>, partition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition: Some(partition.into()),
            ..Self::default()
        }
    }
}

impl GtmObject for GtmPoolMember {
    fn object_name(&self) -> &str {
        &self.name
    }

    fn object_partition(&self) -> Option<&str> {
        self.partition.as_deref()
    }

    fn object_full_path(&self) -> Option<&str> {
        self.full_path.as_deref()
    }
}

/// Pool member collection envelope.
pub type GtmPoolMembers = Collection<GtmPoolMember>;

/// GTM data center (`/mgmt/tm/gtm/datacenter`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GtmDatacenter {
    /// Data center name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Partition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// Full path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
    /// Resource kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Link to the resource on the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    /// Configuration generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
    /// Administrative contact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Disabled flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    /// Enabled flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Physical location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Prober selection used when the preferred method is unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prober_fallback: Option<String>,
    /// Preferred prober selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prober_preference: Option<String>,
    /// Prober pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prober_pool: Option<String>,
}

impl GtmDatacenter {
    /// Create a data center payload with a name and partition.
    #[must_use]
    pub fn new(name: impl Into<String>, partition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition: Some(partition.into()),
            ..Self::default()
        }
    }
}

impl GtmObject for GtmDatacenter {
    fn object_name(&self) -> &str {
        &self.name
    }

    fn object_partition(&self) -> Option<&str> {
        self.partition.as_deref()
    }

    fn object_full_path(&self) -> Option<&str> {
        self.full_path.as_deref()
    }
}

/// Data center collection envelope.
pub type GtmDatacenters = Collection<GtmDatacenter>;

/// Self IP or management address of a GTM server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GtmServerAddress {
    /// IP address.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Device the address belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    /// NAT translation (`none` when not translated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

/// GTM server (`/mgmt/tm/gtm/server`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GtmServer {
    /// Server name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Partition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// Full path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
    /// Resource kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Link to the resource on the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    /// Configuration generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
    /// Data center hosting the server (full path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Disabled flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    /// Enabled flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Whether route domain virtual servers are discovered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expose_route_domains: Option<String>,
    /// iQuery path probing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iq_allow_path: Option<String>,
    /// iQuery service checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iq_allow_service_check: Option<String>,
    /// iQuery SNMP probing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iq_allow_snmp: Option<String>,
    /// Link discovery mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_discovery: Option<String>,
    /// Health monitor rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor: Option<String>,
    /// Server product (`bigip`, `generic-host`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    /// Prober selection used when the preferred method is unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prober_fallback: Option<String>,
    /// Preferred prober selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prober_preference: Option<String>,
    /// Virtual server discovery mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_server_discovery: Option<String>,
    /// Server addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Vec<GtmServerAddress>>,
    /// Link to the virtual servers sub-collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_servers_reference: Option<Reference>,
}

impl GtmServer {
    /// Create a server payload in `datacenter` with one address.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        datacenter: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            datacenter: Some(datacenter.into()),
            addresses: Some(vec![GtmServerAddress {
                name: address.into(),
                ..GtmServerAddress::default()
            }]),
            ..Self::default()
        }
    }
}

impl GtmObject for GtmServer {
    fn object_name(&self) -> &str {
        &self.name
    }

    fn object_partition(&self) -> Option<&str> {
        self.partition.as_deref()
    }

    fn object_full_path(&self) -> Option<&str> {
        self.full_path.as_deref()
    }
}

/// Server collection envelope.
pub type GtmServers = Collection<GtmServer>;
