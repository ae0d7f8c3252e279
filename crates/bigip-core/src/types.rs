//! Core BIG-IP domain types.
//!
//! This module provides the enumeration of REST modules served under `/mgmt` and the
//! collection envelope shared by every list endpoint.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default HTTPS port of the BIG-IP management interface
pub const DEFAULT_MANAGEMENT_PORT: u16 = 443;

/// REST modules exposed by the iControl REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BigIpService {
    /// Authentication and partition configuration (`/mgmt/tm/auth`)
    Auth,
    /// Global Traffic Manager / BIG-IP DNS (`/mgmt/tm/gtm`)
    Gtm,
    /// Token issuing service (`/mgmt/shared/authn`)
    Authn,
    /// Token management service (`/mgmt/shared/authz`)
    Authz,
}

impl BigIpService {
    /// Returns the module name as a string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Gtm => "gtm",
            Self::Authn => "authn",
            Self::Authz => "authz",
        }
    }

    /// Returns all known modules.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Auth, Self::Gtm, Self::Authn, Self::Authz]
    }

    /// URL path segments preceding every resource of the module.
    #[must_use]
    pub const fn base_segments(&self) -> &'static [&'static str] {
        match self {
            Self::Auth => &["mgmt", "tm", "auth"],
            Self::Gtm => &["mgmt", "tm", "gtm"],
            Self::Authn => &["mgmt", "shared", "authn"],
            Self::Authz => &["mgmt", "shared", "authz"],
        }
    }

    /// Returns true for modules living under `/mgmt/tm`.
    #[must_use]
    pub const fn is_traffic_management(&self) -> bool {
        matches!(self, Self::Auth | Self::Gtm)
    }
}

impl FromStr for BigIpService {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auth" => Ok(Self::Auth),
            "gtm" => Ok(Self::Gtm),
            "authn" => Ok(Self::Authn),
            "authz" => Ok(Self::Authz),
            _ => Err(Error::InvalidRequest(format!("Unknown BIG-IP module: {s}"))),
        }
    }
}

impl std::fmt::Display for BigIpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Envelope returned by collection endpoints.
///
/// BIG-IP omits `items` entirely when the collection is empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Collection<T> {
    /// Collection kind, e.g. `tm:gtm:wideip:a:acollectionstate`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Link to the collection itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    /// Collection members.
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Collection<T> {
    /// Number of members in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the collection has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consumes the envelope and returns the members.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            kind: None,
            self_link: None,
            items: Vec::new(),
        }
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Link to a sub-collection that was not expanded inline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Link to the referenced resource.
    pub link: String,
    /// Whether the referenced collection was truncated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_subcollection: Option<bool>,
}

/// Link to a sub-collection, carrying its members when the parent was fetched with
/// `expandSubcollections=true`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubcollectionReference<T> {
    /// Link to the sub-collection.
    pub link: String,
    /// Whether the link points at a sub-collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_subcollection: Option<bool>,
    /// Expanded members.
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<T>,
}
