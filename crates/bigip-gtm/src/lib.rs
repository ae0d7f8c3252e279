//! BIG-IP GTM (DNS) client and data models.
//!
//! Provides typed structures and asynchronous client utilities for the Global Traffic
//! Manager module of the iControl REST API (`/mgmt/tm/gtm`): wide IPs, pools and their
//! members, data centers and servers.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{GtmClient, GtmClientBuilder};
pub use models::{
    GtmDatacenter, GtmObject, GtmPool, GtmPoolMember, GtmServer, GtmServerAddress, GtmWideIp,
    GtmWideIpPool, RecordType,
};

/// Convenient result alias that reuses the shared BIG-IP error type.
pub type Result<T> = bigip_core::Result<T>;
