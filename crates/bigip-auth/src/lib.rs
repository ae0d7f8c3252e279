//! BIG-IP administrative partition client.
//!
//! Provides typed structures and an asynchronous client for the partition endpoints of
//! the iControl REST `auth` module (`/mgmt/tm/auth/partition`).

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{AuthClient, AuthClientBuilder};
pub use models::{Partition, Partitions};

/// Convenient result alias that reuses the shared BIG-IP error type.
pub type Result<T> = bigip_core::Result<T>;
