//! # bigip-core
//!
//! Core types and utilities for working with the F5 BIG-IP iControl REST API.
//!
//! This crate provides error handling, configuration, partition-path escaping and the
//! shared HTTP client used by the module-specific crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and HTTP status code mapping
//! - [`path`] - `/Partition/name` full paths and their `~Partition~name` URI form
//! - [`types`] - REST module enumeration and collection wrappers
//! - [`config`] - Connection configuration for BIG-IP devices
//! - [`client`] - HTTP client, retry logic and request plumbing
//! - [`query`] - Query parameter helpers (`$select`, `$filter`, ...)
//! - [`session`] - Token based authentication

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod path;
pub mod query;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use path::FullPath;
