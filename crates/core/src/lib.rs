//! ABC Retailers Core - Shared types library.
//!
//! This crate provides the types used across all ABC Retailers components:
//! - `admin` - The retail management web application
//! - `cli` - Operator tooling for storage provisioning and inspection
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. Records know their table and partition through
//! [`RecordKind`]; the storage layer in `admin` maps them to table rows.
//!
//! # Modules
//!
//! - [`types`] - Keyed records, row IDs, prices, emails, statuses, queue
//!   payloads and object naming

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
