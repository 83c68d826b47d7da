//! Real Taste Core - Shared types library.
//!
//! This crate provides the domain types used across the Real Taste workspace:
//! - `server` - REST API for the catalog, cart, orders and back office
//! - `cli` - Command-line tools for migrations, seeding and bulk import
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP. Enabling the `postgres` feature adds sqlx encode/decode
//! implementations so the types can be bound and fetched directly.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, prices, mobile numbers, slugs and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
