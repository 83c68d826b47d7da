//! Real Taste café API library.
//!
//! The binary in `main.rs` wires these modules into an axum server; the
//! CLI reuses `db`, `models` and `services` for migrations, seeding and
//! bulk import.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
