//! Core types for Real Taste.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod mobile;
pub mod price;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use mobile::{MobileNumber, MobileNumberError};
pub use price::{Price, PriceError};
pub use slug::{Slug, SlugError};
pub use status::*;
