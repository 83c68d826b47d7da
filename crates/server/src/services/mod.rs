//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login and password changes (argon2)
//! - `catalog` - Category creation rules shared with bulk import
//! - `email` - Transactional email over SMTP, or logged in development
//! - `import` - Bulk JSON import of products and categories
//! - `orders` - Order placement, status changes and notifications
//! - `otp` - In-memory one-time passcodes for the checkout gate
//! - `settings` - Cached shop and store settings

pub mod auth;
pub mod catalog;
pub mod email;
pub mod import;
pub mod orders;
pub mod otp;
pub mod settings;

pub use auth::{AuthError, AuthService};
pub use catalog::{CategoryError, CategoryService};
pub use email::{EmailError, EmailService, Mailer};
pub use import::{ImportError, ImportKind, ImportReport, ImportService};
pub use orders::{OrderError, OrderService};
pub use otp::{OtpError, OtpStore};
pub use settings::SettingsCache;
