//! One-time passcodes for the checkout email gate.
//!
//! Codes live only in memory (a `moka` cache keyed by normalized email).
//! A restart invalidates outstanding codes, which only means the customer
//! asks for a new one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use moka::ops::compute::Op;
use thiserror::Error;
use tracing::debug;

use real_taste_core::Email;

use super::email::generate_verification_code;

/// Wrong guesses allowed before a code is discarded.
pub const MAX_ATTEMPTS: u8 = 5;

/// Extra time an expired entry stays cached so it can be reported as
/// expired rather than missing.
const EXPIRED_GRACE: Duration = Duration::from_secs(60);

const MAX_OUTSTANDING_CODES: u64 = 10_000;

/// Why a code could not be verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("OTP not found or expired")]
    NotFound,

    #[error("OTP expired")]
    Expired,

    #[error("Invalid OTP")]
    Invalid,
}

#[derive(Debug, Clone)]
struct OtpEntry {
    code: String,
    expires_at: Instant,
    attempts: u8,
}

/// In-memory store of outstanding codes.
#[derive(Clone)]
pub struct OtpStore {
    codes: Cache<String, Arc<OtpEntry>>,
    ttl: Duration,
}

impl OtpStore {
    /// Create a store whose codes are valid for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let codes = Cache::builder()
            .max_capacity(MAX_OUTSTANDING_CODES)
            .time_to_live(ttl + EXPIRED_GRACE)
            .build();
        Self { codes, ttl }
    }

    /// How long a freshly issued code stays valid.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a new code for `email`, replacing any outstanding one.
    pub async fn issue(&self, email: &Email) -> String {
        let code = generate_verification_code();
        let entry = OtpEntry {
            code: code.clone(),
            expires_at: Instant::now() + self.ttl,
            attempts: 0,
        };
        self.codes
            .insert(email.as_str().to_owned(), Arc::new(entry))
            .await;
        debug!(email = %email, "Issued OTP");
        code
    }

    /// Drop the outstanding code for `email`, if any.
    pub async fn discard(&self, email: &Email) {
        self.codes.invalidate(email.as_str()).await;
    }

    /// Check `code` for `email`. A matching code is consumed.
    ///
    /// # Errors
    ///
    /// - `OtpError::NotFound` if no code is outstanding.
    /// - `OtpError::Expired` if the code is past its expiry (it is removed).
    /// - `OtpError::Invalid` on mismatch; after [`MAX_ATTEMPTS`] wrong
    ///   guesses the code is removed.
    pub async fn verify(&self, email: &Email, code: &str) -> Result<(), OtpError> {
        self.verify_at(email, code, Instant::now()).await
    }

    async fn verify_at(&self, email: &Email, code: &str, now: Instant) -> Result<(), OtpError> {
        let code = code.trim();
        let mut outcome = Err(OtpError::NotFound);
        // Calls for the same key are serialized, so concurrent guesses all
        // count against the attempt limit.
        self.codes
            .entry_by_ref(email.as_str())
            .and_compute_with(|current| {
                let op = match current {
                    Some(current) => {
                        let (result, op) = check_code(current.value(), code, now);
                        outcome = result;
                        op
                    }
                    None => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;
        outcome
    }
}

/// Outcome of one guess against `entry`, and what to do with the entry.
fn check_code(
    entry: &OtpEntry,
    code: &str,
    now: Instant,
) -> (Result<(), OtpError>, Op<Arc<OtpEntry>>) {
    if now >= entry.expires_at {
        return (Err(OtpError::Expired), Op::Remove);
    }
    if entry.code == code {
        return (Ok(()), Op::Remove);
    }

    let attempts = entry.attempts.saturating_add(1);
    if attempts >= MAX_ATTEMPTS {
        return (Err(OtpError::Invalid), Op::Remove);
    }
    let updated = OtpEntry {
        attempts,
        ..entry.clone()
    };
    (Err(OtpError::Invalid), Op::Put(Arc::new(updated)))
}
