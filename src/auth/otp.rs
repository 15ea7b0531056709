use std::sync::Arc;

use axum::extract::FromRef;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use time::OffsetDateTime;

use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Derives the keyed-PRF input for an account's one-time codes.
/// Swapping this for per-account secrets does not touch the callers.
pub trait OtpKeyScheme: Send + Sync {
    fn key_for(&self, email: &str) -> Vec<u8>;
}

/// Shared service secret concatenated with the account email. Anyone
/// holding the secret can derive codes offline, so it must never be
/// exposed to clients.
#[derive(Clone)]
pub struct SharedSecretScheme {
    secret: String,
}

impl SharedSecretScheme {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl OtpKeyScheme for SharedSecretScheme {
    fn key_for(&self, email: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.secret.len() + email.len());
        key.extend_from_slice(self.secret.as_bytes());
        key.extend_from_slice(email.as_bytes());
        key
    }
}

/// Time-based one-time codes over HMAC-SHA-256 with RFC 4226 dynamic
/// truncation. Verification accepts the current time step and one step
/// on either side.
#[derive(Clone)]
pub struct Totp {
    scheme: Arc<dyn OtpKeyScheme>,
    step_seconds: u64,
    digits: u32,
}

impl FromRef<AppState> for Totp {
    fn from_ref(state: &AppState) -> Self {
        let cfg = &state.config.otp;
        Self::new(
            Arc::new(SharedSecretScheme::new(cfg.secret.clone())),
            cfg.step_seconds,
            cfg.digits,
        )
    }
}

impl Totp {
    pub fn new(scheme: Arc<dyn OtpKeyScheme>, step_seconds: u64, digits: u32) -> Self {
        Self {
            scheme,
            step_seconds,
            digits,
        }
    }

    pub fn generate(&self, email: &str) -> anyhow::Result<String> {
        self.generate_at(email, OffsetDateTime::now_utc().unix_timestamp())
    }

    pub fn verify(&self, email: &str, code: &str) -> anyhow::Result<bool> {
        self.verify_at(email, code, OffsetDateTime::now_utc().unix_timestamp())
    }

    pub fn generate_at(&self, email: &str, unix_time: i64) -> anyhow::Result<String> {
        self.code_at(email, self.counter(unix_time))
    }

    pub fn verify_at(&self, email: &str, code: &str, unix_time: i64) -> anyhow::Result<bool> {
        let counter = self.counter(unix_time);
        for c in [counter.wrapping_sub(1), counter, counter + 1] {
            let expected = self.code_at(email, c)?;
            if expected.as_bytes().ct_eq(code.as_bytes()).into() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn counter(&self, unix_time: i64) -> u64 {
        (unix_time.max(0) as u64) / self.step_seconds
    }

    fn code_at(&self, email: &str, counter: u64) -> anyhow::Result<String> {
        let key = self.scheme.key_for(email);
        let mut mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| anyhow::anyhow!("invalid otp key length: {}", e))?;
        mac.update(&counter.to_be_bytes());
        let digest = mac.finalize().into_bytes();

        // RFC 4226 dynamic truncation
        let offset = (digest[digest.len() - 1] & 0x0f) as usize;
        let bin = ((digest[offset] as u32 & 0x7f) << 24)
            | ((digest[offset + 1] as u32) << 16)
            | ((digest[offset + 2] as u32) << 8)
            | (digest[offset + 3] as u32);
        let modulus = 10u64.pow(self.digits);
        Ok(format!(
            "{:0width$}",
            (bin as u64) % modulus,
            width = self.digits as usize
        ))
    }
}
