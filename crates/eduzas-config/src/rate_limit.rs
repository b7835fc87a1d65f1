//! Rate limiting configuration.
//!
//! Quotas are token buckets: tokens are replenished at `per_second`, each
//! request consumes one, and at most `burst_size` tokens accumulate.
//!
//! - `RATE_LIMIT_GENERAL_PER_SECOND`: general API replenish rate (default: 20)
//! - `RATE_LIMIT_GENERAL_BURST_SIZE`: general API burst (default: 60)
//! - `RATE_LIMIT_AUTH_PER_SECOND`: `/api/auth` replenish rate (default: 1)
//! - `RATE_LIMIT_AUTH_BURST_SIZE`: `/api/auth` burst (default: 5)

use std::num::NonZeroU32;

use governor::Quota;

use crate::env_parse;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub general_per_second: u32,
    pub general_burst_size: u32,
    /// Budget for `/api/auth` routes.
    pub auth_per_second: u32,
    pub auth_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general_per_second: 20,
            general_burst_size: 60,
            auth_per_second: 1,
            auth_burst_size: 5,
        }
    }
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            general_per_second: env_parse(
                "RATE_LIMIT_GENERAL_PER_SECOND",
                defaults.general_per_second,
            ),
            general_burst_size: env_parse(
                "RATE_LIMIT_GENERAL_BURST_SIZE",
                defaults.general_burst_size,
            ),
            auth_per_second: env_parse("RATE_LIMIT_AUTH_PER_SECOND", defaults.auth_per_second),
            auth_burst_size: env_parse("RATE_LIMIT_AUTH_BURST_SIZE", defaults.auth_burst_size),
        }
    }

    /// Quota applied per client to every `/api` route outside `/api/auth`.
    #[must_use]
    pub fn general_quota(&self) -> Quota {
        Quota::per_second(non_zero(self.general_per_second))
            .allow_burst(non_zero(self.general_burst_size))
    }

    /// Quota applied per client to `/api/auth` routes.
    #[must_use]
    pub fn auth_quota(&self) -> Quota {
        Quota::per_second(non_zero(self.auth_per_second))
            .allow_burst(non_zero(self.auth_burst_size))
    }
}
