//! Configuration for the booking flow.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::seat_map::SeatCodePolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Booking flow configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfig {
    /// How malformed seat codes from the inventory are handled (default: strict)
    pub seat_code_policy: SeatCodePolicy,
    /// Gateway request timeout in seconds (default: 10)
    pub request_timeout_secs: u64,
    /// Seat session hold window in minutes (default: 15)
    pub seat_session_minutes: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            seat_code_policy: SeatCodePolicy::Strict,
            request_timeout_secs: 10,
            seat_session_minutes: 15,
        }
    }
}

impl BookingConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            seat_code_policy: lookup("FLIGHTDECK_SEAT_CODE_POLICY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.seat_code_policy),
            request_timeout_secs: lookup("FLIGHTDECK_REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            seat_session_minutes: lookup("FLIGHTDECK_SEAT_SESSION_MINUTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.seat_session_minutes),
        }
    }

    /// Gateway request timeout
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Seat session hold window
    #[must_use]
    pub fn seat_session_ttl(&self) -> chrono::Duration {
        i64::try_from(self.seat_session_minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .unwrap_or(chrono::Duration::MAX)
    }
}
