//! Configuration management for the box office.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::catalog::DEFAULT_SEAT_CAPACITY;
use crate::receipt::DEFAULT_TITLE;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Receipt output
    pub receipts: ReceiptConfig,
    /// Booking behaviour
    pub booking: BookingConfig,
    /// Log filter for the binary's subscriber (`RUST_LOG` syntax)
    pub log_level: String,
}

/// Receipt configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptConfig {
    /// Directory receipts are written to (created on demand)
    pub dir: PathBuf,
    /// Heading on every receipt
    pub title: String,
}

/// Booking configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Seats per show in the sample catalog
    pub seat_capacity: u32,
    /// How long a caller waits for a booking outcome, in milliseconds
    pub request_timeout_ms: u64,
    /// Actions buffered for outcome observers
    pub broadcast_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            receipts: ReceiptConfig {
                dir: PathBuf::from("receipts"),
                title: DEFAULT_TITLE.to_string(),
            },
            booking: BookingConfig {
                seat_capacity: DEFAULT_SEAT_CAPACITY,
                request_timeout_ms: 5000,
                broadcast_capacity: 64,
            },
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BOX_OFFICE_RECEIPTS_DIR`: receipt directory (default: `receipts`)
    /// - `BOX_OFFICE_RECEIPT_TITLE`: receipt heading (default: `London Musical Tickets`)
    /// - `BOX_OFFICE_SEAT_CAPACITY`: seats per show (default: 100)
    /// - `BOX_OFFICE_REQUEST_TIMEOUT_MS`: booking wait in milliseconds (default: 5000)
    /// - `BOX_OFFICE_BROADCAST_CAPACITY`: outcome buffer size (default: 64)
    /// - `RUST_LOG`: log filter (default: info)
    ///
    /// Unparseable numbers fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            receipts: ReceiptConfig {
                dir: env::var("BOX_OFFICE_RECEIPTS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.receipts.dir),
                title: env::var("BOX_OFFICE_RECEIPT_TITLE")
                    .unwrap_or(defaults.receipts.title),
            },
            booking: BookingConfig {
                seat_capacity: env::var("BOX_OFFICE_SEAT_CAPACITY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|&capacity| capacity > 0)
                    .unwrap_or(defaults.booking.seat_capacity),
                request_timeout_ms: env::var("BOX_OFFICE_REQUEST_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.booking.request_timeout_ms),
                broadcast_capacity: env::var("BOX_OFFICE_BROADCAST_CAPACITY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.booking.broadcast_capacity),
            },
            log_level: env::var("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Booking wait as a `Duration`
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.booking.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.receipts.dir, PathBuf::from("receipts"));
        assert_eq!(config.receipts.title, "London Musical Tickets");
        assert_eq!(config.booking.seat_capacity, 100);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.booking.broadcast_capacity, 64);
        assert_eq!(config.log_level, "info");
    }
}
