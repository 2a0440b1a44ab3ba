//! Rate limiting configuration.

use std::env;

use crate::models::RateWindow;

/// Configuration for the IP and nonce rate windows.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Global per-IP window; a route policy may override it.
    pub ip: RateWindow,
    /// Promote an IP that exhausts its window into the blacklist.
    pub ip_open_blacklist: bool,
    /// Per-nonce window; a zero interval disables nonce-rate limiting
    /// without disabling nonce-replay checking.
    pub nonce: RateWindow,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            ip: RateWindow::new(100, 60_000),
            ip_open_blacklist: false,
            nonce: RateWindow::new(10, 1_000),
        }
    }
}

impl RateLimitConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let ip_rate = env::var("ADMISSION_IP_RATE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);

        let ip_interval_ms = env::var("ADMISSION_IP_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60_000);

        let ip_open_blacklist = env::var("ADMISSION_IP_OPEN_BLACKLIST")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        let nonce_rate = env::var("ADMISSION_NONCE_RATE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let nonce_interval_ms = env::var("ADMISSION_NONCE_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1_000);

        Self {
            ip: RateWindow::new(ip_rate, ip_interval_ms),
            ip_open_blacklist,
            nonce: RateWindow::new(nonce_rate, nonce_interval_ms),
        }
    }
}
