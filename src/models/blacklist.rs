//! Blacklist entry stored in the shared cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::policy::RateWindow;

/// Record written when an IP exhausts its rate window and blacklisting is
/// enabled. Serialized as JSON into the cache; the cache TTL (time until
/// local midnight) is the only expiry mechanism; there is no sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub ip: String,
    pub route: String,
    pub http_method: String,
    pub rate: RateWindow,
    pub blacklisted_at: DateTime<Utc>,
}

impl BlacklistEntry {
    pub fn new(ip: &str, route: &str, http_method: &str, rate: RateWindow) -> Self {
        Self {
            ip: ip.to_string(),
            route: route.to_string(),
            http_method: http_method.to_string(),
            rate,
            blacklisted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let entry =
            BlacklistEntry::new("10.0.0.9", "/api/orders", "POST", RateWindow::new(10, 1000));
        let json = serde_json::to_string(&entry).unwrap();
        let back: BlacklistEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ip, "10.0.0.9");
        assert_eq!(back.rate, entry.rate);
    }
}
