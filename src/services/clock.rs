//! Clock-skew checking for client-supplied timestamps.

use chrono::Utc;

/// Accept the timestamp when |now - timestamp| is within the tolerance.
///
/// The check is symmetric: a client clock running ahead of the server is
/// treated the same as one running behind. A tolerance of zero disables
/// the check entirely.
pub fn within_skew(timestamp_ms: i64, max_skew_seconds: u64) -> bool {
    within_skew_at(Utc::now().timestamp_millis(), timestamp_ms, max_skew_seconds)
}

fn within_skew_at(now_ms: i64, timestamp_ms: i64, max_skew_seconds: u64) -> bool {
    if max_skew_seconds == 0 {
        return true;
    }
    let diff_seconds = now_ms.abs_diff(timestamp_ms) / 1000;
    diff_seconds <= max_skew_seconds
}
