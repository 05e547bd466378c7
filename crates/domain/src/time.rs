//! Wall-clock time.
//!
//! Snapshots, events and cloud request signatures all read the clock here.

use chrono::{DateTime, Utc};

/// UTC instant, serialized as RFC 3339.
pub type Timestamp = DateTime<Utc>;

#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Milliseconds since the Unix epoch, the unit of the cloud API's `t` header.
#[must_use]
pub fn epoch_millis(at: Timestamp) -> i64 {
    at.timestamp_millis()
}
