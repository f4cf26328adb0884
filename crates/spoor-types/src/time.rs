//! Event timestamps at the ingestion boundary.
//!
//! Stores hold epoch seconds (`u64`). Callers may supply either an epoch
//! integer or a calendar time; the two arms are explicit variants rather
//! than a runtime type probe. Calendar values normalize to epoch seconds
//! on ingestion.

use chrono::{DateTime, Utc};
use spoor_error::{Result, SpoorError};

/// A timestamp supplied to `add`: raw epoch seconds or calendar time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventTime {
    /// Unix epoch seconds.
    Epoch(u64),
    /// Calendar time, normalized to epoch seconds when the event is added.
    Calendar(DateTime<Utc>),
}

impl EventTime {
    /// Normalize to epoch seconds. Pre-epoch calendar times are rejected
    /// rather than wrapped.
    pub fn to_epoch(self) -> Result<u64> {
        match self {
            Self::Epoch(secs) => Ok(secs),
            Self::Calendar(dt) => {
                let secs = dt.timestamp();
                u64::try_from(secs).map_err(|_| {
                    SpoorError::schema(format!("timestamp {dt} is before the unix epoch"))
                })
            }
        }
    }
}

impl From<u64> for EventTime {
    fn from(secs: u64) -> Self {
        Self::Epoch(secs)
    }
}

impl From<DateTime<Utc>> for EventTime {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Calendar(dt)
    }
}

/// Render epoch seconds as calendar time.
///
/// Returns `None` only for values past chrono's representable range.
#[must_use]
pub fn epoch_to_utc(secs: u64) -> Option<DateTime<Utc>> {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
}
