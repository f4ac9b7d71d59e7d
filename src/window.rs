//! Time-window partitioning for the export date range
use crate::error::{ExportError, Result};
use chrono::{DateTime, Utc};

/// Query bound format: UTC, second precision
const BOUND_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A half-open `[start, end)` slice of the export range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Format both bounds for use as query arguments
    #[must_use]
    pub fn bounds(&self) -> (String, String) {
        (
            self.start.format(BOUND_FORMAT).to_string(),
            self.end.format(BOUND_FORMAT).to_string(),
        )
    }
}

/// Split `[start, end)` into consecutive slices of at most `slice_seconds`.
///
/// Walks forward from `start` in steps of `slice_seconds`, clamping the
/// final slice's end to `end`. The union of the returned windows covers
/// `[start, end)` exactly, with no gap and no overlap. `start == end`
/// yields exactly one (empty) window.
///
/// # Errors
///
/// Returns [`ExportError::InvalidConfig`] if `slice_seconds` is zero and
/// [`ExportError::DateRangeInvalid`] if `end` is before `start`.
pub fn partition(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    slice_seconds: u64,
) -> Result<Vec<TimeWindow>> {
    if slice_seconds == 0 {
        return Err(ExportError::InvalidConfig(
            "slice duration must be at least one second".to_string(),
        ));
    }
    if end < start {
        return Err(ExportError::DateRangeInvalid(format!(
            "start {start} is after end {end}"
        )));
    }

    let step = i64::try_from(slice_seconds).map_err(|_| {
        ExportError::InvalidConfig(format!("slice duration {slice_seconds}s is out of range"))
    })?;

    let start_secs = start.timestamp();
    let end_secs = end.timestamp();

    let mut windows = Vec::new();
    let mut cursor = start_secs;
    loop {
        let slice_end = cursor.saturating_add(step).min(end_secs);
        windows.push(TimeWindow {
            start: from_epoch(cursor)?,
            end: from_epoch(slice_end)?,
        });
        cursor = slice_end;
        if cursor >= end_secs {
            break;
        }
    }

    Ok(windows)
}

fn from_epoch(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| ExportError::InvalidDate(format!("epoch second {secs} is out of range")))
}
