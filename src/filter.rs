//! Client-side result filters
//!
//! Filtering happens after the cache layer so cached payloads always hold
//! the raw response.
use serde_json::Value;

/// Field naming the HTTP verb of an audit event
const REQUEST_ACTION_FIELD: &str = "request-action";

/// Field naming a resource's lifecycle state
const LIFECYCLE_STATE_FIELD: &str = "lifecycle-state";

/// Lifecycle state of resources that no longer exist
pub const LIFECYCLE_DELETED: &str = "DELETED";

/// Filter applied to each page's `data` entries before merging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    /// Keep every entry
    None,
    /// Drop audit events produced by read-only (GET) requests
    ExcludeReadActions,
    /// Drop compartments in the DELETED lifecycle state
    ExcludeDeletedCompartments,
}

impl EventFilter {
    /// Apply the filter to one page.
    ///
    /// Operates on the page's `data` array when present; any other shape is
    /// passed through untouched.
    #[must_use]
    pub fn apply(&self, mut page: Value) -> Value {
        if matches!(self, EventFilter::None) {
            return page;
        }
        if let Some(entries) = page.get_mut("data").and_then(Value::as_array_mut) {
            entries.retain(|entry| self.retains(entry));
        }
        page
    }

    fn retains(&self, entry: &Value) -> bool {
        match self {
            EventFilter::None => true,
            EventFilter::ExcludeReadActions => {
                entry.get(REQUEST_ACTION_FIELD).and_then(Value::as_str) != Some("GET")
            }
            EventFilter::ExcludeDeletedCompartments => {
                entry.get(LIFECYCLE_STATE_FIELD).and_then(Value::as_str)
                    != Some(LIFECYCLE_DELETED)
            }
        }
    }
}
