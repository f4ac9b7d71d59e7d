//! Compartment discovery
//!
//! The provider's listing call returns every compartment in the tenancy
//! except the tenancy (root) itself. The root id only shows up as the
//! parent of top-level compartments, so it is synthesized from the parent
//! chain and appended to the set.
use crate::error::{ExportError, Result};
use crate::filter::LIFECYCLE_DELETED;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

/// One entry of the provider's compartment listing
#[derive(Debug, Clone, Deserialize)]
pub struct Compartment {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Parent compartment; the tenancy id for top-level compartments
    #[serde(rename = "compartment-id", default)]
    pub parent_id: Option<String>,
    #[serde(rename = "lifecycle-state", default)]
    pub lifecycle_state: Option<String>,
}

impl Compartment {
    /// Whether the compartment has been deleted
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.lifecycle_state.as_deref() == Some(LIFECYCLE_DELETED)
    }
}

/// Ordered set of compartment ids a query fans out over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompartmentSet {
    ids: Vec<String>,
}

impl CompartmentSet {
    /// Build a set from explicit ids, kept in the given order
    #[must_use]
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }

    /// Build the set from a compartment listing document.
    ///
    /// Keeps listing order, drops deleted compartments, and appends the
    /// synthesized root (tenancy) id last. The root is the first parent id
    /// that is not itself a listed compartment; deleted compartments still
    /// contribute their parents to that derivation.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Schema`] if the listing has no `data` array
    /// or an entry does not look like a compartment.
    pub fn from_listing(listing: &Value) -> Result<Self> {
        let entries = listing
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ExportError::Schema("compartment listing has no `data` array".to_string())
            })?;

        let mut compartments = Vec::with_capacity(entries.len());
        for entry in entries {
            let compartment: Compartment = serde_json::from_value(entry.clone())
                .map_err(|e| ExportError::Schema(format!("malformed compartment entry: {e}")))?;
            compartments.push(compartment);
        }

        let listed: HashSet<&str> = compartments.iter().map(|c| c.id.as_str()).collect();

        let mut ids: Vec<String> = compartments
            .iter()
            .filter(|compartment| !compartment.is_deleted())
            .map(|compartment| compartment.id.clone())
            .collect();

        let root = compartments
            .iter()
            .filter_map(|compartment| compartment.parent_id.as_deref())
            .find(|parent| !listed.contains(parent));
        if let Some(root) = root {
            ids.push(root.to_string());
        }

        Ok(Self { ids })
    }

    /// The compartment ids, in fan-out order
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
