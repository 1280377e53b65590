//! Registry of deprecated property names.

use std::collections::BTreeMap;

/// Known deprecated properties and their replacements, if any.
#[derive(Debug, Clone, Default)]
pub struct Deprecations {
    entries: BTreeMap<String, Option<String>>,
}

impl Deprecations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `old` as deprecated in favour of `replacement`.
    pub fn replaced_by(mut self, old: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.entries.insert(old.into(), Some(replacement.into()));
        self
    }

    /// Register `old` as deprecated with no replacement.
    pub fn removed(mut self, old: impl Into<String>) -> Self {
        self.entries.insert(old.into(), None);
        self
    }

    pub fn is_deprecated(&self, property: &str) -> bool {
        self.entries.contains_key(property)
    }

    /// Human-readable notice for a deprecated property.
    pub fn message(&self, property: &str) -> Option<String> {
        let replacement = self.entries.get(property)?;
        Some(match replacement {
            Some(new) => format!(
                "Property [{}] is deprecated; use [{}] instead.",
                property, new
            ),
            None => format!(
                "Property [{}] is deprecated and no longer has any effect.",
                property
            ),
        })
    }
}
