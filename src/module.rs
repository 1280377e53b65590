//! Capability interface for the pipeline stage currently reading config.

use std::collections::HashMap;

/// What the config engine needs to know about a calling pipeline stage.
pub trait ModuleScope {
    /// Name used as the module-scope prefix, e.g. `RemoveLowCountOtus`.
    fn display_name(&self) -> &str;

    /// Default value the module supplies for an unset property.
    fn default_for(&self, _property: &str) -> Option<String> {
        None
    }
}

/// A module described by a name and a fixed table of defaults.
#[derive(Debug, Clone, Default)]
pub struct StaticModule {
    name: String,
    defaults: HashMap<String, String>,
}

impl StaticModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            defaults: HashMap::new(),
        }
    }

    pub fn with_default(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(property.into(), value.into());
        self
    }
}

impl ModuleScope for StaticModule {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn default_for(&self, property: &str) -> Option<String> {
        self.defaults.get(property).cloned()
    }
}
