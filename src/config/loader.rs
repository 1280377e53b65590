//! Property file loading with a default-properties chain.
//!
//! The primary file may list lower-priority files in `pipeline.defaultProps`.
//! Those are loaded first (recursively) and the primary file's entries
//! override them. Only the primary file's own entries form the initial
//! snapshot used by the unused-property audit.

use super::store::{ValueStore, parse_file};
use crate::env::Resolver;
use crate::error::ConfigResult;
use crate::paths::absolutize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Property listing lower-priority default config files.
pub const DEFAULT_PROPS: &str = "pipeline.defaultProps";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// A file pulled in through `pipeline.defaultProps`
    Defaults = 0,
    /// The primary config file (highest priority)
    Primary = 1,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Primary => write!(f, "primary"),
        }
    }
}

/// Loads a primary property file and its default chain.
pub struct ConfigLoader<'a> {
    resolver: &'a mut Resolver,
    visited: HashSet<PathBuf>,
    sources: Vec<(PathBuf, ConfigTier)>,
}

impl<'a> ConfigLoader<'a> {
    /// The resolver expands variables in `pipeline.defaultProps` paths.
    pub fn new(resolver: &'a mut Resolver) -> Self {
        Self {
            resolver,
            visited: HashSet::new(),
            sources: Vec::new(),
        }
    }

    /// Load `primary` and everything it pulls in.
    pub fn load(mut self, primary: &Path) -> ConfigResult<(ValueStore, Vec<(PathBuf, ConfigTier)>)> {
        let primary_abs = absolutize(primary);
        info!("Initialize Config: {}", primary_abs.display());

        let primary_props = parse_file(&primary_abs)?;
        self.visited.insert(primary_abs.clone());

        let mut merged = HashMap::new();
        for default_file in self.default_files(&primary_abs, &primary_props)? {
            self.load_defaults(&default_file, &mut merged)?;
        }
        merged.extend(primary_props.clone());
        self.sources.push((primary_abs, ConfigTier::Primary));

        let initial: BTreeMap<String, String> = primary_props.into_iter().collect();
        info!(
            "Total # initial properties: {} ({} after defaults)",
            initial.len(),
            merged.len()
        );
        Ok((ValueStore::from_parts(merged, initial), self.sources))
    }

    fn load_defaults(
        &mut self,
        path: &Path,
        merged: &mut HashMap<String, String>,
    ) -> ConfigResult<()> {
        if !self.visited.insert(path.to_path_buf()) {
            warn!("Default config {} already loaded, skipping", path.display());
            return Ok(());
        }

        let props = parse_file(path)?;
        for nested in self.default_files(path, &props)? {
            self.load_defaults(&nested, merged)?;
        }
        debug!("Loaded {} default properties from {}", props.len(), path.display());
        merged.extend(props);
        self.sources.push((path.to_path_buf(), ConfigTier::Defaults));
        Ok(())
    }

    /// Paths listed in `pipeline.defaultProps`, resolved against the
    /// including file's own properties and directory.
    fn default_files(
        &mut self,
        including: &Path,
        props: &HashMap<String, String>,
    ) -> ConfigResult<Vec<PathBuf>> {
        let Some(raw) = props.get(DEFAULT_PROPS) else {
            return Ok(Vec::new());
        };
        let scope = ValueStore::from_parts(props.clone(), BTreeMap::new());
        let base = including.parent().unwrap_or_else(|| Path::new("/"));

        let mut files = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let resolved = self.resolver.resolve_detached(entry, &scope)?;
            let path = PathBuf::from(resolved);
            let path = if path.is_absolute() {
                path
            } else {
                base.join(path)
            };
            files.push(absolutize(&path));
        }
        Ok(files)
    }
}
