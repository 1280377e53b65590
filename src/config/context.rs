//! The configuration context owned by the pipeline driver.
//!
//! One `Config` is built at startup and passed by reference to every stage.
//! It owns the value store, the variable resolver and its cache, the path
//! virtualizer, the usage tracker and the pipeline directory.

use super::deprecated::Deprecations;
use super::loader::{ConfigLoader, ConfigTier, DEFAULT_PROPS};
use super::runtime::RuntimeEnv;
use super::store::ValueStore;
use super::usage::{self, UsageMap, UsageTracker};
use crate::env::{HostEnvironment, Resolver, ResolverOptions};
use crate::error::{ConfigError, ConfigResult, PathKind};
use crate::module::ModuleScope;
use crate::paths::{PathVirtualizer, absolutize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Prefix of properties the engine sets for its own bookkeeping.
pub const INTERNAL_PREFIX: &str = "internal.";

/// Internal property holding the pipeline root directory.
pub const INTERNAL_PIPELINE_DIR: &str = "internal.pipelineDir";

/// Property naming the execution environment.
pub const PIPELINE_ENV: &str = "pipeline.env";

/// `pipeline.env` value for cluster execution.
pub const PIPELINE_ENV_CLUSTER: &str = "cluster";

/// The pipeline root directory: set once, then frozen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PipelineDir {
    #[default]
    Uninitialized,
    Resolved(PathBuf),
}

/// Configuration context for one pipeline run.
#[derive(Debug)]
pub struct Config {
    pub(super) store: ValueStore,
    pub(super) resolver: Resolver,
    pub(super) paths: PathVirtualizer,
    pub(super) usage: UsageTracker,
    pipeline_dir: PipelineDir,
    config_file: Option<PathBuf>,
    sources: Vec<(PathBuf, ConfigTier)>,
    deprecations: Deprecations,
}

impl Config {
    /// Load the primary property file using the shell as host environment.
    pub fn load(path: &Path, runtime: &RuntimeEnv) -> ConfigResult<Self> {
        let resolver = Resolver::new(runtime.home_dir.clone(), runtime.install_dir.clone());
        Self::load_with_resolver(path, runtime, resolver)
    }

    /// Load the primary property file with a custom host environment.
    pub fn load_with_host(
        path: &Path,
        runtime: &RuntimeEnv,
        host: impl HostEnvironment + 'static,
    ) -> ConfigResult<Self> {
        let resolver = Resolver::new(runtime.home_dir.clone(), runtime.install_dir.clone())
            .with_host(host);
        Self::load_with_resolver(path, runtime, resolver)
    }

    fn load_with_resolver(
        path: &Path,
        runtime: &RuntimeEnv,
        mut resolver: Resolver,
    ) -> ConfigResult<Self> {
        let (store, sources) = ConfigLoader::new(&mut resolver).load(path)?;
        for (source, tier) in &sources {
            debug!("Config source ({}): {}", tier, source.display());
        }
        Ok(Self {
            store,
            resolver,
            paths: runtime.virtualizer(),
            usage: UsageTracker::new(),
            pipeline_dir: PipelineDir::Uninitialized,
            config_file: Some(absolutize(path)),
            sources,
            deprecations: Deprecations::new(),
        })
    }

    /// Build a context around an existing store, with no backing file.
    pub fn from_store(
        store: ValueStore,
        runtime: &RuntimeEnv,
        host: impl HostEnvironment + 'static,
    ) -> Self {
        let resolver = Resolver::new(runtime.home_dir.clone(), runtime.install_dir.clone())
            .with_host(host);
        Self {
            store,
            resolver,
            paths: runtime.virtualizer(),
            usage: UsageTracker::new(),
            pipeline_dir: PipelineDir::Uninitialized,
            config_file: None,
            sources: Vec::new(),
            deprecations: Deprecations::new(),
        }
    }

    pub fn with_resolver_options(mut self, options: ResolverOptions) -> Self {
        self.resolver = self.resolver.with_options(options);
        self
    }

    pub fn with_deprecations(mut self, deprecations: Deprecations) -> Self {
        self.deprecations = deprecations;
        self
    }

    // Store access

    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    pub fn virtualizer(&self) -> &PathVirtualizer {
        &self.paths
    }

    /// Files that contributed properties, lowest priority first.
    pub fn sources(&self) -> &[(PathBuf, ConfigTier)] {
        &self.sources
    }

    /// Current properties ordered by name.
    pub fn properties(&self) -> BTreeMap<String, String> {
        self.store.snapshot()
    }

    /// Primary file properties as loaded, ordered by name.
    pub fn initial_properties(&self) -> &BTreeMap<String, String> {
        self.store.initial_snapshot()
    }

    /// Expand variables in an arbitrary string against this config.
    pub fn resolve(&mut self, raw: &str) -> ConfigResult<String> {
        self.resolver.resolve(raw, &self.store)
    }

    // Property naming

    /// Name a read of `property` by `module` will actually use.
    ///
    /// 1. `<module>.<suffix>` when set
    /// 2. `property` when set
    /// 3. the bare suffix of a qualified `property` when set
    /// 4. `property`
    pub fn module_prop_name(&self, module: Option<&dyn ModuleScope>, property: &str) -> String {
        if let Some(module) = module {
            let scoped = module_form_prop(module, property);
            if self.store.get(&scoped).is_some() {
                debug!(
                    "Looking for property [{}], found overriding module-specific form: [{}].",
                    property, scoped
                );
                return scoped;
            }
        }
        if self.store.get(property).is_some() {
            return property.to_string();
        }
        if let Some((_, suffix)) = property.split_once('.')
            && self.store.get(suffix).is_some()
        {
            debug!(
                "Property [{}] is unset, falling back to unscoped [{}].",
                property, suffix
            );
            return suffix.to_string();
        }
        property.to_string()
    }

    /// Whether `property` is one of the engine's internal properties.
    pub fn is_internal_property(property: &str) -> bool {
        property.starts_with(INTERNAL_PREFIX)
    }

    // Core read

    /// Resolved value of `property`, or `None` when unset or blank.
    ///
    /// Falls back to the module's default for unset properties, persisting
    /// it. Every call is recorded in the usage tracker.
    pub fn get_string(
        &mut self,
        module: Option<&dyn ModuleScope>,
        property: &str,
    ) -> ConfigResult<Option<String>> {
        let prop = self.module_prop_name(module, property);
        let mut raw = self.store.get(&prop).map(str::to_string);

        if raw.is_none()
            && let Some(module) = module
            && let Some(default) = module.default_for(&prop)
        {
            info!(
                "Setting property [{}] to [{}], the default value supplied by module: {}.",
                prop,
                default,
                module.display_name()
            );
            self.store.set(prop.clone(), default.clone());
            raw = Some(default);
        }

        let value = match raw {
            Some(raw) => {
                let resolved = self.resolver.resolve(raw.trim(), &self.store)?;
                let resolved = resolved.trim();
                if resolved.is_empty() {
                    None
                } else {
                    Some(resolved.to_string())
                }
            }
            None => None,
        };

        self.usage.record(&prop, value.as_deref());
        Ok(value)
    }

    /// Like [`Config::get_string`] but a missing value is an error.
    pub fn require_string(
        &mut self,
        module: Option<&dyn ModuleScope>,
        property: &str,
    ) -> ConfigResult<String> {
        self.get_string(module, property)?
            .ok_or_else(|| ConfigError::not_found(property))
    }

    /// Which one of two mutually exclusive properties is set.
    pub fn require_exclusive(
        &mut self,
        module: Option<&dyn ModuleScope>,
        first: &str,
        second: &str,
    ) -> ConfigResult<String> {
        let a = self.get_string(module, first)?;
        let b = self.get_string(module, second)?;
        match (a, b) {
            (Some(_), Some(_)) => Err(ConfigError::conflict(
                &[first, second],
                "These properties are mutually exclusive.",
            )),
            (Some(_), None) => Ok(first.to_string()),
            (None, Some(_)) => Ok(second.to_string()),
            (None, None) => Err(ConfigError::not_found(&format!("{} or {}", first, second))),
        }
    }

    // Setters

    /// Set a property. An empty value unsets it.
    ///
    /// The change is recorded as used only when it differs from the last
    /// recorded value.
    pub fn set_property(&mut self, name: &str, value: &str) {
        self.store.set(name, value);
        let new = (!value.is_empty()).then_some(value);
        let old = self.usage.last_value(name).filter(|v| !v.is_empty());
        if old != new {
            info!("Set Config property [ {} ] = {}", name, value);
            self.usage.record(name, new);
        }
    }

    /// Set a path-valued property, stored in host form.
    pub fn set_path_property(&mut self, name: &str, path: &Path) {
        let host = self.paths.to_host_path(path);
        self.set_property(name, &host.to_string_lossy());
    }

    /// Set a list-valued property, comma-joined.
    pub fn set_list_property<S: AsRef<str>>(&mut self, name: &str, values: &[S]) {
        let joined = values
            .iter()
            .map(|v| v.as_ref())
            .collect::<Vec<_>>()
            .join(",");
        self.set_property(name, &joined);
    }

    /// Set a list of paths, each stored in host form.
    pub fn set_path_list_property(&mut self, name: &str, paths: &[PathBuf]) {
        let host: Vec<String> = paths
            .iter()
            .map(|p| self.paths.to_host_path(p).to_string_lossy().to_string())
            .collect();
        self.set_list_property(name, &host);
    }

    // Pipeline metadata

    /// Set the pipeline root directory. Only one transition is allowed.
    pub fn set_pipeline_dir(&mut self, dir: &Path) -> ConfigResult<()> {
        if let PipelineDir::Resolved(ref current) = self.pipeline_dir {
            return Err(ConfigError::invalid_state(format!(
                "Pipeline directory already set to {}",
                current.display()
            )));
        }
        let dir = absolutize(dir);
        if !dir.is_dir() {
            return Err(ConfigError::wrong_path_kind(
                INTERNAL_PIPELINE_DIR,
                &dir,
                PathKind::Directory,
            ));
        }
        self.set_path_property(INTERNAL_PIPELINE_DIR, &dir);
        info!(
            "Assign pipeline root directory: {}",
            self.paths.to_host_path(&dir).display()
        );
        self.pipeline_dir = PipelineDir::Resolved(dir);
        Ok(())
    }

    /// The pipeline root directory, resolved from `internal.pipelineDir` on
    /// first access if it was not set explicitly.
    pub fn pipeline_dir(&mut self) -> Option<PathBuf> {
        if let PipelineDir::Resolved(ref dir) = self.pipeline_dir {
            return Some(dir.clone());
        }
        if self.store.get(INTERNAL_PIPELINE_DIR).is_none() {
            return None;
        }
        match self.require_existing_dir(None, INTERNAL_PIPELINE_DIR) {
            Ok(dir) => {
                self.pipeline_dir = PipelineDir::Resolved(dir.clone());
                Some(dir)
            }
            Err(e) => {
                error!("Pipeline directory does not exist: {}", e);
                None
            }
        }
    }

    /// Name of the pipeline root directory.
    pub fn pipeline_name(&mut self) -> Option<String> {
        self.pipeline_dir()
            .and_then(|d| d.file_name().map(|n| n.to_string_lossy().to_string()))
    }

    /// Absolute path of the pipeline root directory.
    pub fn pipeline_path(&mut self) -> Option<String> {
        self.pipeline_dir().map(|d| d.to_string_lossy().to_string())
    }

    pub fn config_file_path(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Extension of the primary config file including the dot, e.g. `.properties`.
    pub fn config_file_ext(&self) -> Option<String> {
        self.config_file
            .as_ref()
            .and_then(|f| f.extension())
            .map(|ext| format!(".{}", ext.to_string_lossy()))
    }

    /// Whether the pipeline runs on a cluster.
    pub fn is_on_cluster(&mut self) -> ConfigResult<bool> {
        Ok(self.get_string(None, PIPELINE_ENV)?.as_deref() == Some(PIPELINE_ENV_CLUSTER))
    }

    // Usage tracking

    /// Stage boundary: fold the stage's reads into the run total.
    pub fn checkpoint(&mut self) {
        self.usage.checkpoint();
    }

    /// Properties read by the current stage.
    pub fn module_used_properties(&self) -> &UsageMap {
        self.usage.scope()
    }

    /// Every property read during the run.
    pub fn used_properties(&mut self) -> ConfigResult<UsageMap> {
        self.get_string(None, DEFAULT_PROPS)?;
        Ok(self.usage.used())
    }

    /// Primary file properties no stage has read, blank values dropped.
    /// `pipeline.defaultProps` is consumed by the loader and never reported.
    pub fn audit_unused(&self) -> BTreeMap<String, String> {
        let mut unused = self.usage.audit_unused(self.store.initial_snapshot());
        unused.remove(DEFAULT_PROPS);
        unused
    }

    /// Write `<log_dir>/<module>_used.properties` for the current stage.
    pub fn save_module_props(
        &self,
        module: &dyn ModuleScope,
        log_dir: &Path,
    ) -> ConfigResult<PathBuf> {
        usage::write_module_report(log_dir, module.display_name(), self.usage.scope())
    }

    /// Write the unverified-properties report into the pipeline directory.
    pub fn write_unverified_report(&mut self) -> ConfigResult<Option<PathBuf>> {
        let dir = self
            .pipeline_dir()
            .ok_or_else(|| ConfigError::invalid_state("Pipeline directory is not set"))?;
        let unused = self.audit_unused();
        usage::write_unverified_report(&dir, &unused, &self.deprecations)
    }

    /// The unverified-properties report as text.
    pub fn render_unverified(&self) -> String {
        usage::render_unverified(&self.audit_unused(), &self.deprecations)
    }
}

/// `<module display name>.<suffix of property>`.
pub fn module_form_prop(module: &dyn ModuleScope, property: &str) -> String {
    format!("{}.{}", module.display_name(), suffix(property))
}

fn suffix(property: &str) -> &str {
    property
        .split_once('.')
        .map(|(_, rest)| rest)
        .unwrap_or(property)
}
