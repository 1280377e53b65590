//! Typed accessors over [`Config::get_string`].
//!
//! `get_*` returns `Ok(None)` for an unset property and an error for a value
//! of the wrong shape. `require_*` additionally turns an unset property into
//! a `NotFound` error.

use super::context::Config;
use crate::error::{ConfigError, ConfigResult, PathKind};
use crate::module::ModuleScope;
use crate::paths::absolutize;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Prefix of executable properties.
pub const EXE_PREFIX: &str = "exe.";

/// Prefix of host-side executable overrides used in isolated mode.
pub const HOST_EXE_PREFIX: &str = "hostExe.";

/// Boolean property tokens.
pub const TRUE: &str = "Y";
pub const FALSE: &str = "N";

type Module<'a> = Option<&'a dyn ModuleScope>;

impl Config {
    // Booleans

    /// `Y` or `N`, case-insensitive. Unset reads as `false`.
    pub fn get_boolean(&mut self, module: Module<'_>, property: &str) -> ConfigResult<bool> {
        match self.get_string(module, property)? {
            None => Ok(false),
            Some(value) => parse_boolean(property, &value),
        }
    }

    pub fn require_boolean(&mut self, module: Module<'_>, property: &str) -> ConfigResult<bool> {
        let value = self.require_string(module, property)?;
        parse_boolean(property, &value)
    }

    // Integers

    pub fn get_integer(&mut self, module: Module<'_>, property: &str) -> ConfigResult<Option<i64>> {
        self.get_string(module, property)?
            .map(|v| parse_integer(property, &v))
            .transpose()
    }

    pub fn require_integer(&mut self, module: Module<'_>, property: &str) -> ConfigResult<i64> {
        let value = self.require_string(module, property)?;
        parse_integer(property, &value)
    }

    pub fn get_positive_integer(
        &mut self,
        module: Module<'_>,
        property: &str,
    ) -> ConfigResult<Option<i64>> {
        self.get_integer(module, property)?
            .map(|v| check_positive(property, v))
            .transpose()
    }

    pub fn require_positive_integer(
        &mut self,
        module: Module<'_>,
        property: &str,
    ) -> ConfigResult<i64> {
        let value = self.require_integer(module, property)?;
        check_positive(property, value)
    }

    pub fn get_non_negative_integer(
        &mut self,
        module: Module<'_>,
        property: &str,
    ) -> ConfigResult<Option<i64>> {
        self.get_integer(module, property)?
            .map(|v| check_non_negative(property, v))
            .transpose()
    }

    pub fn require_non_negative_integer(
        &mut self,
        module: Module<'_>,
        property: &str,
    ) -> ConfigResult<i64> {
        let value = self.require_integer(module, property)?;
        check_non_negative(property, value)
    }

    // Doubles

    pub fn get_double(&mut self, module: Module<'_>, property: &str) -> ConfigResult<Option<f64>> {
        self.get_string(module, property)?
            .map(|v| parse_double(property, &v))
            .transpose()
    }

    pub fn require_double(&mut self, module: Module<'_>, property: &str) -> ConfigResult<f64> {
        let value = self.require_string(module, property)?;
        parse_double(property, &value)
    }

    pub fn get_positive_double(
        &mut self,
        module: Module<'_>,
        property: &str,
    ) -> ConfigResult<Option<f64>> {
        self.get_double(module, property)?
            .map(|v| check_positive_double(property, v))
            .transpose()
    }

    pub fn require_positive_double(
        &mut self,
        module: Module<'_>,
        property: &str,
    ) -> ConfigResult<f64> {
        let value = self.require_double(module, property)?;
        check_positive_double(property, value)
    }

    // Collections

    /// Comma-separated values, trimmed, empty tokens skipped. Unset reads as
    /// an empty list.
    pub fn get_list(&mut self, module: Module<'_>, property: &str) -> ConfigResult<Vec<String>> {
        Ok(self
            .get_string(module, property)?
            .map(|v| split_list(&v))
            .unwrap_or_default())
    }

    pub fn require_list(&mut self, module: Module<'_>, property: &str) -> ConfigResult<Vec<String>> {
        let list = self.get_list(module, property)?;
        if list.is_empty() {
            return Err(ConfigError::not_found(property));
        }
        Ok(list)
    }

    pub fn get_set(&mut self, module: Module<'_>, property: &str) -> ConfigResult<HashSet<String>> {
        Ok(self.get_list(module, property)?.into_iter().collect())
    }

    /// Distinct values in sorted order.
    pub fn get_ordered_set(
        &mut self,
        module: Module<'_>,
        property: &str,
    ) -> ConfigResult<BTreeSet<String>> {
        Ok(self.get_list(module, property)?.into_iter().collect())
    }

    pub fn require_set(
        &mut self,
        module: Module<'_>,
        property: &str,
    ) -> ConfigResult<BTreeSet<String>> {
        Ok(self.require_list(module, property)?.into_iter().collect())
    }

    // File system

    /// An existing file. A directory holding exactly one visible file is
    /// accepted in its place. The absolute path is written back to the
    /// property in host form.
    pub fn get_existing_file(
        &mut self,
        module: Module<'_>,
        property: &str,
    ) -> ConfigResult<Option<PathBuf>> {
        let Some(mut path) = self.existing_path(module, property)? else {
            return Ok(None);
        };

        if !path.is_file() {
            match sole_visible_file(&path)? {
                Some(file) => {
                    warn!(
                        "{} points to a directory with only 1 file; using {} as the value of {}",
                        path.display(),
                        file.display(),
                        property
                    );
                    path = file;
                }
                None => {
                    return Err(ConfigError::wrong_path_kind(property, &path, PathKind::File));
                }
            }
        }

        let name = self.module_prop_name(module, property);
        self.set_path_property(&name, &path);
        Ok(Some(path))
    }

    pub fn require_existing_file(
        &mut self,
        module: Module<'_>,
        property: &str,
    ) -> ConfigResult<PathBuf> {
        self.get_existing_file(module, property)?
            .ok_or_else(|| ConfigError::not_found(property))
    }

    /// An existing directory, written back in host form.
    pub fn get_existing_dir(
        &mut self,
        module: Module<'_>,
        property: &str,
    ) -> ConfigResult<Option<PathBuf>> {
        let Some(path) = self.existing_path(module, property)? else {
            return Ok(None);
        };
        if !path.is_dir() {
            return Err(ConfigError::wrong_path_kind(
                property,
                &path,
                PathKind::Directory,
            ));
        }
        let name = self.module_prop_name(module, property);
        self.set_path_property(&name, &path);
        Ok(Some(path))
    }

    pub fn require_existing_dir(
        &mut self,
        module: Module<'_>,
        property: &str,
    ) -> ConfigResult<PathBuf> {
        self.get_existing_dir(module, property)?
            .ok_or_else(|| ConfigError::not_found(property))
    }

    /// A non-empty list of existing directories, written back in host form.
    pub fn require_existing_dirs(
        &mut self,
        module: Module<'_>,
        property: &str,
    ) -> ConfigResult<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        for entry in self.require_set(module, property)? {
            let path = self.runtime_path(&entry);
            if !path.exists() {
                return Err(ConfigError::missing_path(property, &path));
            }
            if !path.is_dir() {
                return Err(ConfigError::wrong_path_kind(
                    property,
                    &path,
                    PathKind::Directory,
                ));
            }
            dirs.push(path);
        }
        let name = self.module_prop_name(module, property);
        self.set_path_list_property(&name, &dirs);
        Ok(dirs)
    }

    /// A list of existing files. Unset reads as an empty list.
    pub fn get_existing_file_list(
        &mut self,
        module: Module<'_>,
        property: &str,
    ) -> ConfigResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in self.get_list(module, property)? {
            let path = self.runtime_path(&entry);
            if !path.exists() {
                return Err(ConfigError::missing_path(property, &path));
            }
            if !path.is_file() {
                return Err(ConfigError::wrong_path_kind(property, &path, PathKind::File));
            }
            files.push(path);
        }
        if !files.is_empty() {
            let name = self.module_prop_name(module, property);
            self.set_path_list_property(&name, &files);
        }
        Ok(files)
    }

    // Executables

    /// Command for an `exe.` property.
    ///
    /// In isolated mode a `hostExe.` override naming an existing file wins.
    /// Otherwise the configured value is used, and when unset the bare
    /// command name (the property minus its prefix).
    pub fn get_exe(&mut self, module: Module<'_>, property: &str) -> ConfigResult<String> {
        let Some(command) = property.strip_prefix(EXE_PREFIX) else {
            return Err(ConfigError::invalid_name(
                property,
                format!(
                    "Only properties that begin with \"{}\" can be used as executables",
                    EXE_PREFIX
                ),
            ));
        };
        let command = command.to_string();
        let configured = self.get_string(module, property)?;

        if self.paths.is_active() {
            let host_prop = format!("{}{}", HOST_EXE_PREFIX, command);
            if let Some(file) = self.get_existing_file(module, &host_prop)? {
                return Ok(file.to_string_lossy().to_string());
            }
            if let Some(ref value) = configured {
                warn!(
                    "Property [{}] = {} is ignored in isolated mode unless [{}] is also set.",
                    property, value, host_prop
                );
                warn!(
                    "Isolated runtimes are expected to provide {} on their own PATH.",
                    command
                );
            }
        }

        Ok(configured.unwrap_or(command))
    }

    /// Extra parameters for an executable, with a trailing space so they can
    /// be appended to a command line directly. Empty when unset.
    pub fn get_exe_params(&mut self, module: Module<'_>, property: &str) -> ConfigResult<String> {
        Ok(self
            .get_string(module, property)?
            .map(|v| format!("{} ", v))
            .unwrap_or_default())
    }

    /// Resolve `property` to an absolute runtime path that must exist.
    fn existing_path(&mut self, module: Module<'_>, property: &str) -> ConfigResult<Option<PathBuf>> {
        let Some(value) = self.get_string(module, property)? else {
            return Ok(None);
        };
        let path = self.runtime_path(&value);
        if !path.exists() {
            return Err(ConfigError::missing_path(property, &path));
        }
        Ok(Some(path))
    }

    fn runtime_path(&self, value: &str) -> PathBuf {
        absolutize(&self.paths.to_runtime_path(Path::new(value)))
    }
}

fn parse_boolean(property: &str, value: &str) -> ConfigResult<bool> {
    if value.eq_ignore_ascii_case(TRUE) {
        Ok(true)
    } else if value.eq_ignore_ascii_case(FALSE) {
        Ok(false)
    } else {
        Err(ConfigError::invalid_format(
            property,
            format!(
                "Boolean properties must be set to either {} or {}.",
                TRUE, FALSE
            ),
        )
        .with_details(value))
    }
}

fn parse_integer(property: &str, value: &str) -> ConfigResult<i64> {
    value.parse::<i64>().map_err(|_| {
        ConfigError::invalid_format(property, "Property only accepts integer values")
            .with_details(value)
    })
}

fn parse_double(property: &str, value: &str) -> ConfigResult<f64> {
    value.parse::<f64>().map_err(|_| {
        ConfigError::invalid_format(property, "Property only accepts numeric values")
            .with_details(value)
    })
}

fn check_positive(property: &str, value: i64) -> ConfigResult<i64> {
    if value > 0 {
        Ok(value)
    } else {
        Err(
            ConfigError::invalid_format(property, "Property only accepts positive integer values")
                .with_details(value.to_string()),
        )
    }
}

fn check_non_negative(property: &str, value: i64) -> ConfigResult<i64> {
    if value >= 0 {
        Ok(value)
    } else {
        Err(ConfigError::invalid_format(
            property,
            "Property only accepts non-negative integer values",
        )
        .with_details(value.to_string()))
    }
}

fn check_positive_double(property: &str, value: f64) -> ConfigResult<f64> {
    // NaN fails this comparison too.
    if value > 0.0 {
        Ok(value)
    } else {
        Err(
            ConfigError::invalid_format(property, "Property only accepts positive numeric values")
                .with_details(value.to_string()),
        )
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// The only non-hidden entry of `dir`, if there is exactly one and it is a file.
fn sole_visible_file(dir: &Path) -> ConfigResult<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut visible = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_name().to_string_lossy().starts_with('.') {
            visible.push(entry.path());
        }
    }
    match visible.as_slice() {
        [only] if only.is_file() => Ok(Some(only.clone())),
        _ => Ok(None),
    }
}
