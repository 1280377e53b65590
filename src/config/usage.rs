//! Tracking of which properties were actually read.
//!
//! Two records are kept: one for the current pipeline stage and a cumulative
//! one for the whole run. A checkpoint at each stage boundary folds the stage
//! record into the cumulative one. Entries with no value are retained so that
//! "read but unset" is distinguishable from "never read".

use super::deprecated::Deprecations;
use crate::error::ConfigResult;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Suffix of the per-stage used-properties file.
pub const USED_PROPS_SUFFIX: &str = "_used.properties";

/// File name of the declared-but-unused report.
pub const UNVERIFIED_PROPS_FILE: &str = "unverified.properties";

/// Property name -> resolved value (`None` when read but unset).
pub type UsageMap = BTreeMap<String, Option<String>>;

#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    scope: UsageMap,
    cumulative: UsageMap,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a read in the current stage scope.
    pub fn record(&mut self, name: &str, value: Option<&str>) {
        self.scope
            .insert(name.to_string(), value.map(str::to_string));
    }

    /// Last recorded value for `name`, current scope first.
    pub fn last_value(&self, name: &str) -> Option<&str> {
        self.scope
            .get(name)
            .or_else(|| self.cumulative.get(name))
            .and_then(|v| v.as_deref())
    }

    /// Reads recorded since the last checkpoint.
    pub fn scope(&self) -> &UsageMap {
        &self.scope
    }

    /// Fold the stage record into the cumulative one and clear it.
    pub fn checkpoint(&mut self) {
        self.cumulative.append(&mut self.scope);
    }

    /// Everything read so far in the run, including the current stage.
    pub fn used(&self) -> UsageMap {
        let mut all = self.cumulative.clone();
        all.extend(self.scope.clone());
        all
    }

    /// Initial entries never read by any stage, blank values dropped.
    pub fn audit_unused(&self, initial: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        initial
            .iter()
            .filter(|(k, v)| {
                !v.trim().is_empty()
                    && !self.cumulative.contains_key(*k)
                    && !self.scope.contains_key(*k)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Write the current stage's used properties to
/// `<log_dir>/<stage><USED_PROPS_SUFFIX>`. Unset entries are skipped.
pub fn write_module_report(
    log_dir: &Path,
    stage: &str,
    used: &UsageMap,
) -> ConfigResult<PathBuf> {
    let path = log_dir.join(format!("{}{}", stage, USED_PROPS_SUFFIX));
    let mut writer = BufWriter::new(File::create(&path)?);
    writeln!(
        writer,
        "# Properties used during the execution of module: {}",
        stage
    )?;
    for (key, value) in used {
        if let Some(value) = value {
            writeln!(writer, "{}={}", key, value)?;
        }
    }
    writer.flush()?;
    info!("Saved used properties for {} --> {}", stage, path.display());
    Ok(path)
}

/// Render the unverified-properties report, with deprecation notices.
pub fn render_unverified(unused: &BTreeMap<String, String>, deprecations: &Deprecations) -> String {
    let mut out = String::new();
    out.push_str(
        "### Properties from the PRIMARY config file that were NOT USED during check-dependencies:\n#\n",
    );
    out.push_str(&format!(
        "# Generated {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    for (key, value) in unused {
        if let Some(notice) = deprecations.message(key) {
            out.push_str(&format!("# {}\n", notice));
        }
        out.push_str(&format!("{}={}\n", key, value));
    }
    out
}

/// Write the unverified-properties report into `pipeline_dir`.
///
/// Returns `None` without touching the file system when nothing is unused.
pub fn write_unverified_report(
    pipeline_dir: &Path,
    unused: &BTreeMap<String, String>,
    deprecations: &Deprecations,
) -> ConfigResult<Option<PathBuf>> {
    if unused.is_empty() {
        return Ok(None);
    }

    warn!("Properties from the PRIMARY config file that were NOT USED during check-dependencies:");
    for (key, value) in unused {
        if let Some(notice) = deprecations.message(key) {
            warn!("      {}", notice);
        }
        warn!("      {}={}", key, value);
    }

    let path = pipeline_dir.join(UNVERIFIED_PROPS_FILE);
    let mut writer = BufWriter::new(File::create(&path)?);
    writer.write_all(render_unverified(unused, deprecations).as_bytes())?;
    writer.flush()?;
    Ok(Some(path))
}
