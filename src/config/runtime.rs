//! Runtime environment the engine runs in.
//!
//! Home and install directories, and whether the process runs inside an
//! isolated runtime whose file system is mounted at a different root.

use crate::paths::{DEFAULT_CONTAINER_ROOT, PathVirtualizer};
use std::path::PathBuf;

const ENV_HOME_DIR: &str = "PIPELINE_HOME_DIR";
const ENV_INSTALL_DIR: &str = "PIPELINE_INSTALL_DIR";
const ENV_ISOLATED: &str = "PIPELINE_ISOLATED";
const ENV_HOST_ROOT: &str = "PIPELINE_HOST_ROOT";
const ENV_CONTAINER_ROOT: &str = "PIPELINE_CONTAINER_ROOT";

/// Facts about the runtime supplied by the environment.
#[derive(Debug, Clone)]
pub struct RuntimeEnv {
    /// Resolved home directory, used for `~` and `${HOME}`.
    pub home_dir: PathBuf,
    /// Install directory of the tool, if known.
    pub install_dir: Option<PathBuf>,
    /// Running inside an isolated runtime.
    pub isolated: bool,
    /// Host directory mounted into the isolated runtime.
    pub host_root: Option<PathBuf>,
    /// Where `host_root` appears inside the isolated runtime.
    pub container_root: PathBuf,
}

impl Default for RuntimeEnv {
    fn default() -> Self {
        Self {
            home_dir: dirs::home_dir().unwrap_or_else(|| PathBuf::from("/")),
            install_dir: None,
            isolated: false,
            host_root: None,
            container_root: PathBuf::from(DEFAULT_CONTAINER_ROOT),
        }
    }
}

impl RuntimeEnv {
    /// Discover the runtime from environment variables and platform defaults.
    pub fn discover() -> Self {
        let home_dir = std::env::var(ENV_HOME_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("/"));

        let install_dir = std::env::var(ENV_INSTALL_DIR).ok().map(PathBuf::from);

        let isolated = std::env::var(ENV_ISOLATED)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let host_root = std::env::var(ENV_HOST_ROOT).ok().map(PathBuf::from);

        let container_root = std::env::var(ENV_CONTAINER_ROOT)
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTAINER_ROOT));

        Self {
            home_dir,
            install_dir,
            isolated,
            host_root,
            container_root,
        }
    }

    pub fn with_home_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.home_dir = dir.into();
        self
    }

    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = Some(dir.into());
        self
    }

    /// Enable isolated execution with `host_root` mounted at `container_root`.
    pub fn with_isolation(
        mut self,
        host_root: impl Into<PathBuf>,
        container_root: impl Into<PathBuf>,
    ) -> Self {
        self.isolated = true;
        self.host_root = Some(host_root.into());
        self.container_root = container_root.into();
        self
    }

    /// Path virtualizer for this runtime.
    ///
    /// Isolation without a host root maps the host file system root.
    pub fn virtualizer(&self) -> PathVirtualizer {
        if !self.isolated {
            return PathVirtualizer::inactive();
        }
        let host_root = self
            .host_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("/"));
        PathVirtualizer::isolated(host_root, &self.container_root)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "y" | "yes"
    )
}
