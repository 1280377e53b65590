//! Host/runtime path virtualization.
//!
//! When the pipeline executes inside an isolated runtime (a container), the
//! file system seen by the process differs from the one seen by the user who
//! wrote the config file. This module maps between the two:
//! - `to_runtime_path`: host path -> path visible inside the runtime
//! - `to_host_path`: runtime path -> path the host user would recognise
//!
//! Outside isolated mode both directions are identities. Paths outside the
//! mapped root pass through unchanged. Pure string manipulation, no I/O.

use std::path::{Component, Path, PathBuf};

/// Default mount point of the host root inside the isolated runtime.
pub const DEFAULT_CONTAINER_ROOT: &str = "/mnt/pipeline";

/// Bidirectional host <-> runtime path mapper.
#[derive(Debug, Clone, Default)]
pub struct PathVirtualizer {
    /// `Some((host_root, container_root))` when isolated execution is active.
    mapping: Option<(String, String)>,
}

impl PathVirtualizer {
    /// A virtualizer that leaves every path untouched.
    pub fn inactive() -> Self {
        Self { mapping: None }
    }

    /// A virtualizer mapping `host_root` onto `container_root`.
    pub fn isolated(host_root: impl AsRef<Path>, container_root: impl AsRef<Path>) -> Self {
        let host = path_to_forward_slashes(&normalize_path_components(host_root.as_ref()));
        let container =
            path_to_forward_slashes(&normalize_path_components(container_root.as_ref()));
        Self {
            mapping: Some((trim_root(host), trim_root(container))),
        }
    }

    /// Whether isolated execution mode is active.
    pub fn is_active(&self) -> bool {
        self.mapping.is_some()
    }

    pub fn host_root(&self) -> Option<&str> {
        self.mapping.as_ref().map(|(host, _)| host.as_str())
    }

    pub fn container_root(&self) -> Option<&str> {
        self.mapping.as_ref().map(|(_, container)| container.as_str())
    }

    /// Translate a host path into the path visible to the running process.
    pub fn to_runtime_path(&self, path: &Path) -> PathBuf {
        match self.mapping {
            Some((ref host, ref container)) => rebase(path, host, container),
            None => path.to_path_buf(),
        }
    }

    /// Translate a runtime path back into the host user's view.
    pub fn to_host_path(&self, path: &Path) -> PathBuf {
        match self.mapping {
            Some((ref host, ref container)) => rebase(path, container, host),
            None => path.to_path_buf(),
        }
    }
}

/// Replace the `from` root of `path` with `to`, if `path` lies under `from`.
fn rebase(path: &Path, from: &str, to: &str) -> PathBuf {
    let canonical = path_to_forward_slashes(&normalize_path_components(path));
    match strip_root(&canonical, from) {
        Some("") => PathBuf::from(if to.is_empty() { "/" } else { to }),
        Some(rest) => PathBuf::from(format!("{}/{}", to, rest)),
        None => path.to_path_buf(),
    }
}

/// Strip `root` from `canonical`, respecting directory boundaries.
///
/// root = "/home/user" must not match "/home/username".
fn strip_root<'a>(canonical: &'a str, root: &str) -> Option<&'a str> {
    let rest = canonical.strip_prefix(root)?;
    if rest.is_empty() {
        return Some("");
    }
    rest.strip_prefix('/')
}

fn trim_root(root: String) -> String {
    if root == "/" {
        String::new()
    } else {
        root.trim_end_matches('/').to_string()
    }
}

/// Make a path absolute against the current working directory and normalize
/// it, without requiring it to exist.
pub fn absolutize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    normalize_path_components(&absolute)
}

/// Normalize path components without requiring the file to exist.
/// Handles `.` and `..` components.
pub fn normalize_path_components(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(p) => components.push(Component::Prefix(p)),
            Component::RootDir => components.push(Component::RootDir),
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                } else {
                    // Can't go up from root, keep the component
                    components.push(Component::ParentDir);
                }
            }
            Component::Normal(name) => components.push(Component::Normal(name)),
        }
    }

    components.iter().collect()
}

/// Convert path to string using forward slashes.
fn path_to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
