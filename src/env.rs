//! `${VAR}` and `~` substitution.
//!
//! Tokens are resolved against, in order:
//! 1. the value store, keyed by the token name without markup,
//! 2. the builtin install-directory token,
//! 3. `HOME`, the runtime home directory,
//! 4. the host environment provider (a login shell by default).
//!
//! Resolved values are memoized per token for the life of the resolver. A
//! token nothing can resolve makes [`Resolver::resolve`] hand back its input
//! untouched.

use crate::config::ValueStore;
use crate::error::{ConfigError, ConfigResult};
use regex_lite::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Name of the builtin variable holding the tool's install directory.
pub const INSTALL_DIR_VAR: &str = "PIPELINE_INSTALL_DIR";

/// Default cap on substitution passes for a single value.
pub const DEFAULT_MAX_PASSES: usize = 64;

/// Last-resort lookup of a variable in the host environment.
pub trait HostEnvironment {
    /// Value of `name` (without `${}` markup), or `None` if unset or empty.
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Asks a bash login shell to expand the variable, so values exported from
/// profile scripts are visible too.
#[derive(Debug, Clone, Default)]
pub struct ShellEnvironment;

impl HostEnvironment for ShellEnvironment {
    fn lookup(&self, name: &str) -> Option<String> {
        if !is_shell_identifier(name) {
            debug!("Refusing to pass [{}] to the shell", name);
            return None;
        }
        let output = Command::new("bash")
            .arg("-lc")
            .arg(format!("printf '%s' \"${{{}}}\"", name))
            .output();
        match output {
            Ok(out) if out.status.success() => {
                let value = String::from_utf8_lossy(&out.stdout).trim().to_string();
                if value.is_empty() { None } else { Some(value) }
            }
            Ok(out) => {
                warn!(
                    "Shell lookup of [{}] exited with {}",
                    name, out.status
                );
                None
            }
            Err(e) => {
                warn!("Shell lookup of [{}] failed: {}", name, e);
                None
            }
        }
    }
}

/// Reads the current process environment only.
#[derive(Debug, Clone, Default)]
pub struct ProcessEnvironment;

impl HostEnvironment for ProcessEnvironment {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Fixed, in-memory environment. Deterministic stand-in for the shell.
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl HostEnvironment for MapEnvironment {
    fn lookup(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

fn is_shell_identifier(name: &str) -> bool {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"))
        .is_match(name)
}

/// Tunables for the resolver.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Maximum substitution passes before giving up with an error.
    pub max_passes: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// Memoizing variable resolver.
pub struct Resolver {
    home_dir: PathBuf,
    install_dir: Option<PathBuf>,
    host: Box<dyn HostEnvironment>,
    cache: HashMap<String, String>,
    options: ResolverOptions,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("home_dir", &self.home_dir)
            .field("install_dir", &self.install_dir)
            .field("cached", &self.cache.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Resolver {
    pub fn new(home_dir: PathBuf, install_dir: Option<PathBuf>) -> Self {
        Self {
            home_dir,
            install_dir,
            host: Box::new(ShellEnvironment),
            cache: HashMap::new(),
            options: ResolverOptions::default(),
        }
    }

    /// Replace the host environment provider.
    pub fn with_host(mut self, host: impl HostEnvironment + 'static) -> Self {
        self.host = Box::new(host);
        self
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Number of memoized tokens.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Expand `~` and `${...}` tokens in `raw`.
    ///
    /// Returns `raw` unchanged when it holds no tokens or when a token cannot
    /// be resolved. Fails only when substitution does not settle within
    /// `max_passes`.
    pub fn resolve(&mut self, raw: &str, store: &ValueStore) -> ConfigResult<String> {
        self.expand(raw, store, true)
    }

    /// Like [`Resolver::resolve`], but neither reads nor fills the cache.
    ///
    /// For stores other than the run's own, such as a single file's entries
    /// while the default chain is loading.
    pub fn resolve_detached(&mut self, raw: &str, store: &ValueStore) -> ConfigResult<String> {
        self.expand(raw, store, false)
    }

    fn expand(&mut self, raw: &str, store: &ValueStore, memoize: bool) -> ConfigResult<String> {
        let trimmed = raw.trim();
        if !has_env_var(trimmed) {
            return Ok(raw.to_string());
        }

        let mut val = match trimmed.strip_prefix('~') {
            Some(rest) => {
                debug!("Expanding leading \"~\" in \"{}\"", raw);
                format!("${{HOME}}{}", rest)
            }
            None => trimmed.to_string(),
        };

        let mut passes = 0;
        while let Some(token) = first_token(&val) {
            passes += 1;
            if passes > self.options.max_passes {
                return Err(ConfigError::resolution_limit(raw, self.options.max_passes));
            }
            let token = token.to_string();
            let resolved = self.token_value(&token, store, memoize);
            debug!("Token {} = \"{}\"", token, resolved);
            if resolved == token {
                warn!("Unable to resolve {} in \"{}\", returning it unchanged", token, raw);
                return Ok(raw.to_string());
            }
            val = val.replace(&token, &resolved);
        }

        info!("Resolved \"{}\" --> \"{}\"", raw, val);
        Ok(val)
    }

    /// Value for one `${NAME}` token, or the token itself when unresolvable.
    fn token_value(&mut self, token: &str, store: &ValueStore, memoize: bool) -> String {
        if memoize && let Some(cached) = self.cache.get(token) {
            return cached.clone();
        }

        let name = strip_markup(token);
        let value = if let Some(v) = store.get(name) {
            Some(v.to_string())
        } else if name == INSTALL_DIR_VAR {
            self.install_dir
                .as_ref()
                .filter(|dir| dir.is_dir())
                .map(|dir| dir.to_string_lossy().to_string())
        } else if name == "HOME" {
            Some(self.home_dir.to_string_lossy().to_string())
        } else {
            self.host.lookup(name)
        };

        match value {
            Some(v) if !v.trim().is_empty() => {
                if memoize {
                    self.cache.insert(token.to_string(), v.clone());
                }
                v
            }
            _ => token.to_string(),
        }
    }
}

/// True when `val` starts with `~` or holds a `${` before the first `}`.
fn has_env_var(val: &str) -> bool {
    val.starts_with('~') || first_token(val).is_some()
}

/// The first `${...}` token: from the first `${` to the first `}`, provided
/// that `}` comes after the `${`. Nested braces are not supported.
fn first_token(val: &str) -> Option<&str> {
    let start = val.find("${")?;
    let end = val.find('}')?;
    if start < end {
        Some(&val[start..=end])
    } else {
        None
    }
}

fn strip_markup(token: &str) -> &str {
    token
        .strip_prefix("${")
        .and_then(|t| t.strip_suffix('}'))
        .unwrap_or(token)
}
