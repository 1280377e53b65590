//! Flat property value store.
//!
//! Holds the raw `name -> value` strings read from property files. Values are
//! kept exactly as written; variable substitution happens at read time.

use crate::error::{ConfigError, ConfigResult};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

/// Mutable property store with a frozen copy of the primary file.
#[derive(Debug, Clone, Default)]
pub struct ValueStore {
    props: HashMap<String, String>,
    /// Primary file entries exactly as loaded. Never mutated after load.
    initial: BTreeMap<String, String>,
}

impl ValueStore {
    /// An empty store with no initial snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from already-parsed entries.
    ///
    /// `initial` is the primary file's own entries; `props` the merged view
    /// (defaults overlaid by the primary file).
    pub fn from_parts(props: HashMap<String, String>, initial: BTreeMap<String, String>) -> Self {
        Self { props, initial }
    }

    /// Load a single property file. Its entries form the initial snapshot.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let entries = parse_file(path)?;
        let initial: BTreeMap<String, String> = entries.clone().into_iter().collect();
        Ok(Self {
            props: entries,
            initial,
        })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.props.get(name).map(String::as_str)
    }

    /// Set a value. An empty value removes the property.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if value.is_empty() {
            self.props.remove(&name);
        } else {
            self.props.insert(name, value);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.props.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Sorted property names.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.props.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Sorted copy of the current properties.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.props
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// The primary file's entries as originally loaded.
    pub fn initial_snapshot(&self) -> &BTreeMap<String, String> {
        &self.initial
    }
}

/// Read and parse a property file.
pub fn parse_file(path: &Path) -> ConfigResult<HashMap<String, String>> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::load_failed(path, e))?;
    parse_properties(&content, path)
}

/// Parse property file content. `origin` is only used for error messages.
pub fn parse_properties(content: &str, origin: &Path) -> ConfigResult<HashMap<String, String>> {
    let mut props = HashMap::new();
    let mut lines = content.lines().enumerate();

    while let Some((idx, raw)) = lines.next() {
        let line_no = idx + 1;
        let mut logical = raw.trim_start().to_string();
        if logical.is_empty() || logical.starts_with('#') || logical.starts_with('!') {
            continue;
        }

        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let Some((key, value)) = split_entry(&logical) else {
            return Err(ConfigError::malformed_line(
                origin,
                line_no,
                "expected key=value",
            ));
        };
        let key = unescape(key.trim_end());
        if key.is_empty() {
            return Err(ConfigError::malformed_line(origin, line_no, "empty key"));
        }
        let value = unescape(value.trim_start());

        if let Some(previous) = props.insert(key.clone(), value) {
            debug!(
                "Duplicate property [{}] at line {} overrides [{}]",
                key, line_no, previous
            );
        }
    }

    Ok(props)
}

/// A line continues when it ends in an odd number of backslashes.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Split on the first unescaped `=` or `:`.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return Some((&line[..i], &line[i + 1..])),
            _ => {}
        }
    }
    None
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
