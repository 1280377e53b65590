//! Output formatting for property snapshots.

use serde_json::Value;
use std::collections::BTreeMap;

/// Output format for property listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `key=value` lines that load back as a property file.
    #[default]
    Properties,
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "properties" | "props" => Some(OutputFormat::Properties),
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }

    /// Render `props` in this format. `title` is used by markdown only.
    pub fn render(&self, title: &str, props: &BTreeMap<String, String>) -> String {
        match self {
            OutputFormat::Properties => format_properties(props),
            OutputFormat::Json => format!("{:#}\n", properties_to_json(props)),
            OutputFormat::Markdown => format_properties_markdown(title, props),
        }
    }
}

/// Format properties as a loadable property file body.
pub fn format_properties(props: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in props {
        out.push_str(&escape(key, true));
        out.push('=');
        out.push_str(&escape(value, false));
        out.push('\n');
    }
    out
}

/// Properties as a flat JSON object.
pub fn properties_to_json(props: &BTreeMap<String, String>) -> Value {
    Value::Object(
        props
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

/// Format properties as a markdown table.
pub fn format_properties_markdown(title: &str, props: &BTreeMap<String, String>) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {} ({})\n\n", title, props.len()));
    if props.is_empty() {
        return md;
    }

    md.push_str("| Property | Value |\n");
    md.push_str("|---|---|\n");
    for (key, value) in props {
        md.push_str(&format!(
            "| `{}` | {} |\n",
            key,
            value.replace('|', "\\|")
        ));
    }

    md
}

fn escape(s: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.chars().enumerate() {
        match c {
            // The parser trims leading blanks and skips comment lines.
            ' ' if i == 0 => out.push_str("\\ "),
            '#' | '!' if i == 0 && is_key => {
                out.push('\\');
                out.push(c);
            }
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '=' | ':' if is_key => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
