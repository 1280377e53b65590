//! Dump subcommand for pipeline-config

use crate::format::OutputFormat;
use clap::Args;

/// Arguments for the dump subcommand
#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Output format: properties, json, or markdown
    #[arg(short, long, default_value = "properties")]
    pub format: String,

    /// Only the primary file's entries, as loaded
    #[arg(long)]
    pub initial: bool,
}

impl DumpArgs {
    /// Parse the requested output format.
    pub fn output_format(&self) -> Option<OutputFormat> {
        OutputFormat::from_str(&self.format)
    }
}
