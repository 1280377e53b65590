//! Audit subcommand for pipeline-config
//!
//! Simulates a run that reads the given properties, then reports which
//! properties of the primary file were never read.

use clap::Args;
use std::path::PathBuf;

/// Arguments for the audit subcommand
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Property to mark as read (repeatable, or comma-separated)
    #[arg(short, long = "read", value_name = "PROPERTY", value_delimiter = ',')]
    pub read: Vec<String>,

    /// Write `unverified.properties` into this directory instead of stdout
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}
