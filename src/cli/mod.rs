//! CLI command definitions for pipeline-config
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod audit;
pub mod dump;

use audit::AuditArgs;
use clap::{Parser, Subcommand};
use dump::DumpArgs;
use std::path::PathBuf;

/// Inspect and audit pipeline property files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Primary property file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Read properties as this module (enables `<module>.<name>` overrides)
    #[arg(short, long, global = true, value_name = "NAME")]
    pub module: Option<String>,

    /// Run as if inside an isolated runtime
    #[arg(long, global = true)]
    pub isolated: bool,

    /// Host directory mounted into the isolated runtime
    #[arg(long, global = true, value_name = "DIR")]
    pub host_root: Option<PathBuf>,

    /// Mount point of the host root inside the isolated runtime
    #[arg(long, global = true, value_name = "DIR")]
    pub container_root: Option<PathBuf>,

    /// Home directory used for `~` and `${HOME}`
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Install directory, resolvable as `${PIPELINE_INSTALL_DIR}`
    #[arg(long, global = true, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,

    /// Look up unresolved variables in the process environment instead of a login shell
    #[arg(long, global = true)]
    pub no_shell: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved value of a property
    Get {
        /// Property name
        property: String,
    },

    /// Expand `${VAR}` references and `~` in a raw string
    Resolve {
        /// Raw value
        value: String,
    },

    /// Print every property, sorted by name
    Dump(DumpArgs),

    /// Report primary-file properties that were never read
    Audit(AuditArgs),
}
