//! Pipeline configuration engine
//!
//! Loads pipeline property files, resolves `${VAR}` references, maps paths
//! into isolated runtimes, exposes typed accessors and audits which
//! properties a run actually used.

pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod format;
pub mod logging;
pub mod module;
pub mod paths;
