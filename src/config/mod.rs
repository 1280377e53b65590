//! Pipeline configuration.
//!
//! A run is configured by one primary property file, optionally layered over
//! default files listed in `pipeline.defaultProps`:
//! 1. **Defaults** - files named by `pipeline.defaultProps`, recursively
//! 2. **Primary** - the file the run was started with
//!
//! Values are read through [`Config`], which expands `${VAR}` references,
//! applies module-scoped overrides, translates paths for isolated runtimes
//! and records every read for the end-of-run audit.
//!
//! ## Environment Variables
//! - `PIPELINE_HOME_DIR` - Home directory used for `~` (default: user home)
//! - `PIPELINE_INSTALL_DIR` - Install directory, resolvable as `${PIPELINE_INSTALL_DIR}`
//! - `PIPELINE_ISOLATED` - Run in isolated mode (`1`, `true`, `Y`)
//! - `PIPELINE_HOST_ROOT` - Host directory mounted into the isolated runtime
//! - `PIPELINE_CONTAINER_ROOT` - Mount point inside the runtime (default: `/mnt/pipeline`)

mod accessors;
mod context;
mod deprecated;
mod loader;
mod runtime;
mod store;
mod usage;

pub use accessors::{EXE_PREFIX, FALSE, HOST_EXE_PREFIX, TRUE};
pub use context::{
    Config, INTERNAL_PIPELINE_DIR, INTERNAL_PREFIX, PIPELINE_ENV, PIPELINE_ENV_CLUSTER,
    PipelineDir, module_form_prop,
};
pub use deprecated::Deprecations;
pub use loader::{ConfigLoader, ConfigTier, DEFAULT_PROPS};
pub use runtime::RuntimeEnv;
pub use store::{ValueStore, parse_file, parse_properties};
pub use usage::{
    UNVERIFIED_PROPS_FILE, USED_PROPS_SUFFIX, UsageMap, UsageTracker, render_unverified,
    write_module_report, write_unverified_report,
};
