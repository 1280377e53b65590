//! pipeline-config
//!
//! Command-line front end for the pipeline configuration engine: look up
//! resolved properties, expand raw values, dump the effective configuration
//! and audit which declared properties were never read.

use anyhow::{Context, Result, bail};
use clap::Parser;
use pipeline_config::cli::{Cli, Command};
use pipeline_config::cli::audit::AuditArgs;
use pipeline_config::cli::dump::DumpArgs;
use pipeline_config::config::{Config, RuntimeEnv, ValueStore};
use pipeline_config::env::{ProcessEnvironment, ShellEnvironment};
use pipeline_config::logging::{self, LogTarget};
use pipeline_config::module::{ModuleScope, StaticModule};
use std::path::PathBuf;
use tracing::{debug, info};

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let runtime = runtime_from_cli(&cli);
    debug!("Runtime: {:?}", runtime);

    let mut config = load_config(&cli, &runtime)?;

    let module = cli.module.as_deref().map(StaticModule::new);
    let scope = module.as_ref().map(|m| m as &dyn ModuleScope);

    match cli.command {
        Command::Get { property } => {
            let value = config.require_string(scope, &property)?;
            println!("{}", value);
        }
        Command::Resolve { value } => {
            println!("{}", config.resolve(&value)?);
        }
        Command::Dump(args) => run_dump(&config, &args)?,
        Command::Audit(args) => run_audit(&mut config, scope, args)?,
    }

    Ok(())
}

/// Discover the runtime from the environment, then apply CLI overrides.
fn runtime_from_cli(cli: &Cli) -> RuntimeEnv {
    let mut runtime = RuntimeEnv::discover();
    if let Some(home) = &cli.home {
        runtime = runtime.with_home_dir(home);
    }
    if let Some(dir) = &cli.install_dir {
        runtime = runtime.with_install_dir(dir);
    }
    if cli.isolated || cli.host_root.is_some() {
        let host_root = cli
            .host_root
            .clone()
            .or_else(|| runtime.host_root.clone())
            .unwrap_or_else(|| PathBuf::from("/"));
        let container_root = cli
            .container_root
            .clone()
            .unwrap_or_else(|| runtime.container_root.clone());
        runtime = runtime.with_isolation(host_root, container_root);
    } else if let Some(root) = &cli.container_root {
        runtime.container_root = root.clone();
    }
    runtime
}

/// Load the primary file, or start from an empty store for `resolve`.
fn load_config(cli: &Cli, runtime: &RuntimeEnv) -> Result<Config> {
    let Some(path) = &cli.config else {
        if !matches!(cli.command, Command::Resolve { .. }) {
            bail!("--config is required for this command");
        }
        return Ok(if cli.no_shell {
            Config::from_store(ValueStore::new(), runtime, ProcessEnvironment)
        } else {
            Config::from_store(ValueStore::new(), runtime, ShellEnvironment)
        });
    };
    let config = if cli.no_shell {
        Config::load_with_host(path, runtime, ProcessEnvironment)
    } else {
        Config::load(path, runtime)
    };
    config.with_context(|| format!("Failed to load {}", path.display()))
}

fn run_dump(config: &Config, args: &DumpArgs) -> Result<()> {
    let Some(format) = args.output_format() else {
        bail!(
            "Unknown format '{}': expected properties, json, or markdown",
            args.format
        );
    };
    let (title, props) = if args.initial {
        ("Initial properties", config.initial_properties().clone())
    } else {
        ("Properties", config.properties())
    };
    print!("{}", format.render(title, &props));
    Ok(())
}

fn run_audit(
    config: &mut Config,
    scope: Option<&dyn ModuleScope>,
    args: AuditArgs,
) -> Result<()> {
    for property in &args.read {
        config.get_string(scope, property)?;
    }
    config.checkpoint();

    match args.out {
        Some(dir) => {
            config.set_pipeline_dir(&dir)?;
            match config.write_unverified_report()? {
                Some(path) => println!("{}", path.display()),
                None => info!("Every property in the primary config file was read"),
            }
        }
        None => print!("{}", config.render_unverified()),
    }
    Ok(())
}
