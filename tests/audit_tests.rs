//! Integration tests for usage tracking and the unused-property audit.

use pipeline_config::config::{
    Config, DEFAULT_PROPS, Deprecations, RuntimeEnv, UNVERIFIED_PROPS_FILE,
};
use pipeline_config::env::MapEnvironment;
use pipeline_config::error::ErrorCode;
use pipeline_config::module::StaticModule;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn load(path: &Path) -> Config {
    let runtime = RuntimeEnv::default().with_home_dir("/home/u");
    Config::load_with_host(path, &runtime, MapEnvironment::new()).expect("load config")
}

fn write_primary(temp: &TempDir, content: &str) -> std::path::PathBuf {
    let path = temp.path().join("pipeline.properties");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_audit_reports_only_unread_keys() {
    let temp = TempDir::new().unwrap();
    let mut cfg = load(&write_primary(&temp, "a=1\nb=2\nc=3\nblank=\n"));

    cfg.get_string(None, "a").unwrap();
    cfg.checkpoint();
    cfg.require_string(None, "b").unwrap();
    cfg.checkpoint();

    let unused = cfg.audit_unused();
    assert_eq!(unused.keys().collect::<Vec<_>>(), vec!["c"]);
}

#[test]
fn test_checkpoint_starts_a_new_stage() {
    let temp = TempDir::new().unwrap();
    let mut cfg = load(&write_primary(&temp, "a=1\nb=2\n"));

    cfg.get_string(None, "a").unwrap();
    assert_eq!(cfg.module_used_properties().len(), 1);
    cfg.checkpoint();
    assert!(cfg.module_used_properties().is_empty());

    cfg.get_string(None, "b").unwrap();
    let used = cfg.used_properties().unwrap();
    assert!(used.contains_key("a"));
    assert!(used.contains_key("b"));
}

#[test]
fn test_read_of_unset_property_is_tracked() {
    let temp = TempDir::new().unwrap();
    let mut cfg = load(&write_primary(&temp, "a=1\n"));
    assert_eq!(cfg.get_string(None, "missing").unwrap(), None);
    assert_eq!(cfg.module_used_properties()["missing"], None);
}

#[test]
fn test_defaults_are_not_audited() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("standard.properties"),
        "shared.unused=1\nshared.threads=4\n",
    )
    .unwrap();
    let mut cfg = load(&write_primary(
        &temp,
        "pipeline.defaultProps=standard.properties\nlocal=x\n",
    ));

    assert_eq!(cfg.require_integer(None, "shared.threads").unwrap(), 4);
    assert_eq!(cfg.sources().len(), 2);
    assert_eq!(cfg.config_file_ext().as_deref(), Some(".properties"));

    let used = cfg.used_properties().unwrap();
    assert!(used.contains_key(DEFAULT_PROPS));

    // Only primary-file entries can be reported unused.
    let unused = cfg.audit_unused();
    assert_eq!(unused.keys().collect::<Vec<_>>(), vec!["local"]);
}

#[test]
fn test_default_props_key_is_never_reported_unused() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("std.properties"), "threads=4\n").unwrap();
    let mut cfg = load(&write_primary(
        &temp,
        "pipeline.defaultProps=std.properties\nlocal=x\n",
    ));

    cfg.get_string(None, "local").unwrap();
    cfg.checkpoint();

    assert!(cfg.audit_unused().is_empty());
    assert!(!cfg.render_unverified().contains(DEFAULT_PROPS));

    let run = temp.path().join("run");
    fs::create_dir_all(&run).unwrap();
    cfg.set_pipeline_dir(&run).unwrap();
    assert_eq!(cfg.write_unverified_report().unwrap(), None);
}

#[test]
fn test_audit_shows_values_as_loaded() {
    let temp = TempDir::new().unwrap();
    let mut cfg = load(&write_primary(&temp, "root=/data\nout.dir=${root}/out\n"));

    cfg.get_string(None, "root").unwrap();
    cfg.checkpoint();

    let unused = cfg.audit_unused();
    assert_eq!(unused["out.dir"], "${root}/out");
}

#[test]
fn test_module_report_lists_stage_reads() {
    let temp = TempDir::new().unwrap();
    let logs = temp.path().join("logs");
    fs::create_dir_all(&logs).unwrap();
    let mut cfg = load(&write_primary(&temp, "a=1\nRarefier.b=2\nb=3\n"));
    let module = StaticModule::new("Rarefier");

    cfg.get_string(Some(&module), "a").unwrap();
    cfg.get_string(Some(&module), "b").unwrap();
    cfg.get_string(Some(&module), "unset").unwrap();

    let path = cfg.save_module_props(&module, &logs).unwrap();
    assert_eq!(path, logs.join("Rarefier_used.properties"));
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("a=1\n"));
    assert!(content.contains("Rarefier.b=2\n"));
    assert!(!content.contains("unset"));
}

#[test]
fn test_unverified_report_in_pipeline_dir() {
    let temp = TempDir::new().unwrap();
    let run = temp.path().join("run_2024");
    fs::create_dir_all(&run).unwrap();
    let mut cfg = load(&write_primary(
        &temp,
        "used=1\nreport.numHits=Y\nstray=2\n",
    ))
    .with_deprecations(Deprecations::new().replaced_by("report.numHits", "report.numReads"));

    let err = cfg.write_unverified_report().unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidState);

    cfg.get_string(None, "used").unwrap();
    cfg.checkpoint();
    cfg.set_pipeline_dir(&run).unwrap();

    let path = cfg.write_unverified_report().unwrap().unwrap();
    assert_eq!(path, run.join(UNVERIFIED_PROPS_FILE));
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("report.numHits=Y\n"));
    assert!(content.contains("use [report.numReads] instead"));
    assert!(content.contains("stray=2\n"));
    assert!(!content.contains("used=1"));
}

#[test]
fn test_nothing_unused_writes_no_report() {
    let temp = TempDir::new().unwrap();
    let run = temp.path().join("run");
    fs::create_dir_all(&run).unwrap();
    let mut cfg = load(&write_primary(&temp, "only=1\n"));

    cfg.get_string(None, "only").unwrap();
    cfg.set_pipeline_dir(&run).unwrap();
    assert!(cfg.write_unverified_report().unwrap().is_none());
    assert!(!run.join(UNVERIFIED_PROPS_FILE).exists());
}

#[test]
fn test_missing_primary_file_fails_to_load() {
    let temp = TempDir::new().unwrap();
    let runtime = RuntimeEnv::default().with_home_dir("/home/u");
    let err = Config::load_with_host(
        &temp.path().join("absent.properties"),
        &runtime,
        MapEnvironment::new(),
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::LoadFailed);
}
