//! Integration tests for the typed accessors.
//!
//! Each test writes a primary property file into a temp directory and loads
//! it with a deterministic host environment.

use pipeline_config::config::{Config, RuntimeEnv};
use pipeline_config::env::MapEnvironment;
use pipeline_config::error::ErrorCode;
use pipeline_config::module::StaticModule;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Write `content` as the primary file and load it.
fn load_config(temp: &TempDir, content: &str) -> Config {
    let path = temp.path().join("pipeline.properties");
    fs::write(&path, content).expect("write primary config");
    let runtime = RuntimeEnv::default().with_home_dir("/home/u");
    Config::load_with_host(&path, &runtime, MapEnvironment::new()).expect("load config")
}

#[test]
fn test_boolean_tokens() {
    let temp = TempDir::new().unwrap();
    let mut cfg = load_config(&temp, "flag.yes=Y\nflag.lower=n\nflag.bad=maybe\n");

    assert!(cfg.get_boolean(None, "flag.yes").unwrap());
    assert!(!cfg.get_boolean(None, "flag.lower").unwrap());
    assert!(!cfg.get_boolean(None, "flag.absent").unwrap());

    let err = cfg.get_boolean(None, "flag.bad").unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidFormat);
    assert_eq!(err.property.as_deref(), Some("flag.bad"));

    let err = cfg.require_boolean(None, "flag.absent").unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[test]
fn test_integer_accessors() {
    let temp = TempDir::new().unwrap();
    let mut cfg = load_config(
        &temp,
        "count=12\nzero=0\nnegative=-3\nword=twelve\n",
    );

    assert_eq!(cfg.get_integer(None, "count").unwrap(), Some(12));
    assert_eq!(cfg.get_integer(None, "absent").unwrap(), None);
    assert_eq!(cfg.require_positive_integer(None, "count").unwrap(), 12);
    assert_eq!(cfg.require_non_negative_integer(None, "zero").unwrap(), 0);

    let err = cfg.get_positive_integer(None, "zero").unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidFormat);
    let err = cfg.get_non_negative_integer(None, "negative").unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidFormat);
    let err = cfg.require_integer(None, "word").unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidFormat);
    let err = cfg.require_integer(None, "absent").unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[test]
fn test_double_accessors() {
    let temp = TempDir::new().unwrap();
    let mut cfg = load_config(&temp, "ratio=0.25\nnone=0\nword=half\n");

    assert_eq!(cfg.get_double(None, "ratio").unwrap(), Some(0.25));
    assert_eq!(cfg.require_positive_double(None, "ratio").unwrap(), 0.25);
    assert_eq!(cfg.get_positive_double(None, "absent").unwrap(), None);

    let err = cfg.require_positive_double(None, "none").unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidFormat);
    let err = cfg.require_double(None, "word").unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidFormat);
}

#[test]
fn test_list_and_set_accessors() {
    let temp = TempDir::new().unwrap();
    let mut cfg = load_config(&temp, "taxa=phylum, class,,genus ,class\nempty=\n");

    assert_eq!(
        cfg.get_list(None, "taxa").unwrap(),
        vec!["phylum", "class", "genus", "class"]
    );
    assert_eq!(cfg.get_set(None, "taxa").unwrap().len(), 3);
    assert_eq!(
        cfg.get_ordered_set(None, "taxa")
            .unwrap()
            .into_iter()
            .collect::<Vec<_>>(),
        vec!["class", "genus", "phylum"]
    );
    assert!(cfg.get_list(None, "absent").unwrap().is_empty());

    let err = cfg.require_list(None, "empty").unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
    let err = cfg.require_set(None, "absent").unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[test]
fn test_positive_integer_falls_back_to_unscoped_name() {
    let temp = TempDir::new().unwrap();
    let mut cfg = load_config(&temp, "minOtuCount=5\n");
    assert_eq!(
        cfg.require_positive_integer(None, "removeLowCounts.minOtuCount")
            .unwrap(),
        5
    );

    let temp = TempDir::new().unwrap();
    let mut cfg = load_config(&temp, "minOtuCount=0\n");
    let err = cfg
        .require_positive_integer(None, "removeLowCounts.minOtuCount")
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidFormat);
    assert!(err.message.contains("positive"));
}

#[test]
fn test_module_scoped_override() {
    let temp = TempDir::new().unwrap();
    let mut cfg = load_config(&temp, "p=1\nmoduleX.p=2\n");
    let x = StaticModule::new("moduleX");
    let y = StaticModule::new("moduleY");

    assert_eq!(cfg.require_integer(Some(&x), "p").unwrap(), 2);
    assert_eq!(cfg.require_integer(Some(&y), "p").unwrap(), 1);
    assert_eq!(cfg.require_integer(None, "p").unwrap(), 1);
}

#[test]
fn test_module_default_applies_once_and_persists() {
    let temp = TempDir::new().unwrap();
    let mut cfg = load_config(&temp, "");
    let module = StaticModule::new("Rarefier").with_default("rarefier.max", "500");

    assert_eq!(cfg.require_integer(Some(&module), "rarefier.max").unwrap(), 500);
    assert_eq!(cfg.store().get("rarefier.max"), Some("500"));
    assert_eq!(cfg.require_integer(None, "rarefier.max").unwrap(), 500);
}

#[test]
fn test_require_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let mut cfg = load_config(&temp, "root=/data\nreport.dir=${root}/reports\n");

    let first = cfg.require_string(None, "report.dir").unwrap();
    let second = cfg.require_string(None, "report.dir").unwrap();
    assert_eq!(first, "/data/reports");
    assert_eq!(first, second);

    let used = cfg.module_used_properties();
    assert_eq!(used.len(), 1);
    assert_eq!(used["report.dir"].as_deref(), Some("/data/reports"));
}

#[test]
fn test_existing_file_in_single_file_directory() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("otu_table.tsv"), "id\tcount\n").unwrap();
    fs::write(data.join(".DS_Store"), "").unwrap();

    let mut cfg = load_config(&temp, &format!("input.file={}\n", data.display()));

    let file = cfg.require_existing_file(None, "input.file").unwrap();
    assert_eq!(file, data.join("otu_table.tsv"));
    // Substitution is persisted for later reads.
    assert_eq!(
        cfg.store().get("input.file"),
        data.join("otu_table.tsv").to_str()
    );

    let again = cfg.require_existing_file(None, "input.file").unwrap();
    assert_eq!(again, file);
    assert_eq!(cfg.module_used_properties().len(), 1);
}

#[test]
fn test_existing_file_rejects_directory_with_many_files() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("a.tsv"), "").unwrap();
    fs::write(data.join("b.tsv"), "").unwrap();

    let mut cfg = load_config(&temp, &format!("input.file={}\n", data.display()));
    let err = cfg.require_existing_file(None, "input.file").unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidPath);
    assert!(err.message.contains("must be FILE"));
}

#[test]
fn test_existing_path_must_exist() {
    let temp = TempDir::new().unwrap();
    let mut cfg = load_config(&temp, "input.file=/no/such/file.tsv\n");
    let err = cfg.get_existing_file(None, "input.file").unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidPath);
    assert_eq!(cfg.get_existing_file(None, "absent").unwrap(), None);
}

#[test]
fn test_existing_dir_is_written_back_absolute() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    fs::create_dir_all(&out).unwrap();
    let mut cfg = load_config(
        &temp,
        &format!("base={}\noutput.dir=${{base}}/./out\n", temp.path().display()),
    );

    let dir = cfg.require_existing_dir(None, "output.dir").unwrap();
    assert_eq!(dir, out);
    assert_eq!(
        cfg.store().get("output.dir"),
        out.to_str()
    );

    let file = temp.path().join("pipeline.properties");
    let mut cfg = load_config(&temp, &format!("output.dir={}\n", file.display()));
    let err = cfg.require_existing_dir(None, "output.dir").unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidPath);
    assert!(err.message.contains("must be DIRECTORY"));
}

#[test]
fn test_require_existing_dirs() {
    let temp = TempDir::new().unwrap();
    let a = temp.path().join("seqs_a");
    let b = temp.path().join("seqs_b");
    fs::create_dir_all(&a).unwrap();
    fs::create_dir_all(&b).unwrap();

    let mut cfg = load_config(
        &temp,
        &format!("input.dirPaths={}, {}\n", b.display(), a.display()),
    );
    let dirs = cfg.require_existing_dirs(None, "input.dirPaths").unwrap();
    assert_eq!(dirs, vec![a.clone(), b.clone()]);
    assert_eq!(
        cfg.get_list(None, "input.dirPaths").unwrap(),
        vec![
            a.to_string_lossy().to_string(),
            b.to_string_lossy().to_string()
        ]
    );

    let mut cfg = load_config(
        &temp,
        &format!("input.dirPaths={},/no/such/dir\n", a.display()),
    );
    let err = cfg.require_existing_dirs(None, "input.dirPaths").unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidPath);
}

#[test]
fn test_existing_file_list() {
    let temp = TempDir::new().unwrap();
    let r1 = temp.path().join("helper.R");
    let r2 = temp.path().join("plot.R");
    fs::write(&r1, "").unwrap();
    fs::write(&r2, "").unwrap();

    let mut cfg = load_config(
        &temp,
        &format!("genMod.resources={},{}\n", r1.display(), r2.display()),
    );
    assert_eq!(
        cfg.get_existing_file_list(None, "genMod.resources").unwrap(),
        vec![r1, r2]
    );
    assert!(cfg.get_existing_file_list(None, "absent").unwrap().is_empty());
}

#[test]
fn test_exe_and_params() {
    let temp = TempDir::new().unwrap();
    let mut cfg = load_config(
        &temp,
        "exe.vsearch=/opt/bin/vsearch\nvsearch.params=--threads 4\nplain=1\n",
    );

    assert_eq!(cfg.get_exe(None, "exe.vsearch").unwrap(), "/opt/bin/vsearch");
    assert_eq!(cfg.get_exe(None, "exe.Rscript").unwrap(), "Rscript");
    assert_eq!(
        cfg.get_exe_params(None, "vsearch.params").unwrap(),
        "--threads 4 "
    );
    assert_eq!(cfg.get_exe_params(None, "absent").unwrap(), "");

    let err = cfg.get_exe(None, "plain").unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidName);
}

#[test]
fn test_setters_update_reads() {
    let temp = TempDir::new().unwrap();
    let mut cfg = load_config(&temp, "a=1\n");

    cfg.set_property("a", "2");
    assert_eq!(cfg.require_integer(None, "a").unwrap(), 2);

    cfg.set_list_property("l", &["x", "y"]);
    assert_eq!(cfg.get_list(None, "l").unwrap(), vec!["x", "y"]);

    cfg.set_path_property("p", &PathBuf::from("/data/run"));
    assert_eq!(cfg.require_string(None, "p").unwrap(), "/data/run");
}
