use std::collections::HashMap;
use std::fs;

use logdeck::config::{CommandLine, ConfigError, FileConfig};

fn substitutions(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[test_timeout::timeout]
fn json_config_with_placeholders() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("deck.json");
    fs::write(
        &path,
        r#"{
            "logs": [
                {
                    "title": "api",
                    "command": "kubectl logs -f ${pod} -n ${namespace}",
                    "entry_pattern": "^\\d{4}-\\d{2}-\\d{2}"
                },
                {
                    "title": "worker",
                    "command": ["tail", "-F", "${dir}/worker.log"],
                    "entry_pattern": "^\\["
                }
            ],
            "ui": { "list_percent": 40 }
        }"#,
    )
    .expect("write config");

    let config = FileConfig::load(&path)
        .expect("load")
        .compile(&substitutions(&[
            ("pod", "api-7f9"),
            ("namespace", "prod"),
            ("dir", "/var/log"),
        ]))
        .expect("compile");

    assert_eq!(config.sources.len(), 2);
    assert_eq!(
        config.sources[0].argv,
        vec!["kubectl", "logs", "-f", "api-7f9", "-n", "prod"]
    );
    assert_eq!(config.sources[1].argv, vec!["tail", "-F", "/var/log/worker.log"]);
    assert!(config.sources[0].entry_pattern.is_match("2026-10-19 12:00:00 INFO up"));
    assert_eq!(config.ui.list_percent, 40);
    assert!(config.ui.wrap_rows);
}

#[test_timeout::timeout]
fn toml_config_by_extension() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("deck.toml");
    fs::write(
        &path,
        r#"
[ui]
wrap_rows = false

[[logs]]
title = "syslog"
command = ["journalctl", "-f", "-u", "${unit}"]
entry_pattern = '^\w{3} \d+'
"#,
    )
    .expect("write config");

    let file = FileConfig::load(&path).expect("load");
    assert!(matches!(file.logs[0].command, CommandLine::Argv(_)));
    let config = file
        .compile(&substitutions(&[("unit", "nginx")]))
        .expect("compile");
    assert_eq!(config.sources[0].argv, vec!["journalctl", "-f", "-u", "nginx"]);
    assert!(!config.ui.wrap_rows);
}

#[test_timeout::timeout]
fn unknown_placeholders_are_left_alone() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("deck.json");
    fs::write(
        &path,
        r#"{"logs": [{"title": "t", "command": "echo ${missing}", "entry_pattern": "."}]}"#,
    )
    .expect("write config");
    let config = FileConfig::load(&path)
        .expect("load")
        .compile(&HashMap::new())
        .expect("compile");
    assert_eq!(config.sources[0].argv, vec!["echo", "${missing}"]);
}

#[test_timeout::timeout]
fn load_errors_name_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");

    let missing = dir.path().join("absent.json");
    let err = FileConfig::load(&missing).expect_err("missing file");
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("absent.json"));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ not json").expect("write");
    let err = FileConfig::load(&broken).expect_err("bad json");
    assert!(matches!(err, ConfigError::Json { .. }));

    let broken = dir.path().join("broken.toml");
    fs::write(&broken, "[[logs]\n").expect("write");
    let err = FileConfig::load(&broken).expect_err("bad toml");
    assert!(matches!(err, ConfigError::Toml { .. }));
}

#[test_timeout::timeout]
fn bad_pattern_is_a_startup_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("deck.json");
    fs::write(
        &path,
        r#"{"logs": [{"title": "api", "command": "cat", "entry_pattern": "[unclosed"}]}"#,
    )
    .expect("write config");
    let err = FileConfig::load(&path)
        .expect("load")
        .compile(&HashMap::new())
        .expect_err("invalid pattern");
    assert!(err.to_string().contains("`api`"), "{err}");
}
