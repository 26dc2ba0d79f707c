//! CLI integration tests: spawn the built binary and inspect its
//! `check-config` behavior, the one subcommand that needs neither a
//! database nor a transport to exercise end to end.

use std::path::PathBuf;
use std::process::Command;

use dementia_infrastructure::config::AppConfig;

fn dementia_bin() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_dementia") {
        return PathBuf::from(path);
    }
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let debug_path = PathBuf::from(manifest_dir).join("../../target/debug/dementia");
    if debug_path.exists() {
        return debug_path;
    }
    panic!("dementia binary not found. Checked CARGO_BIN_EXE_dementia and target/debug/dementia from {manifest_dir}");
}

#[test]
fn check_config_prints_the_default_configuration_as_json() {
    let output = Command::new(dementia_bin())
        .arg("check-config")
        .output()
        .expect("spawn dementia check-config");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("check-config stdout is valid JSON");
    assert_eq!(parsed["database"]["min_connections"], 2);
    assert_eq!(parsed["session"]["idle_cutoff_secs"], 7200);
    assert_eq!(parsed["server"]["transport"], "stdio");
}

#[test]
fn check_config_rejects_a_file_with_max_below_min_connections() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("bad.toml");
    std::fs::write(
        &config_path,
        r#"
[database]
url = "postgres://localhost/dementia"
min_connections = 10
max_connections = 1
statement_timeout_secs = 30

[session]
idle_cutoff_secs = 7200
"#,
    )
    .expect("write fixture config");

    let output = Command::new(dementia_bin())
        .arg("check-config")
        .arg("--config")
        .arg(&config_path)
        .output()
        .expect("spawn dementia check-config");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("max_connections"), "stderr: {stderr}");
}

#[test]
fn check_config_honors_an_overriding_toml_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("custom.toml");
    std::fs::write(
        &config_path,
        r#"
[session]
idle_cutoff_secs = 60

[server]
transport = "http"
http_addr = "127.0.0.1:9999"
"#,
    )
    .expect("write fixture config");

    let output = Command::new(dementia_bin())
        .arg("check-config")
        .arg("--config")
        .arg(&config_path)
        .output()
        .expect("spawn dementia check-config");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("check-config stdout is valid JSON");
    assert_eq!(parsed["session"]["idle_cutoff_secs"], 60);
    assert_eq!(parsed["server"]["transport"], "http");
    assert_eq!(parsed["server"]["http_addr"], "127.0.0.1:9999");
}

#[test]
fn idle_cutoff_converts_seconds_into_a_chrono_duration() {
    let config = AppConfig::load(None).expect("default config loads");
    assert_eq!(config.idle_cutoff(), chrono::Duration::seconds(7200));
}
