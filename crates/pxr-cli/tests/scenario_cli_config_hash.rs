use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

const BASE: &str = r#"
admin:
  host: "127.0.0.1"
  port: 6032
  password_env: "PROXYSQL_ADMIN_PASSWORD"
"#;

const SITE: &str = r#"
admin:
  port: 16032
legacy:
  enabled: true
"#;

fn hash_of(paths: &[&std::path::Path]) -> Value {
    let out = Command::cargo_bin("pxr")
        .unwrap()
        .env("RUST_LOG", "off")
        .arg("config-hash")
        .args(paths)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_slice(&out.stdout).unwrap()
}

#[test]
fn config_hash_merges_layers_and_reports_unused_keys() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let site = dir.path().join("site.yaml");
    std::fs::write(&base, BASE).unwrap();
    std::fs::write(&site, SITE).unwrap();

    let body = hash_of(&[&base, &site]);
    assert_eq!(body["config_hash"].as_str().unwrap().len(), 64);
    assert_eq!(body["config"]["admin"]["port"], 16032);
    assert_eq!(body["config"]["admin"]["host"], "127.0.0.1");
    assert_eq!(body["unused_keys"], serde_json::json!(["/legacy/enabled"]));

    let again = hash_of(&[&base, &site]);
    assert_eq!(body["config_hash"], again["config_hash"]);

    let base_only = hash_of(&[&base]);
    assert_ne!(body["config_hash"], base_only["config_hash"]);
}

#[test]
fn config_hash_rejects_secret_literals() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.yaml");
    std::fs::write(&bad, "admin:\n  password: radmin\n").unwrap();

    Command::cargo_bin("pxr")
        .unwrap()
        .env("RUST_LOG", "off")
        .arg("config-hash")
        .arg(&bad)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"failed\":true"))
        .stdout(predicate::str::contains("CONFIG_SECRET_DETECTED"))
        .stderr(predicate::str::contains("CONFIG_SECRET_DETECTED"));
}

#[test]
fn help_lists_every_command() {
    Command::cargo_bin("pxr")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("variable")
                .and(predicate::str::contains("user"))
                .and(predicate::str::contains("server"))
                .and(predicate::str::contains("schedule"))
                .and(predicate::str::contains("transfer"))
                .and(predicate::str::contains("config-hash")),
        );
}
