//! Bad requests are rejected before any connection is attempted.
//!
//! The login points at a port nothing listens on; every case must still fail
//! with its own validation message, not a connect error. The connect cases at
//! the end check what that dead port does produce.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn pxr() -> Command {
    let mut cmd = Command::cargo_bin("pxr").unwrap();
    cmd.env_remove("PXR_ADMIN_HOST")
        .env_remove("PXR_ADMIN_PORT")
        .env_remove("PXR_ADMIN_USER")
        .env_remove("PXR_ADMIN_PASSWORD")
        .env("RUST_LOG", "off")
        .args(["--login-host", "127.0.0.1", "--login-port", "1"]);
    cmd
}

fn failure_json(out: &std::process::Output) -> Value {
    serde_json::from_slice(&out.stdout).expect("stdout must be a single JSON document")
}

#[test]
fn schedule_interval_out_of_range() {
    let out = pxr()
        .args([
            "schedule",
            "--filename",
            "/usr/bin/check.sh",
            "--interval-ms",
            "50",
        ])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    let body = failure_json(&out);
    assert_eq!(body["failed"], true);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    let msg = body["msg"].as_str().unwrap();
    assert!(
        msg.contains("interval_ms must be between 100 and 100000000"),
        "got: {msg}"
    );
    assert!(String::from_utf8_lossy(&out.stderr).contains("interval_ms"));
}

#[test]
fn server_port_out_of_range() {
    pxr()
        .args(["server", "--hostname", "db1", "--port", "70000"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"failed\":true"))
        .stdout(predicate::str::contains("port must be between 0 and 65535"));
}

#[test]
fn clearing_a_non_nullable_field() {
    pxr()
        .args(["user", "--username", "app", "--clear", "active"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("cannot be set to null"));
}

#[test]
fn missing_password_env_is_named() {
    pxr()
        .env_remove("PXR_TEST_UNSET_PASSWORD")
        .args([
            "user",
            "--username",
            "app",
            "--password-env",
            "PXR_TEST_UNSET_PASSWORD",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("PXR_TEST_UNSET_PASSWORD"));
}

#[test]
fn illegal_transfer_is_rejected() {
    let out = pxr()
        .args([
            "transfer",
            "--action",
            "save",
            "--direction",
            "to",
            "--layer",
            "config",
            "--family",
            "mysql users",
        ])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    let body = failure_json(&out);
    assert_eq!(
        body["msg"],
        "VALIDATION_ERROR: Neither the action \"SAVE\" nor the direction \"TO\" are a valid combination with the CONFIG layer"
    );
}

#[test]
fn login_port_out_of_range_fails_before_connecting() {
    let mut cmd = Command::cargo_bin("pxr").unwrap();
    cmd.env("RUST_LOG", "off")
        .args([
            "variable",
            "--name",
            "mysql-threads",
            "--login-port",
            "70000",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("outside 0..=65535"))
        .stdout(predicate::str::contains("stage=connect").not());
}

#[test]
fn unreachable_admin_is_a_connect_store_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("pxr.yaml");
    std::fs::write(&cfg, "admin:\n  connect_timeout_ms: 500\n").unwrap();

    let out = pxr()
        .args(["--config", cfg.to_str().unwrap()])
        .args(["variable", "--name", "mysql-threads"])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    let body = failure_json(&out);
    assert_eq!(body["error"], "STORE_ERROR");
    assert!(body["msg"].as_str().unwrap().contains("stage=connect"));
}

#[test]
fn refused_connection_fails_fast_with_the_socket_error() {
    let started = std::time::Instant::now();
    let out = pxr()
        .args(["variable", "--name", "mysql-threads"])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(
        started.elapsed() < std::time::Duration::from_secs(10),
        "took {:?}",
        started.elapsed()
    );
    let body = failure_json(&out);
    assert_eq!(body["error"], "STORE_ERROR");
    let msg = body["msg"].as_str().unwrap();
    assert!(msg.contains("stage=connect"), "got: {msg}");
    assert!(msg.to_lowercase().contains("refused"), "got: {msg}");
}

#[test]
fn dry_run_transfer_lists_commands_without_connecting() {
    let out = pxr()
        .args([
            "transfer",
            "--action",
            "load",
            "--direction",
            "to",
            "--layer",
            "runtime",
            "--family",
            "mysql users",
            "--family",
            "scheduler",
            "--dry-run",
        ])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(0));
    let body: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(body["changed"], true);
    assert_eq!(body["dry_run"], true);
    assert_eq!(
        body["commands"],
        serde_json::json!(["LOAD MYSQL USERS TO RUNTIME", "LOAD SCHEDULER TO RUNTIME"])
    );
}
