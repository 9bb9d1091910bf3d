//! Credential file < YAML < environment < flags.

use std::collections::BTreeMap;
use std::time::Duration;

use pxr_config::{load_layered_yaml_from_strings, resolve_admin_target, AdminOverrides};

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| map.get(name).cloned()
}

#[test]
fn credential_file_fills_login_when_nothing_else_does() {
    let dir = tempfile::tempdir().unwrap();
    let cnf = dir.path().join("admin.cnf");
    std::fs::write(&cnf, "[client]\nuser=radmin\npassword=radmin\n").unwrap();

    let flags = AdminOverrides {
        credentials_file: Some(cnf),
        ..AdminOverrides::default()
    };
    let t = resolve_admin_target(&serde_json_empty(), &flags, env_of(&[])).unwrap();
    assert_eq!(t.user.as_deref(), Some("radmin"));
    assert_eq!(t.password.as_deref(), Some("radmin"));
}

#[test]
fn yaml_and_env_override_credential_file() {
    let dir = tempfile::tempdir().unwrap();
    let cnf = dir.path().join("admin.cnf");
    std::fs::write(&cnf, "[client]\nuser=file_user\npassword=file_pw\n").unwrap();

    let yaml = format!(
        "admin:\n  user: yaml_user\n  credentials_file: \"{}\"\n  connect_timeout_ms: 1500\n",
        cnf.display()
    );
    let loaded = load_layered_yaml_from_strings(&[yaml.as_str()]).unwrap();

    let t = resolve_admin_target(
        &loaded.config_json,
        &AdminOverrides::default(),
        env_of(&[("PXR_ADMIN_PASSWORD", "env_pw")]),
    )
    .unwrap();
    assert_eq!(t.user.as_deref(), Some("yaml_user"));
    assert_eq!(t.password.as_deref(), Some("env_pw"));
    assert_eq!(t.connect_timeout, Duration::from_millis(1500));
}

#[test]
fn unreadable_credential_file_is_an_error() {
    let flags = AdminOverrides {
        credentials_file: Some("/nonexistent/admin.cnf".into()),
        ..AdminOverrides::default()
    };
    let err = resolve_admin_target(&serde_json_empty(), &flags, env_of(&[])).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/admin.cnf"));
}

#[test]
fn unix_socket_flag_changes_the_address() {
    let flags = AdminOverrides {
        unix_socket: Some("/tmp/proxysql_admin.sock".into()),
        ..AdminOverrides::default()
    };
    let t = resolve_admin_target(&serde_json_empty(), &flags, env_of(&[])).unwrap();
    assert_eq!(t.address(), "/tmp/proxysql_admin.sock");
}

fn serde_json_empty() -> serde_json::Value {
    load_layered_yaml_from_strings(&[]).unwrap().config_json
}
