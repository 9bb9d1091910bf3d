use pxr_config::{load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy};

const YAML: &str = r#"
admin:
  host: "127.0.0.1"
  port: 6032
  hostname: "typo"
propagation:
  save_to_disk: false
extra:
  b: 2
  a: 1
"#;

#[test]
fn warn_mode_reports_unused_keys_without_error() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert!(!report.is_clean());
    assert_eq!(
        report.unused_leaf_pointers,
        vec![
            "/admin/hostname".to_string(),
            "/extra/a".to_string(),
            "/extra/b".to_string(),
        ],
        "sorted, and /admin/host does not consume /admin/hostname"
    );
}

#[test]
fn fail_mode_errors_on_unused_keys() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let err = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("CONFIG_UNUSED_KEYS"), "got: {msg}");
    assert!(msg.contains("3 unused"), "got: {msg}");
}

#[test]
fn fully_consumed_config_is_clean_under_fail() {
    let yaml = r#"
admin:
  host: "127.0.0.1"
  port: 6032
  user: "radmin"
  password_env: "PROXYSQL_ADMIN_PASSWORD"
  connect_timeout_ms: 5000
propagation:
  save_to_disk: true
  load_to_runtime: false
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());
    assert!(report
        .consumed_prefixes
        .contains(&"/admin/password_env".to_string()));
}
