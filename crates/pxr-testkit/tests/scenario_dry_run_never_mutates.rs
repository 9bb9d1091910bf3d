use pxr_reconcile::{reconcile, Action, DesiredState, ReconcileOptions};
use pxr_schemas::{RecordDescriptor, GLOBAL_VARIABLES, MYSQL_USERS, SCHEDULER};
use pxr_testkit::InMemoryAdmin;

fn store() -> InMemoryAdmin {
    let admin = InMemoryAdmin::with_proxysql_defaults().unwrap();
    admin
        .seed("mysql_users", &[("username", "reporting"), ("password", "x")])
        .unwrap();
    admin
}

fn dry() -> ReconcileOptions {
    ReconcileOptions {
        dry_run: true,
        ..ReconcileOptions::default()
    }
}

fn cases() -> Vec<(&'static str, RecordDescriptor, DesiredState, Action)> {
    let new_user = RecordDescriptor::builder(&MYSQL_USERS)
        .field("username", "app")
        .field("password", "pw")
        .build()
        .unwrap();
    let threads = RecordDescriptor::builder(&GLOBAL_VARIABLES)
        .field("variable_name", "mysql-threads")
        .field("variable_value", "16")
        .build()
        .unwrap();
    let reporting = RecordDescriptor::builder(&MYSQL_USERS)
        .field("username", "reporting")
        .build()
        .unwrap();
    let nightly = RecordDescriptor::builder(&SCHEDULER)
        .field("filename", "/usr/bin/backup.sh")
        .field("interval_ms", 60_000i64)
        .build()
        .unwrap();
    vec![
        ("create", new_user, DesiredState::Present, Action::Create),
        ("schedule create", nightly, DesiredState::Present, Action::Create),
        ("update", threads, DesiredState::Present, Action::Update),
        ("delete", reporting.clone(), DesiredState::Absent, Action::Delete),
        ("noop", reporting, DesiredState::Present, Action::Noop),
    ]
}

#[tokio::test]
async fn scenario_dry_run_reports_live_decision_without_writing() {
    for (label, desired, state, expected) in cases() {
        let admin = store();
        let before_users = admin.rows("mysql_users");
        let before_vars = admin.rows("global_variables");
        let before_jobs = admin.rows("scheduler");

        let simulated = reconcile(&admin, &desired, state, &dry()).await.unwrap();
        assert_eq!(simulated.action, expected, "{label}");
        assert!(simulated.dry_run, "{label}");
        assert_eq!(admin.mutation_count(), 0, "{label}");
        assert!(admin.admin_commands().is_empty(), "{label}");
        assert_eq!(admin.rows("mysql_users"), before_users, "{label}");
        assert_eq!(admin.rows("global_variables"), before_vars, "{label}");
        assert_eq!(admin.rows("scheduler"), before_jobs, "{label}");

        // A live run against an identical store reports the same `changed`.
        let live_admin = store();
        let live = reconcile(&live_admin, &desired, state, &ReconcileOptions::default())
            .await
            .unwrap();
        assert_eq!(live.action, simulated.action, "{label}");
        assert_eq!(live.changed, simulated.changed, "{label}");
    }
}

#[tokio::test]
async fn scenario_dry_run_message_says_so() {
    let admin = store();
    let (_, desired, state, _) = cases().remove(0);
    let out = reconcile(&admin, &desired, state, &dry()).await.unwrap();
    assert_eq!(
        out.msg,
        "User would have been added to mysql_users, however dry run is enabled."
    );
    assert!(out.affected.is_none());
}
