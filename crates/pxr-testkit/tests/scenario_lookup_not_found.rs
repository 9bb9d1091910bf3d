use pxr_reconcile::{lookup, reconcile, Action, Affected, DesiredState, ReconcileError, ReconcileOptions};
use pxr_schemas::{RecordDescriptor, GLOBAL_VARIABLES};
use pxr_testkit::{cell, InMemoryAdmin};

fn variable(name: &str) -> RecordDescriptor {
    RecordDescriptor::builder(&GLOBAL_VARIABLES)
        .field("variable_name", name)
        .build()
        .unwrap()
}

#[tokio::test]
async fn scenario_variable_without_value_is_read_only_lookup() {
    let admin = InMemoryAdmin::with_proxysql_defaults().unwrap();

    let out = reconcile(
        &admin,
        &variable("mysql-threads"),
        DesiredState::Present,
        &ReconcileOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(out.action, Action::Noop);
    assert!(!out.changed);
    let Some(Affected::One(row)) = &out.affected else {
        panic!("lookup must echo the row");
    };
    assert_eq!(cell(row, "variable_value").as_deref(), Some("4"));
    assert_eq!(admin.mutation_count(), 0);
    assert!(admin.admin_commands().is_empty());
}

#[tokio::test]
async fn scenario_unknown_variable_is_not_found() {
    let admin = InMemoryAdmin::with_proxysql_defaults().unwrap();

    let err = lookup(&admin, &variable("mysql-bogus")).await.unwrap_err();
    assert_eq!(
        err,
        ReconcileError::NotFound {
            message: "The variable \"mysql-bogus\" was not found".to_string()
        }
    );
}

#[tokio::test]
async fn scenario_setting_unknown_variable_never_inserts() {
    let admin = InMemoryAdmin::with_proxysql_defaults().unwrap();
    let desired = RecordDescriptor::builder(&GLOBAL_VARIABLES)
        .field("variable_name", "mysql-bogus")
        .field("variable_value", "1")
        .build()
        .unwrap();

    let err = reconcile(
        &admin,
        &desired,
        DesiredState::Present,
        &ReconcileOptions::default(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
    assert_eq!(admin.mutation_count(), 0);
}
