use pxr_reconcile::{reconcile, Action, Affected, DesiredState, ReconcileOptions};
use pxr_schemas::{PersistenceLayer, RecordDescriptor, GLOBAL_VARIABLES};
use pxr_testkit::{cell, InMemoryAdmin};

fn max_connections(value: &str) -> RecordDescriptor {
    RecordDescriptor::builder(&GLOBAL_VARIABLES)
        .field("variable_name", "mysql-max_connections")
        .field("variable_value", value)
        .build()
        .unwrap()
}

#[tokio::test]
async fn scenario_second_identical_call_is_a_noop() {
    let admin = InMemoryAdmin::new();
    admin
        .seed(
            "global_variables",
            &[
                ("variable_name", "mysql-max_connections"),
                ("variable_value", "2000"),
            ],
        )
        .unwrap();
    let desired = max_connections("4096");
    let opts = ReconcileOptions::default();

    let first = reconcile(&admin, &desired, DesiredState::Present, &opts)
        .await
        .unwrap();
    assert_eq!(first.action, Action::Update);
    assert!(first.changed);
    let Some(Affected::One(row)) = &first.affected else {
        panic!("expected the post-update row, got {:?}", first.affected);
    };
    assert_eq!(cell(row, "variable_value").as_deref(), Some("4096"));
    assert_eq!(
        first.propagated,
        vec![
            "SAVE MYSQL VARIABLES TO DISK",
            "LOAD MYSQL VARIABLES TO RUNTIME"
        ]
    );
    let after_first = admin.rows("global_variables");

    let second = reconcile(&admin, &desired, DesiredState::Present, &opts)
        .await
        .unwrap();
    assert_eq!(second.action, Action::Noop);
    assert!(!second.changed);
    assert!(second.propagated.is_empty());
    assert_eq!(admin.rows("global_variables"), after_first);
    assert_eq!(admin.mutation_count(), 1);
}

#[tokio::test]
async fn scenario_update_reaches_disk_and_runtime() {
    let admin = InMemoryAdmin::with_proxysql_defaults().unwrap();
    let desired = max_connections("4096");

    reconcile(
        &admin,
        &desired,
        DesiredState::Present,
        &ReconcileOptions::default(),
    )
    .await
    .unwrap();

    for layer in [PersistenceLayer::Disk, PersistenceLayer::Runtime] {
        let value = admin
            .layer_rows(layer, "global_variables")
            .into_iter()
            .find(|r| cell(r, "variable_name").as_deref() == Some("mysql-max_connections"))
            .and_then(|r| cell(&r, "variable_value"));
        assert_eq!(value.as_deref(), Some("4096"), "{layer}");
    }
}
