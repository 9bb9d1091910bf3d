use pxr_reconcile::{ensure_absent, Action, Affected, ReconcileError, ReconcileOptions};
use pxr_schemas::{RecordDescriptor, SCHEDULER};
use pxr_testkit::InMemoryAdmin;

fn two_identical_schedules() -> InMemoryAdmin {
    let admin = InMemoryAdmin::new();
    for _ in 0..2 {
        admin
            .seed("scheduler", &[("filename", "/usr/bin/purge.sh")])
            .unwrap();
    }
    admin
}

fn purge() -> RecordDescriptor {
    RecordDescriptor::builder(&SCHEDULER)
        .field("filename", "/usr/bin/purge.sh")
        .build()
        .unwrap()
}

#[tokio::test]
async fn scenario_ambiguous_delete_is_rejected_without_override() {
    let admin = two_identical_schedules();

    let err = ensure_absent(&admin, &purge(), &ReconcileOptions::default())
        .await
        .unwrap_err();
    match &err {
        ReconcileError::Cardinality { matched, message } => {
            assert_eq!(*matched, 2);
            assert_eq!(
                message,
                "Operation would delete multiple records use force_delete to override this"
            );
        }
        other => panic!("expected cardinality error, got {other:?}"),
    }
    assert!(err.to_string().starts_with("CARDINALITY_ERROR"));
    assert_eq!(admin.rows("scheduler").len(), 2);
    assert_eq!(admin.mutation_count(), 0);
    assert!(admin.admin_commands().is_empty());
}

#[tokio::test]
async fn scenario_force_delete_removes_every_match() {
    let admin = two_identical_schedules();
    let opts = ReconcileOptions {
        force_delete: true,
        ..ReconcileOptions::default()
    };

    let out = ensure_absent(&admin, &purge(), &opts).await.unwrap();
    assert_eq!(out.action, Action::Delete);
    assert!(out.changed);
    assert_eq!(out.rows_affected, 2);
    assert!(matches!(&out.affected, Some(Affected::Many(rows)) if rows.len() == 2));
    assert!(admin.rows("scheduler").is_empty());
    assert_eq!(
        admin.admin_commands(),
        vec!["SAVE SCHEDULER TO DISK", "LOAD SCHEDULER TO RUNTIME"]
    );
}

#[tokio::test]
async fn scenario_single_match_deletes_without_override() {
    let admin = InMemoryAdmin::new();
    admin
        .seed("scheduler", &[("filename", "/usr/bin/purge.sh")])
        .unwrap();
    admin
        .seed("scheduler", &[("filename", "/usr/bin/vacuum.sh")])
        .unwrap();

    let out = ensure_absent(&admin, &purge(), &ReconcileOptions::default())
        .await
        .unwrap();
    assert_eq!(out.rows_affected, 1);
    assert_eq!(out.msg, "Deleted schedule from scheduler");
    assert_eq!(admin.rows("scheduler").len(), 1);

    let again = ensure_absent(&admin, &purge(), &ReconcileOptions::default())
        .await
        .unwrap();
    assert_eq!(again.action, Action::Noop);
    assert!(!again.changed);
}

#[tokio::test]
async fn scenario_dry_run_forced_delete_reports_without_deleting() {
    let admin = two_identical_schedules();
    let opts = ReconcileOptions {
        dry_run: true,
        force_delete: true,
        ..ReconcileOptions::default()
    };

    let out = ensure_absent(&admin, &purge(), &opts).await.unwrap();
    assert_eq!(out.action, Action::Delete);
    assert!(out.changed);
    assert!(out.dry_run);
    assert_eq!(out.rows_affected, 0);
    assert_eq!(admin.mutation_count(), 0);
    assert!(admin.admin_commands().is_empty());
    assert_eq!(admin.rows("scheduler").len(), 2);
}

#[tokio::test]
async fn scenario_dry_run_does_not_bypass_cardinality_guard() {
    let admin = two_identical_schedules();
    let opts = ReconcileOptions {
        dry_run: true,
        ..ReconcileOptions::default()
    };

    let err = ensure_absent(&admin, &purge(), &opts).await.unwrap_err();
    assert!(
        matches!(err, ReconcileError::Cardinality { matched: 2, .. }),
        "got {err:?}"
    );
    assert_eq!(admin.mutation_count(), 0);
    assert_eq!(admin.rows("scheduler").len(), 2);
}
