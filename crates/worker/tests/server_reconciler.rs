mod common;

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use common::{observed, register_server, Scripted};
use helpdesk_core::snapshot::ServerObservation;
use helpdesk_core::status::ResourceStatus;
use helpdesk_db::repositories::ServerRepo;
use helpdesk_worker::error::ReconcileError;
use helpdesk_worker::reconcilers::ServerReconciler;
use sqlx::PgPool;

fn nine_am() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn outage_starts_then_accumulates_downtime(pool: PgPool) {
    register_server(&pool, "SRV1").await;
    let source = Scripted::new(vec![observed("SRV1", ResourceStatus::Offline)]);
    let reconciler = ServerReconciler::new(pool.clone(), source.clone());

    let first = reconciler.reconcile_at(nine_am()).await.unwrap();
    assert_eq!(first.servers.len(), 1);
    let srv = ServerRepo::find_by_name(&pool, "SRV1").await.unwrap().unwrap();
    assert_eq!(srv.status(), ResourceStatus::Offline);
    assert_eq!(srv.last_online, Some(nine_am()));
    assert_eq!(srv.downtime_minutes, 0);
    assert!(srv.back_online.is_none());

    reconciler
        .reconcile_at(nine_am() + Duration::minutes(10))
        .await
        .unwrap();
    let srv = ServerRepo::find_by_name(&pool, "SRV1").await.unwrap().unwrap();
    assert_eq!(srv.status(), ResourceStatus::Offline);
    assert_eq!(srv.last_online, Some(nine_am()));
    assert_eq!(srv.downtime_minutes, 10);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn recovery_resets_downtime_and_records_back_online(pool: PgPool) {
    register_server(&pool, "SRV1").await;
    let source = Scripted::new(vec![observed("SRV1", ResourceStatus::Offline)]);
    let reconciler = ServerReconciler::new(pool.clone(), source.clone());

    reconciler.reconcile_at(nine_am()).await.unwrap();
    reconciler
        .reconcile_at(nine_am() + Duration::minutes(25))
        .await
        .unwrap();

    source.set(vec![observed("SRV1", ResourceStatus::Online)]);
    reconciler
        .reconcile_at(nine_am() + Duration::minutes(30))
        .await
        .unwrap();

    let srv = ServerRepo::find_by_name(&pool, "SRV1").await.unwrap().unwrap();
    assert_eq!(srv.status(), ResourceStatus::Online);
    assert_eq!(srv.downtime_minutes, 0);
    assert_eq!(srv.back_online, Some(nine_am()));
    assert_eq!(srv.last_online, Some(nine_am()));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeated_online_snapshot_is_idempotent(pool: PgPool) {
    register_server(&pool, "SRV1").await;
    let source = Scripted::new(vec![observed("SRV1", ResourceStatus::Online)]);
    let reconciler = ServerReconciler::new(pool.clone(), source);

    reconciler.reconcile_at(nine_am()).await.unwrap();
    let before = ServerRepo::find_by_name(&pool, "SRV1").await.unwrap().unwrap();
    reconciler
        .reconcile_at(nine_am() + Duration::minutes(5))
        .await
        .unwrap();
    let after = ServerRepo::find_by_name(&pool, "SRV1").await.unwrap().unwrap();

    assert_eq!(after.status(), before.status());
    assert_eq!(after.downtime_minutes, before.downtime_minutes);
    assert_eq!(after.last_online, before.last_online);
    assert_eq!(after.back_online, before.back_online);
    assert_eq!(after.share_service_status.as_deref(), Some("Running"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_server_is_skipped_not_created(pool: PgPool) {
    register_server(&pool, "SRV1").await;
    let source = Scripted::new(vec![
        observed("SRV1", ResourceStatus::Offline),
        observed("GHOST", ResourceStatus::Online),
    ]);
    let reconciler = ServerReconciler::new(pool.clone(), source);

    let report = reconciler.reconcile_at(nine_am()).await.unwrap();

    assert_eq!(report.servers.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].name, "GHOST");
    assert_eq!(ServerRepo::list_names(&pool).await.unwrap(), vec!["SRV1"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_snapshot_leaves_servers_unchanged(pool: PgPool) {
    register_server(&pool, "SRV1").await;
    let source = Scripted::<Vec<ServerObservation>>::new(Vec::new());
    source.fail("expected server status list, got string");
    let reconciler = ServerReconciler::new(pool.clone(), source);

    let err = reconciler.reconcile_at(nine_am()).await.unwrap_err();
    assert_matches!(err, ReconcileError::Snapshot(_));

    let srv = ServerRepo::find_by_name(&pool, "SRV1").await.unwrap().unwrap();
    assert_eq!(srv.status(), ResourceStatus::Online);
    assert!(srv.last_online.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn no_registered_servers_skips_the_snapshot(pool: PgPool) {
    let source = Scripted::<Vec<ServerObservation>>::new(Vec::new());
    source.fail("must not be called");
    let reconciler = ServerReconciler::new(pool, source);

    let report = reconciler.reconcile_at(nine_am()).await.unwrap();
    assert!(report.servers.is_empty());
    assert!(report.skipped.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeated_offline_snapshot_at_same_time_is_idempotent(pool: PgPool) {
    register_server(&pool, "SRV1").await;
    let source = Scripted::new(vec![observed("SRV1", ResourceStatus::Offline)]);
    let reconciler = ServerReconciler::new(pool.clone(), source);

    reconciler.reconcile_at(nine_am()).await.unwrap();
    let before = ServerRepo::find_by_name(&pool, "SRV1").await.unwrap().unwrap();
    reconciler.reconcile_at(nine_am()).await.unwrap();
    let mut after = ServerRepo::find_by_name(&pool, "SRV1").await.unwrap().unwrap();

    after.updated_at = before.updated_at;
    assert_eq!(after, before);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_write_rolls_back_the_whole_run(pool: PgPool) {
    register_server(&pool, "SRV1").await;
    register_server(&pool, "SRV2").await;
    sqlx::query(
        "CREATE FUNCTION reject_srv2_update() RETURNS trigger LANGUAGE plpgsql AS $$ \
         BEGIN \
             IF NEW.name = 'SRV2' THEN RAISE EXCEPTION 'write rejected for SRV2'; END IF; \
             RETURN NEW; \
         END $$",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TRIGGER reject_srv2_update BEFORE UPDATE ON servers \
         FOR EACH ROW EXECUTE FUNCTION reject_srv2_update()",
    )
    .execute(&pool)
    .await
    .unwrap();

    let source = Scripted::new(vec![
        observed("SRV1", ResourceStatus::Offline),
        observed("SRV2", ResourceStatus::Offline),
    ]);
    let reconciler = ServerReconciler::new(pool.clone(), source);

    let err = reconciler.reconcile_at(nine_am()).await.unwrap_err();
    assert_matches!(err, ReconcileError::Database(_));

    let srv1 = ServerRepo::find_by_name(&pool, "SRV1").await.unwrap().unwrap();
    assert_eq!(srv1.status(), ResourceStatus::Online);
    assert!(srv1.last_online.is_none());
    assert!(srv1.share_service_status.is_none());
}
