mod common;

use assert_matches::assert_matches;
use common::{topology, FakeProbe, Scripted};
use helpdesk_core::snapshot::DomainTopology;
use helpdesk_core::status::{ControllerRole, ResourceStatus};
use helpdesk_db::repositories::DomainControllerRepo;
use helpdesk_worker::error::ReconcileError;
use helpdesk_worker::reconcilers::DomainReconciler;
use sqlx::PgPool;

type Reconciler = DomainReconciler<Scripted<DomainTopology>, FakeProbe>;

fn reconciler(pool: &PgPool) -> (Reconciler, Scripted<DomainTopology>, FakeProbe) {
    let source = Scripted::new(topology("corp.example", &["DC1", "DC2", "DC3"], "DC1", "DC2"));
    let probe = FakeProbe::default();
    let reconciler = DomainReconciler::new(pool.clone(), source.clone(), probe.clone(), 4);
    (reconciler, source, probe)
}

async fn statuses(pool: &PgPool) -> Vec<(String, ResourceStatus)> {
    DomainControllerRepo::list(pool)
        .await
        .unwrap()
        .into_iter()
        .map(|c| {
            let status = c.status();
            (c.name, status)
        })
        .collect()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn discovery_assigns_exactly_one_pdc_and_ddc(pool: PgPool) {
    let (reconciler, _, _) = reconciler(&pool);

    let report = reconciler.discover().await.unwrap();
    assert_eq!(report.controllers, 3);

    let controllers = DomainControllerRepo::list(&pool).await.unwrap();
    let roles: Vec<_> = controllers.iter().map(|c| (c.name.as_str(), c.role())).collect();
    assert_eq!(
        roles,
        vec![
            ("DC1", ControllerRole::Pdc),
            ("DC2", ControllerRole::Ddc),
            ("DC3", ControllerRole::Other),
        ]
    );
    assert!(controllers.iter().all(|c| c.status() == ResourceStatus::Offline));

    let domain = DomainControllerRepo::find_current_domain(&pool).await.unwrap().unwrap();
    assert_eq!(domain.domain_name, "corp.example");
    assert_eq!(domain.pdc_name.as_deref(), Some("DC1"));
    assert_eq!(domain.ddc_name.as_deref(), Some("DC2"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rediscovery_drops_stale_and_keeps_surviving_status(pool: PgPool) {
    let (reconciler, source, probe) = reconciler(&pool);
    reconciler.discover().await.unwrap();
    probe.reachable("DC1", true);
    probe.reachable("DC2", true);
    reconciler.probe_liveness().await.unwrap();

    source.set(topology("corp.example", &["DC1", "DC2", "DC4"], "DC2", "DC1"));
    reconciler.discover().await.unwrap();

    assert_eq!(
        statuses(&pool).await,
        vec![
            ("DC2".to_string(), ResourceStatus::Online),
            ("DC1".to_string(), ResourceStatus::Online),
            ("DC4".to_string(), ResourceStatus::Offline),
        ]
    );
    let domain = reconciler.current_domain().await.unwrap().unwrap();
    assert_eq!(domain.pdc_name.as_deref(), Some("DC2"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_discovery_keeps_previous_topology(pool: PgPool) {
    let (reconciler, source, _) = reconciler(&pool);
    reconciler.discover().await.unwrap();

    source.fail("topology names a PDC that is not among the controllers");
    let err = reconciler.discover().await.unwrap_err();

    assert_matches!(err, ReconcileError::Snapshot(_));
    assert_eq!(
        DomainControllerRepo::list_names(&pool).await.unwrap(),
        vec!["DC1", "DC2", "DC3"]
    );
    let domain = DomainControllerRepo::find_current_domain(&pool).await.unwrap().unwrap();
    assert_eq!(domain.pdc_name.as_deref(), Some("DC1"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failing_probe_affects_only_its_controller(pool: PgPool) {
    let (reconciler, _, probe) = reconciler(&pool);
    reconciler.discover().await.unwrap();
    probe.broken("DC1");
    probe.reachable("DC2", true);
    probe.reachable("DC3", false);

    let report = reconciler.probe_liveness().await.unwrap();

    assert_eq!(report.online, 1);
    assert_eq!(report.offline, 2);
    assert_eq!(report.probe_failures, 1);
    assert_eq!(report.write_failures, 0);
    assert_eq!(
        statuses(&pool).await,
        vec![
            ("DC1".to_string(), ResourceStatus::Offline),
            ("DC2".to_string(), ResourceStatus::Online),
            ("DC3".to_string(), ResourceStatus::Offline),
        ]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn liveness_with_no_controllers_is_a_no_op(pool: PgPool) {
    let (reconciler, _, _) = reconciler(&pool);
    let report = reconciler.probe_liveness().await.unwrap();
    assert_eq!(report, Default::default());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalidated_cache_reloads_from_database(pool: PgPool) {
    let (reconciler, _, _) = reconciler(&pool);
    assert!(reconciler.current_domain().await.unwrap().is_none());

    reconciler.discover().await.unwrap();
    sqlx::query("UPDATE current_domain SET domain_name = 'renamed.example'")
        .execute(&pool)
        .await
        .unwrap();

    let cached = reconciler.current_domain().await.unwrap().unwrap();
    assert_eq!(cached.domain_name, "corp.example");

    reconciler.invalidate_cache().await;
    let reloaded = reconciler.current_domain().await.unwrap().unwrap();
    assert_eq!(reloaded.domain_name, "renamed.example");
}
