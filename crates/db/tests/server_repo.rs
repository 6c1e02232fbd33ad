use chrono::{TimeZone, Utc};
use helpdesk_core::status::ResourceStatus;
use helpdesk_db::models::server::{CreateServer, ServerStatusUpdate};
use helpdesk_db::repositories::ServerRepo;
use sqlx::PgPool;

fn new_server(name: &str) -> CreateServer {
    CreateServer {
        name: name.to_string(),
        description: "File server".to_string(),
        location: "HQ rack 3".to_string(),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn registered_server_starts_online(pool: PgPool) {
    let server = ServerRepo::create(&pool, &new_server("SRV1")).await.unwrap();

    assert_eq!(server.status(), ResourceStatus::Online);
    assert_eq!(server.downtime_minutes, 0);
    assert!(server.last_online.is_none());
    assert!(server.back_online.is_none());
    assert_eq!(server.location, "HQ rack 3");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_names_is_sorted(pool: PgPool) {
    for name in ["SRV3", "SRV1", "SRV2"] {
        ServerRepo::create(&pool, &new_server(name)).await.unwrap();
    }

    let names = ServerRepo::list_names(&pool).await.unwrap();
    assert_eq!(names, vec!["SRV1", "SRV2", "SRV3"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn apply_status_writes_derived_fields(pool: PgPool) {
    ServerRepo::create(&pool, &new_server("SRV1")).await.unwrap();
    let went_down = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();

    let updated = ServerRepo::apply_status(
        &pool,
        "SRV1",
        &ServerStatusUpdate {
            status: ResourceStatus::Offline,
            share_service_status: Some("Stopped".to_string()),
            downtime_minutes: 12,
            last_online: Some(went_down),
            back_online: None,
        },
    )
    .await
    .unwrap()
    .expect("server exists");

    assert_eq!(updated.status(), ResourceStatus::Offline);
    assert_eq!(updated.downtime_minutes, 12);
    assert_eq!(updated.last_online, Some(went_down));
    assert_eq!(updated.share_service_status.as_deref(), Some("Stopped"));

    let reread = ServerRepo::find_by_name(&pool, "SRV1").await.unwrap().unwrap();
    assert_eq!(reread, updated);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn apply_status_on_unknown_server_returns_none(pool: PgPool) {
    let result = ServerRepo::apply_status(
        &pool,
        "GHOST",
        &ServerStatusUpdate {
            status: ResourceStatus::Online,
            share_service_status: None,
            downtime_minutes: 0,
            last_online: None,
            back_online: None,
        },
    )
    .await
    .unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn negative_downtime_is_rejected(pool: PgPool) {
    ServerRepo::create(&pool, &new_server("SRV1")).await.unwrap();
    let result = ServerRepo::apply_status(
        &pool,
        "SRV1",
        &ServerStatusUpdate {
            status: ResourceStatus::Offline,
            share_service_status: None,
            downtime_minutes: -1,
            last_online: None,
            back_online: None,
        },
    )
    .await;
    assert!(result.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_removes_server(pool: PgPool) {
    ServerRepo::create(&pool, &new_server("SRV1")).await.unwrap();

    assert!(ServerRepo::delete(&pool, "SRV1").await.unwrap());
    assert!(!ServerRepo::delete(&pool, "SRV1").await.unwrap());
    assert!(ServerRepo::find_by_name(&pool, "SRV1").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_returns_full_rows_by_name(pool: PgPool) {
    for name in ["SRV2", "SRV1"] {
        ServerRepo::create(&pool, &new_server(name)).await.unwrap();
    }

    let servers = ServerRepo::list(&pool).await.unwrap();
    let names: Vec<_> = servers.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["SRV1", "SRV2"]);
    assert!(servers.iter().all(|s| s.description == "File server"));
}
