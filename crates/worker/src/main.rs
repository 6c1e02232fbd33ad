use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use helpdesk_core::scripting::powershell::PowerShellExecutor;
use helpdesk_worker::config::WorkerConfig;
use helpdesk_worker::jobs::build_scheduler;
use helpdesk_worker::reconcilers::{DomainReconciler, LockedOutUserReconciler, ServerReconciler};
use helpdesk_worker::scheduler::{JobKind, SchedulerHandle};
use helpdesk_worker::source::probe::TcpProbe;
use helpdesk_worker::source::script::{ScriptPaths, ScriptSnapshotSource};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "helpdesk_worker=debug,helpdesk_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env().expect("Invalid worker configuration");
    tracing::info!(
        script_dir = %config.script_dir.display(),
        powershell_host = %config.powershell_host,
        "Loaded worker configuration"
    );

    // --- Database ---
    let pool = helpdesk_db::create_pool(&config.database_url, config.max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    helpdesk_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    helpdesk_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Reconcilers ---
    let source = ScriptSnapshotSource::new(
        PowerShellExecutor::new(config.powershell_host.clone()),
        ScriptPaths::in_dir(&config.script_dir),
        config.script_timeout,
    );
    let probe = TcpProbe::new(config.probe_port, config.probe_timeout);

    let servers = Arc::new(ServerReconciler::new(pool.clone(), source.clone()));
    let locked_out = Arc::new(LockedOutUserReconciler::new(pool.clone(), source.clone()));
    let domain = Arc::new(DomainReconciler::new(
        pool.clone(),
        source,
        probe,
        config.probe_concurrency,
    ));

    // --- Scheduler ---
    let cancel = CancellationToken::new();
    let scheduler = build_scheduler(servers, locked_out, domain, &config.intervals);
    let (handle, tasks) = scheduler.spawn(&cancel);
    tracing::info!(jobs = tasks.len(), "Reconciliation scheduler started");

    let refresh_handle = tokio::spawn(refresh_on_hangup(handle, cancel.clone()));

    shutdown_signal().await;

    // --- Shutdown ---
    tracing::info!("Shutdown requested, waiting for in-flight runs");
    cancel.cancel();

    let joined = futures::future::join_all(tasks);
    if tokio::time::timeout(config.shutdown_timeout, joined)
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_secs = config.shutdown_timeout.as_secs(),
            "Reconciliation jobs did not stop in time"
        );
    }
    refresh_handle.abort();

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Run every job immediately on SIGHUP, the manual "refresh now" request.
#[cfg(unix)]
async fn refresh_on_hangup(handle: SchedulerHandle, cancel: CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGHUP handler; manual refresh disabled");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            received = hangup.recv() => {
                if received.is_none() {
                    break;
                }
                tracing::info!("Manual refresh requested");
                let outcomes = futures::future::join_all(
                    JobKind::ALL.iter().map(|&kind| {
                        let handle = handle.clone();
                        async move { (kind, handle.trigger(kind).await) }
                    }),
                )
                .await;
                for (kind, outcome) in outcomes {
                    tracing::info!(
                        job = kind.as_str(),
                        outcome = %serde_json::to_string(&outcome).unwrap_or_default(),
                        "Manual refresh finished"
                    );
                }
            }
        }
    }
}

#[cfg(not(unix))]
async fn refresh_on_hangup(_handle: SchedulerHandle, cancel: CancellationToken) {
    cancel.cancelled().await;
}

/// Wait for SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
