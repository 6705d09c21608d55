//! Background jobs: periodic order archival and database backups.
//!
//! Each job runs on its own tokio interval until the shutdown channel flips
//! to `true`. Failures are logged and retried on the next tick.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tracing::{error, info, warn};

use crate::backup::BackupManager;
use crate::config::AppConfig;
use crate::services::archival::ArchivalService;

/// Starts the configured jobs and returns their handles.
pub fn spawn_jobs(
    config: &AppConfig,
    archival: Arc<ArchivalService>,
    backups: Arc<BackupManager>,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let mut handles = vec![tokio::spawn(archival_loop(
        archival,
        config.cleanup_interval(),
        shutdown.clone(),
    ))];

    if config.backup_enabled {
        handles.push(tokio::spawn(backup_loop(
            backups,
            config.backup_interval(),
            shutdown,
        )));
    } else {
        info!("Scheduled backups disabled");
    }

    handles
}

async fn archival_loop(
    archival: Arc<ArchivalService>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(period_secs = period.as_secs(), "Order archival job started");
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match archival.archive_stale_orders(Utc::now()).await {
                    Ok(0) => {}
                    Ok(count) => info!(count, "Archived completed orders"),
                    Err(e) => error!(error = %e, "Order archival failed"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    info!("Order archival job stopped");
}

async fn backup_loop(
    backups: Arc<BackupManager>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(
        period_secs = period.as_secs(),
        dir = %backups.backup_dir().display(),
        "Backup job started"
    );
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick is immediate; no backup at startup
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = backups.run_backup(Utc::now()).await {
                    warn!(error = %e, "Scheduled backup failed");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    info!("Backup job stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;

    #[tokio::test]
    async fn jobs_stop_on_shutdown() {
        let db = crate::db::establish_connection("sqlite::memory:").await.unwrap();
        crate::db::run_migrations(&db).await.unwrap();
        let db = Arc::new(db);
        let (sender, _rx) = events::channel(8);
        let archival = Arc::new(ArchivalService::new(db, Arc::new(sender), 12));
        let dir = tempfile::tempdir().unwrap();
        let backups = Arc::new(BackupManager::new("sqlite::memory:", dir.path(), 1));

        let mut config = AppConfig::new(
            "sqlite::memory:".into(),
            "a_sufficiently_long_and_varied_secret_9876543210".into(),
            3600,
            "127.0.0.1".into(),
            0,
            "test".into(),
        );
        config.backup_enabled = true;

        let (tx, rx) = watch::channel(false);
        let handles = spawn_jobs(&config, archival, backups, rx);
        assert_eq!(handles.len(), 2);

        tx.send(true).unwrap();
        for handle in handles {
            tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .expect("job should stop")
                .unwrap();
        }
    }
}
