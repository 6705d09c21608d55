//! Database backups
//!
//! PostgreSQL databases are dumped with `pg_dump`; file backed SQLite
//! databases are copied. Backups land in the configured directory as
//! `backup-YYYYMMDD-HHMMSS.{sql|db}` and old files are pruned by count.

use crate::{db::is_in_memory_sqlite, errors::ServiceError, metrics::BUSINESS_METRICS};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::{fs, process::Command};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

const FILE_PREFIX: &str = "backup-";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backups are not supported for {0}")]
    Unsupported(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("pg_dump failed: {0}")]
    Dump(String),
}

impl From<BackupError> for ServiceError {
    fn from(err: BackupError) -> Self {
        match err {
            BackupError::Unsupported(msg) => {
                ServiceError::InvalidOperation(format!("Backups are not supported for {}", msg))
            }
            other => ServiceError::BackupError(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Postgres(String),
    SqliteFile(PathBuf),
}

impl Source {
    fn from_url(url: &str) -> Result<Self, BackupError> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Ok(Source::Postgres(url.to_string()));
        }
        if url.starts_with("sqlite") {
            if is_in_memory_sqlite(url) {
                return Err(BackupError::Unsupported("in-memory SQLite".to_string()));
            }
            let path = url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path = path.split('?').next().unwrap_or(path);
            if path.is_empty() {
                return Err(BackupError::Unsupported("SQLite without a file".to_string()));
            }
            return Ok(Source::SqliteFile(PathBuf::from(path)));
        }
        Err(BackupError::Unsupported(
            url.split(':').next().unwrap_or("unknown").to_string(),
        ))
    }

    fn extension(&self) -> &'static str {
        match self {
            Source::Postgres(_) => "sql",
            Source::SqliteFile(_) => "db",
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BackupReport {
    pub path: String,
    pub size_bytes: u64,
    pub pruned: usize,
    pub created_at: DateTime<Utc>,
}

pub fn backup_file_name(now: DateTime<Utc>, extension: &str) -> String {
    format!("{}{}.{}", FILE_PREFIX, now.format("%Y%m%d-%H%M%S"), extension)
}

/// Writes database backups into a directory
#[derive(Debug, Clone)]
pub struct BackupManager {
    database_url: String,
    backup_dir: PathBuf,
    retention: usize,
}

impl BackupManager {
    pub fn new(database_url: impl Into<String>, backup_dir: impl Into<PathBuf>, retention: usize) -> Self {
        Self {
            database_url: database_url.into(),
            backup_dir: backup_dir.into(),
            retention,
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Takes one backup and prunes the directory down to the retention count
    #[instrument(skip(self))]
    pub async fn run_backup(&self, now: DateTime<Utc>) -> Result<BackupReport, BackupError> {
        let result = self.write_backup(now).await;
        BUSINESS_METRICS.record_backup(result.is_ok());

        let path = result.map_err(|e| {
            error!(error = %e, "Backup failed");
            e
        })?;
        let size_bytes = fs::metadata(&path).await?.len();
        let pruned = self.prune(self.retention).await?;

        info!(path = %path.display(), size_bytes, pruned, "Backup written");
        Ok(BackupReport {
            path: path.display().to_string(),
            size_bytes,
            pruned,
            created_at: now,
        })
    }

    async fn write_backup(&self, now: DateTime<Utc>) -> Result<PathBuf, BackupError> {
        let source = Source::from_url(&self.database_url)?;
        fs::create_dir_all(&self.backup_dir).await?;
        let target = self
            .backup_dir
            .join(backup_file_name(now, source.extension()));

        match source {
            Source::Postgres(url) => {
                let output = Command::new("pg_dump")
                    .arg(format!("--dbname={}", url))
                    .arg(format!("--file={}", target.display()))
                    .arg("--no-owner")
                    .output()
                    .await?;
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                    // Don't leave a truncated dump behind
                    let _ = fs::remove_file(&target).await;
                    return Err(BackupError::Dump(stderr));
                }
            }
            Source::SqliteFile(path) => {
                fs::copy(&path, &target).await?;
            }
        }
        Ok(target)
    }

    /// Keeps the newest `retention` backups, returning how many were removed
    pub async fn prune(&self, retention: usize) -> Result<usize, BackupError> {
        let mut backups = Vec::new();
        let mut entries = match fs::read_dir(&self.backup_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(FILE_PREFIX) {
                backups.push((name, entry.path()));
            }
        }

        // Names embed the timestamp, so lexical order is chronological
        backups.sort_by(|a, b| b.0.cmp(&a.0));
        let mut removed = 0;
        for (name, path) in backups.into_iter().skip(retention) {
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(%name, error = %e, "Failed to prune backup"),
            }
        }
        Ok(removed)
    }
}
