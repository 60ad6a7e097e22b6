mod error;
pub mod repos;
pub mod sqlite;

#[cfg(test)]
pub mod tests;

use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use repos::*;

use crate::config::DatabaseConfig;

/// Cached repository trait objects, created once at startup.
struct CachedRepos {
    policies: Arc<dyn RetentionPolicyRepo>,
    employees: Arc<dyn EmployeeRepo>,
    documents: Arc<dyn DocumentRepo>,
    schedules: Arc<dyn RetentionScheduleRepo>,
    legal_holds: Arc<dyn LegalHoldRepo>,
    audit_events: Arc<dyn AuditEventRepo>,
    tombstones: Arc<dyn TombstoneRepo>,
}

/// Database pool plus cached repositories.
///
/// Repositories are trait objects so a second backend can slot in behind the
/// same seams; SQLite is the one durable store currently implemented.
pub struct DbPool {
    pool: sqlx::SqlitePool,
    repos: CachedRepos,
}

impl DbPool {
    /// Create a DbPool from an existing SQLite pool.
    /// Primarily useful for testing.
    pub fn from_sqlite(pool: sqlx::SqlitePool) -> Self {
        let repos = CachedRepos {
            policies: Arc::new(sqlite::SqliteRetentionPolicyRepo::new(pool.clone())),
            employees: Arc::new(sqlite::SqliteEmployeeRepo::new(pool.clone())),
            documents: Arc::new(sqlite::SqliteDocumentRepo::new(pool.clone())),
            schedules: Arc::new(sqlite::SqliteRetentionScheduleRepo::new(pool.clone())),
            legal_holds: Arc::new(sqlite::SqliteLegalHoldRepo::new(pool.clone())),
            audit_events: Arc::new(sqlite::SqliteAuditEventRepo::new(pool.clone())),
            tombstones: Arc::new(sqlite::SqliteTombstoneRepo::new(pool.clone())),
        };
        DbPool { pool, repos }
    }

    /// Create a database pool from configuration.
    pub async fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(
                sqlx::sqlite::SqliteConnectOptions::new()
                    .filename(&config.path)
                    .create_if_missing(config.create_if_missing)
                    .journal_mode(if config.wal_mode {
                        sqlx::sqlite::SqliteJournalMode::Wal
                    } else {
                        sqlx::sqlite::SqliteJournalMode::Delete
                    })
                    .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms)),
            )
            .await?;

        Ok(Self::from_sqlite(pool))
    }

    /// Run database migrations using sqlx's migration runner.
    pub async fn run_migrations(&self) -> DbResult<()> {
        tracing::info!("Running SQLite migrations");
        sqlx::migrate!("./migrations_sqlx/sqlite")
            .run(&self.pool)
            .await?;
        tracing::info!("SQLite migrations completed successfully");
        Ok(())
    }

    pub fn policies(&self) -> Arc<dyn RetentionPolicyRepo> {
        Arc::clone(&self.repos.policies)
    }

    pub fn employees(&self) -> Arc<dyn EmployeeRepo> {
        Arc::clone(&self.repos.employees)
    }

    pub fn documents(&self) -> Arc<dyn DocumentRepo> {
        Arc::clone(&self.repos.documents)
    }

    pub fn schedules(&self) -> Arc<dyn RetentionScheduleRepo> {
        Arc::clone(&self.repos.schedules)
    }

    pub fn legal_holds(&self) -> Arc<dyn LegalHoldRepo> {
        Arc::clone(&self.repos.legal_holds)
    }

    pub fn audit_events(&self) -> Arc<dyn AuditEventRepo> {
        Arc::clone(&self.repos.audit_events)
    }

    pub fn tombstones(&self) -> Arc<dyn TombstoneRepo> {
        Arc::clone(&self.repos.tombstones)
    }

    /// Health check for database connectivity.
    pub async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
