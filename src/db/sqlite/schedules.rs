use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use super::common::{parse_enum, parse_uuid};
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{RetentionScheduleRepo, truncate_to_millis},
    },
    models::{CreateRetentionSchedule, RetentionSchedule, ScheduleStatus},
};

pub struct SqliteRetentionScheduleRepo {
    pool: SqlitePool,
}

impl SqliteRetentionScheduleRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_schedule(row: &SqliteRow) -> DbResult<RetentionSchedule> {
        Ok(RetentionSchedule {
            org_id: parse_uuid(&row.get::<String, _>("org_id"))?,
            id: parse_uuid(&row.get::<String, _>("id"))?,
            document_id: parse_uuid(&row.get::<String, _>("document_id"))?,
            policy_id: parse_uuid(&row.get::<String, _>("policy_id"))?,
            start_event: parse_enum(&row.get::<String, _>("start_event"))?,
            retention_start_at: row.get("retention_start_at"),
            delete_eligible_at: row.get("delete_eligible_at"),
            status: parse_enum(&row.get::<String, _>("status"))?,
            version: row.get("version"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

const SCHEDULE_COLUMNS: &str = "org_id, id, document_id, policy_id, start_event, \
     retention_start_at, delete_eligible_at, status, version, created_at, updated_at";

#[async_trait]
impl RetentionScheduleRepo for SqliteRetentionScheduleRepo {
    async fn create(
        &self,
        org_id: Uuid,
        input: CreateRetentionSchedule,
    ) -> DbResult<RetentionSchedule> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(chrono::Utc::now());
        let retention_start_at = input.retention_start_at.map(truncate_to_millis);
        let delete_eligible_at = input.delete_eligible_at.map(truncate_to_millis);

        let result = sqlx::query(
            r#"
            INSERT INTO retention_schedules (
                org_id, id, document_id, policy_id, start_event,
                retention_start_at, delete_eligible_at, status, version,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, 'scheduled', 0, ?, ?)
            ON CONFLICT (document_id) DO NOTHING
            "#,
        )
        .bind(org_id.to_string())
        .bind(id.to_string())
        .bind(input.document_id.to_string())
        .bind(input.policy_id.to_string())
        .bind(input.start_event.to_string())
        .bind(retention_start_at)
        .bind(delete_eligible_at)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::Conflict(format!(
                "Document {} already has a retention schedule",
                input.document_id
            )));
        }

        Ok(RetentionSchedule {
            org_id,
            id,
            document_id: input.document_id,
            policy_id: input.policy_id,
            start_event: input.start_event,
            retention_start_at,
            delete_eligible_at,
            status: ScheduleStatus::Scheduled,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_document(
        &self,
        org_id: Uuid,
        document_id: Uuid,
    ) -> DbResult<Option<RetentionSchedule>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS} FROM retention_schedules
            WHERE org_id = ? AND document_id = ?
            "#
        ))
        .bind(org_id.to_string())
        .bind(document_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_schedule).transpose()
    }

    async fn update_computed(
        &self,
        org_id: Uuid,
        id: Uuid,
        expected_version: i64,
        retention_start_at: Option<DateTime<Utc>>,
        delete_eligible_at: Option<DateTime<Utc>>,
    ) -> DbResult<bool> {
        let now = truncate_to_millis(chrono::Utc::now());
        let result = sqlx::query(
            r#"
            UPDATE retention_schedules
            SET retention_start_at = ?, delete_eligible_at = ?,
                version = version + 1, updated_at = ?
            WHERE org_id = ? AND id = ? AND version = ?
            "#,
        )
        .bind(retention_start_at.map(truncate_to_millis))
        .bind(delete_eligible_at.map(truncate_to_millis))
        .bind(now)
        .bind(org_id.to_string())
        .bind(id.to_string())
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn transition_status(
        &self,
        org_id: Uuid,
        id: Uuid,
        from: ScheduleStatus,
        to: ScheduleStatus,
    ) -> DbResult<bool> {
        let now = truncate_to_millis(chrono::Utc::now());
        let result = sqlx::query(
            r#"
            UPDATE retention_schedules
            SET status = ?, version = version + 1, updated_at = ?
            WHERE org_id = ? AND id = ? AND status = ?
            "#,
        )
        .bind(to.to_string())
        .bind(now)
        .bind(org_id.to_string())
        .bind(id.to_string())
        .bind(from.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_delete_eligible(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<RetentionSchedule>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS} FROM retention_schedules
            WHERE status = 'scheduled'
              AND delete_eligible_at IS NOT NULL
              AND delete_eligible_at <= ?
            ORDER BY delete_eligible_at ASC
            LIMIT ?
            "#
        ))
        .bind(truncate_to_millis(now))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_schedule).collect()
    }
}
