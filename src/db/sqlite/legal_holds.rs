use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use super::common::{parse_enum, parse_uuid};
use crate::{
    db::{
        error::DbResult,
        repos::{LegalHoldRepo, truncate_to_millis},
    },
    models::{
        CreateLegalHold, HoldStatus, LegalHold, LegalHoldScope, LegalHoldWithCount,
    },
};

pub struct SqliteLegalHoldRepo {
    pool: SqlitePool,
}

impl SqliteLegalHoldRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_hold(row: &SqliteRow) -> DbResult<LegalHold> {
        let created_by: String = row.get("created_by");
        let released_by: Option<String> = row.get("released_by");
        Ok(LegalHold {
            org_id: parse_uuid(&row.get::<String, _>("org_id"))?,
            id: parse_uuid(&row.get::<String, _>("id"))?,
            title: row.get("title"),
            reason: row.get("reason"),
            status: parse_enum(&row.get::<String, _>("status"))?,
            created_by: parse_uuid(&created_by)?,
            created_at: row.get("created_at"),
            materialized_at: row.get("materialized_at"),
            released_by: released_by.map(|s| parse_uuid(&s)).transpose()?,
            released_at: row.get("released_at"),
        })
    }

    fn map_scope(row: &SqliteRow) -> DbResult<LegalHoldScope> {
        let employee_id: Option<String> = row.get("employee_id");
        Ok(LegalHoldScope {
            org_id: parse_uuid(&row.get::<String, _>("org_id"))?,
            id: parse_uuid(&row.get::<String, _>("id"))?,
            hold_id: parse_uuid(&row.get::<String, _>("hold_id"))?,
            scope_type: parse_enum(&row.get::<String, _>("scope_type"))?,
            employee_id: employee_id.map(|s| parse_uuid(&s)).transpose()?,
            department: row.get("department"),
            category: row.get("category"),
            range_start: row.get("range_start"),
            range_end: row.get("range_end"),
        })
    }
}

const HOLD_COLUMNS: &str = "org_id, id, title, reason, status, created_by, created_at, \
     materialized_at, released_by, released_at";

#[async_trait]
impl LegalHoldRepo for SqliteLegalHoldRepo {
    async fn create(
        &self,
        org_id: Uuid,
        input: CreateLegalHold,
        created_by: Uuid,
    ) -> DbResult<LegalHold> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(chrono::Utc::now());

        // Hold and its scopes land atomically; a hold without its scopes
        // could never be materialized correctly.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO legal_holds (
                org_id, id, title, reason, status, created_by, created_at,
                materialized_at, released_by, released_at
            )
            VALUES (?, ?, ?, ?, 'active', ?, ?, NULL, NULL, NULL)
            "#,
        )
        .bind(org_id.to_string())
        .bind(id.to_string())
        .bind(&input.title)
        .bind(&input.reason)
        .bind(created_by.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for scope in &input.scopes {
            sqlx::query(
                r#"
                INSERT INTO legal_hold_scopes (
                    org_id, id, hold_id, scope_type, employee_id, department,
                    category, range_start, range_end
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(org_id.to_string())
            .bind(Uuid::new_v4().to_string())
            .bind(id.to_string())
            .bind(scope.scope_type.to_string())
            .bind(scope.employee_id.map(|u| u.to_string()))
            .bind(&scope.department)
            .bind(&scope.category)
            .bind(scope.range_start.map(truncate_to_millis))
            .bind(scope.range_end.map(truncate_to_millis))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(LegalHold {
            org_id,
            id,
            title: input.title,
            reason: input.reason,
            status: HoldStatus::Active,
            created_by,
            created_at: now,
            materialized_at: None,
            released_by: None,
            released_at: None,
        })
    }

    async fn get_by_id(&self, org_id: Uuid, id: Uuid) -> DbResult<Option<LegalHold>> {
        let row = sqlx::query(&format!(
            "SELECT {HOLD_COLUMNS} FROM legal_holds WHERE org_id = ? AND id = ?"
        ))
        .bind(org_id.to_string())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_hold).transpose()
    }

    async fn list_with_counts(&self, org_id: Uuid) -> DbResult<Vec<LegalHoldWithCount>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {HOLD_COLUMNS},
                   (SELECT COUNT(*) FROM legal_hold_targets t
                    WHERE t.hold_id = legal_holds.id) AS target_count
            FROM legal_holds
            WHERE org_id = ?
            ORDER BY created_at DESC
            "#
        ))
        .bind(org_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(LegalHoldWithCount {
                    hold: Self::map_hold(row)?,
                    affected_document_count: row.get("target_count"),
                })
            })
            .collect()
    }

    async fn list_active(&self, org_id: Uuid) -> DbResult<Vec<LegalHold>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {HOLD_COLUMNS} FROM legal_holds
            WHERE org_id = ? AND status = 'active'
            ORDER BY created_at ASC
            "#
        ))
        .bind(org_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_hold).collect()
    }

    async fn list_scopes(&self, org_id: Uuid, hold_id: Uuid) -> DbResult<Vec<LegalHoldScope>> {
        let rows = sqlx::query(
            r#"
            SELECT org_id, id, hold_id, scope_type, employee_id, department,
                   category, range_start, range_end
            FROM legal_hold_scopes
            WHERE org_id = ? AND hold_id = ?
            "#,
        )
        .bind(org_id.to_string())
        .bind(hold_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_scope).collect()
    }

    async fn mark_materialized(&self, org_id: Uuid, id: Uuid, at: DateTime<Utc>) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE legal_holds SET materialized_at = ?
            WHERE org_id = ? AND id = ? AND materialized_at IS NULL
            "#,
        )
        .bind(truncate_to_millis(at))
        .bind(org_id.to_string())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_unmaterialized_active(&self) -> DbResult<Vec<LegalHold>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {HOLD_COLUMNS} FROM legal_holds
            WHERE status = 'active' AND materialized_at IS NULL
            ORDER BY created_at ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_hold).collect()
    }

    async fn release(
        &self,
        org_id: Uuid,
        id: Uuid,
        released_by: Uuid,
        released_at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE legal_holds
            SET status = 'released', released_by = ?, released_at = ?
            WHERE org_id = ? AND id = ? AND status = 'active'
            "#,
        )
        .bind(released_by.to_string())
        .bind(truncate_to_millis(released_at))
        .bind(org_id.to_string())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_target(
        &self,
        org_id: Uuid,
        hold_id: Uuid,
        document_id: Uuid,
    ) -> DbResult<bool> {
        let now = truncate_to_millis(chrono::Utc::now());
        let result = sqlx::query(
            r#"
            INSERT INTO legal_hold_targets (org_id, hold_id, document_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (hold_id, document_id) DO NOTHING
            "#,
        )
        .bind(org_id.to_string())
        .bind(hold_id.to_string())
        .bind(document_id.to_string())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_target_documents(&self, org_id: Uuid, hold_id: Uuid) -> DbResult<Vec<Uuid>> {
        let rows = sqlx::query(
            r#"
            SELECT document_id FROM legal_hold_targets
            WHERE org_id = ? AND hold_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(org_id.to_string())
        .bind(hold_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| parse_uuid(&row.get::<String, _>("document_id")))
            .collect()
    }

    async fn count_active_targets(&self, org_id: Uuid, document_id: Uuid) -> DbResult<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS n
            FROM legal_hold_targets t
            JOIN legal_holds h ON h.id = t.hold_id
            WHERE t.org_id = ? AND t.document_id = ? AND h.status = 'active'
            "#,
        )
        .bind(org_id.to_string())
        .bind(document_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("n"))
    }

    async fn active_holds_for_document(
        &self,
        org_id: Uuid,
        document_id: Uuid,
    ) -> DbResult<Vec<LegalHold>> {
        let rows = sqlx::query(
            r#"
            SELECT h.org_id, h.id, h.title, h.reason, h.status, h.created_by,
                   h.created_at, h.materialized_at, h.released_by, h.released_at
            FROM legal_hold_targets t
            JOIN legal_holds h ON h.id = t.hold_id
            WHERE t.org_id = ? AND t.document_id = ? AND h.status = 'active'
            ORDER BY h.created_at ASC
            "#,
        )
        .bind(org_id.to_string())
        .bind(document_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_hold).collect()
    }
}
