use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use super::common::{parse_enum, parse_uuid};
use crate::{
    db::{
        error::DbResult,
        repos::{RetentionPolicyRepo, truncate_to_millis},
    },
    models::{CreateRetentionPolicy, RetentionPolicy, StateRetentionDefault},
};

pub struct SqliteRetentionPolicyRepo {
    pool: SqlitePool,
}

impl SqliteRetentionPolicyRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_policy(row: &SqliteRow) -> DbResult<RetentionPolicy> {
        let created_by: Option<String> = row.get("created_by");
        Ok(RetentionPolicy {
            org_id: parse_uuid(&row.get::<String, _>("org_id"))?,
            id: parse_uuid(&row.get::<String, _>("id"))?,
            scope: parse_enum(&row.get::<String, _>("scope"))?,
            category: row.get("category"),
            duration_years: row.get::<i64, _>("duration_years") as u32,
            start_event: parse_enum(&row.get::<String, _>("start_event"))?,
            active: row.get::<i64, _>("active") != 0,
            created_at: row.get("created_at"),
            created_by: created_by.map(|s| parse_uuid(&s)).transpose()?,
        })
    }
}

const POLICY_COLUMNS: &str =
    "org_id, id, scope, category, duration_years, start_event, active, created_at, created_by";

#[async_trait]
impl RetentionPolicyRepo for SqliteRetentionPolicyRepo {
    async fn create(
        &self,
        org_id: Uuid,
        input: CreateRetentionPolicy,
        created_by: Option<Uuid>,
    ) -> DbResult<RetentionPolicy> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(chrono::Utc::now());

        sqlx::query(
            r#"
            INSERT INTO retention_policies (
                org_id, id, scope, category, duration_years, start_event,
                active, created_at, created_by
            )
            VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(org_id.to_string())
        .bind(id.to_string())
        .bind(input.scope.to_string())
        .bind(&input.category)
        .bind(input.duration_years as i64)
        .bind(input.start_event.to_string())
        .bind(now)
        .bind(created_by.map(|u| u.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(RetentionPolicy {
            org_id,
            id,
            scope: input.scope,
            category: input.category,
            duration_years: input.duration_years,
            start_event: input.start_event,
            active: true,
            created_at: now,
            created_by,
        })
    }

    async fn get_by_id(&self, org_id: Uuid, id: Uuid) -> DbResult<Option<RetentionPolicy>> {
        let row = sqlx::query(&format!(
            "SELECT {POLICY_COLUMNS} FROM retention_policies WHERE org_id = ? AND id = ?"
        ))
        .bind(org_id.to_string())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_policy).transpose()
    }

    async fn find_active_category_override(
        &self,
        org_id: Uuid,
        category: &str,
    ) -> DbResult<Option<RetentionPolicy>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {POLICY_COLUMNS} FROM retention_policies
            WHERE org_id = ? AND scope = 'category_override'
              AND category = ? AND active = 1
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(org_id.to_string())
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_policy).transpose()
    }

    async fn find_system_fallback(&self, org_id: Uuid) -> DbResult<Option<RetentionPolicy>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {POLICY_COLUMNS} FROM retention_policies
            WHERE org_id = ? AND scope = 'system' AND active = 1
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(org_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_policy).transpose()
    }

    async fn deactivate(&self, org_id: Uuid, id: Uuid) -> DbResult<()> {
        sqlx::query("UPDATE retention_policies SET active = 0 WHERE org_id = ? AND id = ?")
            .bind(org_id.to_string())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_state_default(
        &self,
        org_id: Uuid,
        state_code: &str,
        effective_date: NaiveDate,
        policy_id: Uuid,
    ) -> DbResult<StateRetentionDefault> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(chrono::Utc::now());

        sqlx::query(
            r#"
            INSERT INTO state_retention_defaults (
                org_id, id, state_code, effective_date, policy_id, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(org_id.to_string())
        .bind(id.to_string())
        .bind(state_code)
        .bind(effective_date)
        .bind(policy_id.to_string())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(StateRetentionDefault {
            org_id,
            id,
            state_code: state_code.to_string(),
            effective_date,
            policy_id,
            created_at: now,
        })
    }

    async fn find_state_default(
        &self,
        org_id: Uuid,
        state_code: &str,
        as_of: NaiveDate,
    ) -> DbResult<Option<RetentionPolicy>> {
        // Latest history row whose effective_date <= as_of, joined to its policy.
        let row = sqlx::query(
            r#"
            SELECT p.org_id, p.id, p.scope, p.category, p.duration_years,
                   p.start_event, p.active, p.created_at, p.created_by
            FROM state_retention_defaults d
            JOIN retention_policies p ON p.id = d.policy_id
            WHERE d.org_id = ? AND d.state_code = ? AND d.effective_date <= ?
            ORDER BY d.effective_date DESC
            LIMIT 1
            "#,
        )
        .bind(org_id.to_string())
        .bind(state_code)
        .bind(as_of)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_policy).transpose()
    }
}
