use async_trait::async_trait;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::{
    db::{error::DbResult, repos::TombstoneRepo},
    models::Tombstone,
};

pub struct SqliteTombstoneRepo {
    pool: SqlitePool,
}

impl SqliteTombstoneRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_tombstone(row: &SqliteRow) -> DbResult<Tombstone> {
        Ok(Tombstone {
            org_id: parse_uuid(&row.get::<String, _>("org_id"))?,
            document_id: parse_uuid(&row.get::<String, _>("document_id"))?,
            policy_id: parse_uuid(&row.get::<String, _>("policy_id"))?,
            deleted_at: row.get("deleted_at"),
            actor: row.get("actor"),
        })
    }
}

#[async_trait]
impl TombstoneRepo for SqliteTombstoneRepo {
    async fn insert(&self, tombstone: Tombstone) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO tombstones (org_id, document_id, policy_id, deleted_at, actor)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (document_id) DO NOTHING
            "#,
        )
        .bind(tombstone.org_id.to_string())
        .bind(tombstone.document_id.to_string())
        .bind(tombstone.policy_id.to_string())
        .bind(tombstone.deleted_at)
        .bind(&tombstone.actor)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, org_id: Uuid, document_id: Uuid) -> DbResult<Option<Tombstone>> {
        let row = sqlx::query(
            r#"
            SELECT org_id, document_id, policy_id, deleted_at, actor
            FROM tombstones
            WHERE org_id = ? AND document_id = ?
            "#,
        )
        .bind(org_id.to_string())
        .bind(document_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_tombstone).transpose()
    }
}
