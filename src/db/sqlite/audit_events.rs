use async_trait::async_trait;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use super::common::{parse_enum, parse_uuid};
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{
            AuditEventRepo, Cursor, CursorDirection, ListResult, PageCursors, truncate_to_millis,
        },
    },
    models::{AuditEvent, AuditEventQuery, CreateAuditEvent},
};

pub struct SqliteAuditEventRepo {
    pool: SqlitePool,
}

impl SqliteAuditEventRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_event(row: &SqliteRow) -> DbResult<AuditEvent> {
        let actor_id: Option<String> = row.get("actor_id");
        let payload: String = row.get("payload");
        Ok(AuditEvent {
            org_id: parse_uuid(&row.get::<String, _>("org_id"))?,
            id: parse_uuid(&row.get::<String, _>("id"))?,
            created_at: row.get("created_at"),
            actor_type: parse_enum(&row.get::<String, _>("actor_type"))?,
            actor_id: actor_id.map(|s| parse_uuid(&s)).transpose()?,
            event_type: row.get("event_type"),
            entity_type: row.get("entity_type"),
            entity_id: parse_uuid(&row.get::<String, _>("entity_id"))?,
            payload: serde_json::from_str(&payload)?,
        })
    }
}

const EVENT_COLUMNS: &str =
    "org_id, id, created_at, actor_type, actor_id, event_type, entity_type, entity_id, payload";

#[async_trait]
impl AuditEventRepo for SqliteAuditEventRepo {
    async fn append(
        &self,
        org_id: Uuid,
        input: CreateAuditEvent,
    ) -> DbResult<Option<AuditEvent>> {
        // UUIDv7 ids sort consistently with created_at, keeping the
        // (created_at, id) total order safe under concurrent writers.
        let id = Uuid::now_v7();
        let now = truncate_to_millis(chrono::Utc::now());
        let payload = serde_json::to_string(&input.payload)?;

        let result = sqlx::query(
            r#"
            INSERT INTO audit_events (
                org_id, id, created_at, actor_type, actor_id,
                event_type, entity_type, entity_id, payload, dedup_key
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (dedup_key) DO NOTHING
            "#,
        )
        .bind(org_id.to_string())
        .bind(id.to_string())
        .bind(now)
        .bind(input.actor_type.to_string())
        .bind(input.actor_id.map(|u| u.to_string()))
        .bind(&input.event_type)
        .bind(&input.entity_type)
        .bind(input.entity_id.to_string())
        .bind(&payload)
        .bind(&input.dedup_key)
        .execute(&self.pool)
        .await?;

        // Re-append from a retried batch: the key is already present.
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(AuditEvent {
            org_id,
            id,
            created_at: now,
            actor_type: input.actor_type,
            actor_id: input.actor_id,
            event_type: input.event_type,
            entity_type: input.entity_type,
            entity_id: input.entity_id,
            payload: input.payload,
        }))
    }

    async fn list(&self, org_id: Uuid, query: AuditEventQuery) -> DbResult<ListResult<AuditEvent>> {
        let limit = query.limit.unwrap_or(100);
        let fetch_limit = limit + 1; // one extra row decides has_more

        let cursor = match &query.cursor {
            Some(c) => Some(
                Cursor::decode(c).map_err(|e| DbError::Validation(format!("Invalid cursor: {}", e)))?,
            ),
            None => None,
        };

        let direction = match query.direction.as_deref() {
            Some("backward") => CursorDirection::Backward,
            _ => CursorDirection::Forward,
        };

        let mut conditions = vec!["org_id = ?".to_string()];
        let mut params: Vec<String> = vec![org_id.to_string()];

        if let Some(entity_type) = &query.entity_type {
            conditions.push("entity_type = ?".to_string());
            params.push(entity_type.clone());
        }
        if let Some(entity_id) = &query.entity_id {
            conditions.push("entity_id = ?".to_string());
            params.push(entity_id.to_string());
        }
        if let Some(actor_id) = &query.actor_id {
            conditions.push("actor_id = ?".to_string());
            params.push(actor_id.to_string());
        }
        if let Some(event_type) = &query.event_type {
            conditions.push("event_type = ?".to_string());
            params.push(event_type.clone());
        }
        if let Some(from) = &query.from {
            conditions.push("created_at >= ?".to_string());
            params.push(from.to_rfc3339());
        }
        if let Some(to) = &query.to {
            conditions.push("created_at < ?".to_string());
            params.push(to.to_rfc3339());
        }

        // (created_at, id) comparison gives a stable order even when many
        // events share a timestamp.
        let order = if cursor.is_some() {
            let (comparison, order) = if direction == CursorDirection::Backward {
                (">", "ASC")
            } else {
                ("<", "DESC")
            };
            conditions.push(format!("(created_at, id) {} (?, ?)", comparison));
            order
        } else {
            "DESC"
        };

        let sql = format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM audit_events
            WHERE {}
            ORDER BY created_at {order}, id {order}
            LIMIT ?
            "#,
            conditions.join(" AND ")
        );

        let mut query_builder = sqlx::query(&sql);
        for param in &params {
            query_builder = query_builder.bind(param);
        }
        if let Some(ref c) = cursor {
            query_builder = query_builder.bind(c.created_at).bind(c.id.to_string());
        }
        query_builder = query_builder.bind(fetch_limit);

        let rows = query_builder.fetch_all(&self.pool).await?;

        let has_more = rows.len() as i64 > limit;
        let mut items: Vec<AuditEvent> = rows
            .iter()
            .take(limit as usize)
            .map(Self::map_event)
            .collect::<DbResult<Vec<_>>>()?;

        // Backward pages were fetched ascending; restore descending order.
        if direction == CursorDirection::Backward {
            items.reverse();
        }

        let cursors = PageCursors::from_items(&items, has_more, direction, cursor.as_ref(), |e| {
            Cursor::new(e.created_at, e.id)
        });

        Ok(ListResult::new(items, has_more, cursors))
    }

    async fn list_for_entity(
        &self,
        org_id: Uuid,
        entity_type: &str,
        entity_id: Uuid,
    ) -> DbResult<Vec<AuditEvent>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM audit_events
            WHERE org_id = ? AND entity_type = ? AND entity_id = ?
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(org_id.to_string())
        .bind(entity_type)
        .bind(entity_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_event).collect()
    }
}
