use async_trait::async_trait;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{DocumentRepo, truncate_to_millis},
    },
    models::{CreateDocument, Document, LegalHoldScope, ScopeType},
};

pub struct SqliteDocumentRepo {
    pool: SqlitePool,
}

impl SqliteDocumentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_document(row: &SqliteRow) -> DbResult<Document> {
        Ok(Document {
            org_id: parse_uuid(&row.get::<String, _>("org_id"))?,
            id: parse_uuid(&row.get::<String, _>("id"))?,
            employee_id: parse_uuid(&row.get::<String, _>("employee_id"))?,
            category: row.get("category"),
            received_at: row.get("received_at"),
            content_path: row.get("content_path"),
            created_at: row.get("created_at"),
        })
    }
}

const DOCUMENT_COLUMNS: &str =
    "org_id, id, employee_id, category, received_at, content_path, created_at";

#[async_trait]
impl DocumentRepo for SqliteDocumentRepo {
    async fn create(&self, org_id: Uuid, input: CreateDocument) -> DbResult<Document> {
        let now = truncate_to_millis(chrono::Utc::now());
        let received_at = truncate_to_millis(input.received_at);

        let result = sqlx::query(
            r#"
            INSERT INTO documents (
                org_id, id, employee_id, category, received_at, content_path, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(org_id.to_string())
        .bind(input.id.to_string())
        .bind(input.employee_id.to_string())
        .bind(&input.category)
        .bind(received_at)
        .bind(&input.content_path)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::Conflict(format!(
                "Document {} already registered",
                input.id
            )));
        }

        Ok(Document {
            org_id,
            id: input.id,
            employee_id: input.employee_id,
            category: input.category,
            received_at,
            content_path: input.content_path,
            created_at: now,
        })
    }

    async fn get_by_id(&self, org_id: Uuid, id: Uuid) -> DbResult<Option<Document>> {
        let row = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE org_id = ? AND id = ?"
        ))
        .bind(org_id.to_string())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_document).transpose()
    }

    async fn list_by_employee(&self, org_id: Uuid, employee_id: Uuid) -> DbResult<Vec<Document>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS} FROM documents
            WHERE org_id = ? AND employee_id = ?
            ORDER BY received_at ASC
            "#
        ))
        .bind(org_id.to_string())
        .bind(employee_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_document).collect()
    }

    async fn list_matching_scope(
        &self,
        org_id: Uuid,
        scope: &LegalHoldScope,
    ) -> DbResult<Vec<Document>> {
        let rows = match scope.scope_type {
            ScopeType::Employee => {
                let employee_id = scope.employee_id.ok_or(DbError::Validation(
                    "employee scope without employee_id".into(),
                ))?;
                sqlx::query(&format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE org_id = ? AND employee_id = ?"
                ))
                .bind(org_id.to_string())
                .bind(employee_id.to_string())
                .fetch_all(&self.pool)
                .await?
            }
            ScopeType::Department => {
                let department = scope.department.as_deref().ok_or(DbError::Validation(
                    "department scope without department".into(),
                ))?;
                sqlx::query(&format!(
                    r#"
                    SELECT d.org_id, d.id, d.employee_id, d.category, d.received_at,
                           d.content_path, d.created_at
                    FROM documents d
                    JOIN employees e ON e.id = d.employee_id
                    WHERE d.org_id = ? AND e.department = ?
                    "#
                ))
                .bind(org_id.to_string())
                .bind(department)
                .fetch_all(&self.pool)
                .await?
            }
            ScopeType::Category => {
                let category = scope
                    .category
                    .as_deref()
                    .ok_or(DbError::Validation("category scope without category".into()))?;
                sqlx::query(&format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE org_id = ? AND category = ?"
                ))
                .bind(org_id.to_string())
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
            ScopeType::DateRange => {
                let (start, end) = match (scope.range_start, scope.range_end) {
                    (Some(s), Some(e)) => (s, e),
                    _ => {
                        return Err(DbError::Validation(
                            "date_range scope without both bounds".into(),
                        ));
                    }
                };
                sqlx::query(&format!(
                    r#"
                    SELECT {DOCUMENT_COLUMNS} FROM documents
                    WHERE org_id = ? AND received_at >= ? AND received_at <= ?
                    "#
                ))
                .bind(org_id.to_string())
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await?
            }
            ScopeType::AllOrg => {
                sqlx::query(&format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE org_id = ?"
                ))
                .bind(org_id.to_string())
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(Self::map_document).collect()
    }

    async fn clear_content_path(&self, org_id: Uuid, id: Uuid) -> DbResult<()> {
        sqlx::query("UPDATE documents SET content_path = NULL WHERE org_id = ? AND id = ?")
            .bind(org_id.to_string())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
