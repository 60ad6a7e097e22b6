use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{EmployeeRepo, truncate_to_millis},
    },
    models::{CreateEmployee, Employee},
};

pub struct SqliteEmployeeRepo {
    pool: SqlitePool,
}

impl SqliteEmployeeRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_employee(row: &SqliteRow) -> DbResult<Employee> {
        Ok(Employee {
            org_id: parse_uuid(&row.get::<String, _>("org_id"))?,
            id: parse_uuid(&row.get::<String, _>("id"))?,
            department: row.get("department"),
            work_state: row.get("work_state"),
            terminated_at: row.get("terminated_at"),
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl EmployeeRepo for SqliteEmployeeRepo {
    async fn upsert(&self, org_id: Uuid, input: CreateEmployee) -> DbResult<Employee> {
        let now = truncate_to_millis(chrono::Utc::now());

        // Re-delivered registrations leave the existing row untouched; the
        // insert only lands for a genuinely new employee id.
        sqlx::query(
            r#"
            INSERT INTO employees (org_id, id, department, work_state, terminated_at, created_at)
            VALUES (?, ?, ?, ?, NULL, ?)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(org_id.to_string())
        .bind(input.id.to_string())
        .bind(&input.department)
        .bind(&input.work_state)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(org_id, input.id)
            .await?
            .ok_or(DbError::Validation(format!(
                "Employee {} exists in a different org",
                input.id
            )))
    }

    async fn get_by_id(&self, org_id: Uuid, id: Uuid) -> DbResult<Option<Employee>> {
        let row = sqlx::query(
            r#"
            SELECT org_id, id, department, work_state, terminated_at, created_at
            FROM employees
            WHERE org_id = ? AND id = ?
            "#,
        )
        .bind(org_id.to_string())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_employee).transpose()
    }

    async fn set_terminated(
        &self,
        org_id: Uuid,
        id: Uuid,
        terminated_at: NaiveDate,
    ) -> DbResult<Employee> {
        let result = sqlx::query(
            "UPDATE employees SET terminated_at = ? WHERE org_id = ? AND id = ?",
        )
        .bind(terminated_at)
        .bind(org_id.to_string())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        self.get_by_id(org_id, id).await?.ok_or(DbError::NotFound)
    }
}
