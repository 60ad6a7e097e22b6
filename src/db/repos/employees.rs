use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{CreateEmployee, Employee},
};

#[async_trait]
pub trait EmployeeRepo: Send + Sync {
    /// Register an employee. Returns the existing row unchanged if the
    /// collaborator re-delivers a registration.
    async fn upsert(&self, org_id: Uuid, input: CreateEmployee) -> DbResult<Employee>;

    async fn get_by_id(&self, org_id: Uuid, id: Uuid) -> DbResult<Option<Employee>>;

    /// Record a termination date. Returns the updated row; `DbError::NotFound`
    /// if the employee is not registered in this org.
    async fn set_terminated(
        &self,
        org_id: Uuid,
        id: Uuid,
        terminated_at: NaiveDate,
    ) -> DbResult<Employee>;
}
