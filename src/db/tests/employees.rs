//! Shared tests for EmployeeRepo implementations.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    db::{error::DbError, repos::EmployeeRepo},
    models::CreateEmployee,
};

fn employee_input(department: Option<&str>, work_state: &str) -> CreateEmployee {
    CreateEmployee {
        id: Uuid::new_v4(),
        department: department.map(str::to_string),
        work_state: work_state.to_string(),
    }
}

pub struct EmployeeTestContext<'a> {
    pub employee_repo: &'a dyn EmployeeRepo,
}

pub async fn test_upsert_creates(ctx: &EmployeeTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let input = employee_input(Some("finance"), "FL");
    let id = input.id;

    let employee = ctx
        .employee_repo
        .upsert(org_id, input)
        .await
        .expect("Failed to upsert");

    assert_eq!(employee.id, id);
    assert_eq!(employee.org_id, org_id);
    assert_eq!(employee.department.as_deref(), Some("finance"));
    assert_eq!(employee.work_state, "FL");
    assert!(employee.terminated_at.is_none());
}

pub async fn test_upsert_redelivery_is_noop(ctx: &EmployeeTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let input = employee_input(Some("hr"), "TX");

    let first = ctx
        .employee_repo
        .upsert(org_id, input.clone())
        .await
        .expect("Failed to upsert");

    // Re-delivery with different fields keeps the original row.
    let redelivered = CreateEmployee {
        department: Some("legal".to_string()),
        ..input
    };
    let second = ctx
        .employee_repo
        .upsert(org_id, redelivered)
        .await
        .expect("Failed to upsert");

    assert_eq!(second.id, first.id);
    assert_eq!(second.department.as_deref(), Some("hr"));
}

pub async fn test_set_terminated(ctx: &EmployeeTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let input = employee_input(None, "NC");
    let id = input.id;
    ctx.employee_repo
        .upsert(org_id, input)
        .await
        .expect("Failed to upsert");

    let date = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
    let updated = ctx
        .employee_repo
        .set_terminated(org_id, id, date)
        .await
        .expect("Failed to terminate");

    assert_eq!(updated.terminated_at, Some(date));
}

pub async fn test_set_terminated_unknown_employee(ctx: &EmployeeTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let date = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();

    let result = ctx
        .employee_repo
        .set_terminated(org_id, Uuid::new_v4(), date)
        .await;

    assert!(matches!(result, Err(DbError::NotFound)));
}

mod sqlite_tests {
    use super::*;
    use crate::db::{sqlite::SqliteEmployeeRepo, tests::harness::migrated_pool};

    macro_rules! sqlite_test {
        ($name:ident) => {
            #[tokio::test]
            async fn $name() {
                let pool = migrated_pool().await;
                let employee_repo = SqliteEmployeeRepo::new(pool);
                let ctx = EmployeeTestContext {
                    employee_repo: &employee_repo,
                };
                super::$name(&ctx).await;
            }
        };
    }

    sqlite_test!(test_upsert_creates);
    sqlite_test!(test_upsert_redelivery_is_noop);
    sqlite_test!(test_set_terminated);
    sqlite_test!(test_set_terminated_unknown_employee);
}
