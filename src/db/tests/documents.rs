//! Shared tests for DocumentRepo implementations.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    db::{
        error::DbError,
        repos::{DocumentRepo, EmployeeRepo},
    },
    models::{CreateDocument, CreateEmployee, LegalHoldScope, ScopeType},
};

fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn document_input(employee_id: Uuid, category: &str, received_at: DateTime<Utc>) -> CreateDocument {
    CreateDocument {
        id: Uuid::new_v4(),
        employee_id,
        category: category.to_string(),
        received_at,
        content_path: Some(format!("docs/{}.pdf", Uuid::new_v4())),
    }
}

fn scope(scope_type: ScopeType) -> LegalHoldScope {
    LegalHoldScope {
        org_id: Uuid::new_v4(),
        id: Uuid::new_v4(),
        hold_id: Uuid::new_v4(),
        scope_type,
        employee_id: None,
        department: None,
        category: None,
        range_start: None,
        range_end: None,
    }
}

pub struct DocumentTestContext<'a> {
    pub document_repo: &'a dyn DocumentRepo,
    pub employee_repo: &'a dyn EmployeeRepo,
}

impl DocumentTestContext<'_> {
    /// Register an employee and return its id.
    pub async fn create_test_employee(
        &self,
        org_id: Uuid,
        department: Option<&str>,
        work_state: &str,
    ) -> Uuid {
        self.employee_repo
            .upsert(
                org_id,
                CreateEmployee {
                    id: Uuid::new_v4(),
                    department: department.map(str::to_string),
                    work_state: work_state.to_string(),
                },
            )
            .await
            .expect("Failed to create test employee")
            .id
    }
}

pub async fn test_create_basic(ctx: &DocumentTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let employee_id = ctx.create_test_employee(org_id, None, "FL").await;
    let input = document_input(employee_id, "i9", ts(2024, 1, 10));
    let id = input.id;

    let document = ctx
        .document_repo
        .create(org_id, input)
        .await
        .expect("Failed to create");

    assert_eq!(document.id, id);
    assert_eq!(document.employee_id, employee_id);
    assert_eq!(document.category, "i9");
    assert!(document.content_path.is_some());
}

pub async fn test_create_duplicate_is_conflict(ctx: &DocumentTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let employee_id = ctx.create_test_employee(org_id, None, "FL").await;
    let input = document_input(employee_id, "i9", ts(2024, 1, 10));

    ctx.document_repo
        .create(org_id, input.clone())
        .await
        .expect("Failed to create");

    let result = ctx.document_repo.create(org_id, input).await;
    assert!(matches!(result, Err(DbError::Conflict(_))));
}

pub async fn test_list_by_employee(ctx: &DocumentTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let employee_a = ctx.create_test_employee(org_id, None, "FL").await;
    let employee_b = ctx.create_test_employee(org_id, None, "FL").await;

    for month in 1..=3 {
        ctx.document_repo
            .create(org_id, document_input(employee_a, "review", ts(2024, month, 1)))
            .await
            .expect("Failed to create");
    }
    ctx.document_repo
        .create(org_id, document_input(employee_b, "review", ts(2024, 1, 1)))
        .await
        .expect("Failed to create");

    let docs = ctx
        .document_repo
        .list_by_employee(org_id, employee_a)
        .await
        .expect("Failed to list");

    assert_eq!(docs.len(), 3);
    assert!(docs.windows(2).all(|w| w[0].received_at <= w[1].received_at));
}

pub async fn test_scope_employee(ctx: &DocumentTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let target = ctx.create_test_employee(org_id, None, "FL").await;
    let other = ctx.create_test_employee(org_id, None, "FL").await;

    let held = ctx
        .document_repo
        .create(org_id, document_input(target, "i9", ts(2024, 1, 10)))
        .await
        .expect("Failed to create");
    ctx.document_repo
        .create(org_id, document_input(other, "i9", ts(2024, 1, 10)))
        .await
        .expect("Failed to create");

    let matched = ctx
        .document_repo
        .list_matching_scope(
            org_id,
            &LegalHoldScope {
                employee_id: Some(target),
                ..scope(ScopeType::Employee)
            },
        )
        .await
        .expect("Failed to match");

    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].id, held.id);
}

pub async fn test_scope_department_joins_employees(ctx: &DocumentTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let finance = ctx.create_test_employee(org_id, Some("finance"), "FL").await;
    let hr = ctx.create_test_employee(org_id, Some("hr"), "FL").await;

    ctx.document_repo
        .create(org_id, document_input(finance, "expense", ts(2024, 2, 1)))
        .await
        .expect("Failed to create");
    ctx.document_repo
        .create(org_id, document_input(hr, "expense", ts(2024, 2, 1)))
        .await
        .expect("Failed to create");

    let matched = ctx
        .document_repo
        .list_matching_scope(
            org_id,
            &LegalHoldScope {
                department: Some("finance".to_string()),
                ..scope(ScopeType::Department)
            },
        )
        .await
        .expect("Failed to match");

    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].employee_id, finance);
}

pub async fn test_scope_category(ctx: &DocumentTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let employee_id = ctx.create_test_employee(org_id, None, "TX").await;

    ctx.document_repo
        .create(org_id, document_input(employee_id, "i9", ts(2024, 1, 1)))
        .await
        .expect("Failed to create");
    ctx.document_repo
        .create(org_id, document_input(employee_id, "w4", ts(2024, 1, 1)))
        .await
        .expect("Failed to create");

    let matched = ctx
        .document_repo
        .list_matching_scope(
            org_id,
            &LegalHoldScope {
                category: Some("w4".to_string()),
                ..scope(ScopeType::Category)
            },
        )
        .await
        .expect("Failed to match");

    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].category, "w4");
}

pub async fn test_scope_date_range_is_inclusive(ctx: &DocumentTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let employee_id = ctx.create_test_employee(org_id, None, "AZ").await;

    let inside = ctx
        .document_repo
        .create(org_id, document_input(employee_id, "memo", ts(2024, 6, 15)))
        .await
        .expect("Failed to create");
    ctx.document_repo
        .create(org_id, document_input(employee_id, "memo", ts(2024, 8, 1)))
        .await
        .expect("Failed to create");

    let matched = ctx
        .document_repo
        .list_matching_scope(
            org_id,
            &LegalHoldScope {
                range_start: Some(ts(2024, 6, 1)),
                range_end: Some(ts(2024, 6, 30)),
                ..scope(ScopeType::DateRange)
            },
        )
        .await
        .expect("Failed to match");

    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].id, inside.id);
}

pub async fn test_scope_all_org_excludes_other_tenants(ctx: &DocumentTestContext<'_>) {
    let org_a = Uuid::new_v4();
    let org_b = Uuid::new_v4();
    let employee_a = ctx.create_test_employee(org_a, None, "FL").await;
    let employee_b = ctx.create_test_employee(org_b, None, "FL").await;

    ctx.document_repo
        .create(org_a, document_input(employee_a, "i9", ts(2024, 1, 1)))
        .await
        .expect("Failed to create");
    ctx.document_repo
        .create(org_b, document_input(employee_b, "i9", ts(2024, 1, 1)))
        .await
        .expect("Failed to create");

    let matched = ctx
        .document_repo
        .list_matching_scope(org_a, &scope(ScopeType::AllOrg))
        .await
        .expect("Failed to match");

    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].org_id, org_a);
}

pub async fn test_scope_missing_field_is_validation_error(ctx: &DocumentTestContext<'_>) {
    let org_id = Uuid::new_v4();

    let result = ctx
        .document_repo
        .list_matching_scope(org_id, &scope(ScopeType::Employee))
        .await;
    assert!(matches!(result, Err(DbError::Validation(_))));

    let result = ctx
        .document_repo
        .list_matching_scope(org_id, &scope(ScopeType::DateRange))
        .await;
    assert!(matches!(result, Err(DbError::Validation(_))));
}

pub async fn test_clear_content_path(ctx: &DocumentTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let employee_id = ctx.create_test_employee(org_id, None, "TN").await;
    let document = ctx
        .document_repo
        .create(org_id, document_input(employee_id, "i9", ts(2024, 1, 1)))
        .await
        .expect("Failed to create");

    ctx.document_repo
        .clear_content_path(org_id, document.id)
        .await
        .expect("Failed to clear");

    let fetched = ctx
        .document_repo
        .get_by_id(org_id, document.id)
        .await
        .expect("Failed to get")
        .expect("Should exist");
    assert!(fetched.content_path.is_none());
}

mod sqlite_tests {
    use super::*;
    use crate::db::{
        sqlite::{SqliteDocumentRepo, SqliteEmployeeRepo},
        tests::harness::migrated_pool,
    };

    macro_rules! sqlite_test {
        ($name:ident) => {
            #[tokio::test]
            async fn $name() {
                let pool = migrated_pool().await;
                let document_repo = SqliteDocumentRepo::new(pool.clone());
                let employee_repo = SqliteEmployeeRepo::new(pool);
                let ctx = DocumentTestContext {
                    document_repo: &document_repo,
                    employee_repo: &employee_repo,
                };
                super::$name(&ctx).await;
            }
        };
    }

    sqlite_test!(test_create_basic);
    sqlite_test!(test_create_duplicate_is_conflict);
    sqlite_test!(test_list_by_employee);
    sqlite_test!(test_scope_employee);
    sqlite_test!(test_scope_department_joins_employees);
    sqlite_test!(test_scope_category);
    sqlite_test!(test_scope_date_range_is_inclusive);
    sqlite_test!(test_scope_all_org_excludes_other_tenants);
    sqlite_test!(test_scope_missing_field_is_validation_error);
    sqlite_test!(test_clear_content_path);
}
