//! Shared tests for LegalHoldRepo implementations.

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::{
    db::repos::{DocumentRepo, EmployeeRepo, LegalHoldRepo},
    models::{
        CreateDocument, CreateEmployee, CreateLegalHold, CreateLegalHoldScope, HoldStatus,
        ScopeType,
    },
};

fn hold_input(title: &str, scopes: Vec<CreateLegalHoldScope>) -> CreateLegalHold {
    CreateLegalHold {
        title: title.to_string(),
        reason: Some("litigation".to_string()),
        scopes,
    }
}

fn employee_scope(employee_id: Uuid) -> CreateLegalHoldScope {
    CreateLegalHoldScope {
        scope_type: ScopeType::Employee,
        employee_id: Some(employee_id),
        department: None,
        category: None,
        range_start: None,
        range_end: None,
    }
}

pub struct LegalHoldTestContext<'a> {
    pub hold_repo: &'a dyn LegalHoldRepo,
    pub document_repo: &'a dyn DocumentRepo,
    pub employee_repo: &'a dyn EmployeeRepo,
}

impl LegalHoldTestContext<'_> {
    /// Register an employee with one document; return (employee_id, document_id).
    pub async fn create_test_document(&self, org_id: Uuid) -> (Uuid, Uuid) {
        let employee = self
            .employee_repo
            .upsert(
                org_id,
                CreateEmployee {
                    id: Uuid::new_v4(),
                    department: Some("finance".to_string()),
                    work_state: "FL".to_string(),
                },
            )
            .await
            .expect("Failed to create test employee");

        let document = self
            .document_repo
            .create(
                org_id,
                CreateDocument {
                    id: Uuid::new_v4(),
                    employee_id: employee.id,
                    category: "i9".to_string(),
                    received_at: Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap(),
                    content_path: None,
                },
            )
            .await
            .expect("Failed to create test document");

        (employee.id, document.id)
    }
}

pub async fn test_create_with_scopes(ctx: &LegalHoldTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let created_by = Uuid::new_v4();
    let (employee_id, _) = ctx.create_test_document(org_id).await;

    let hold = ctx
        .hold_repo
        .create(
            org_id,
            hold_input(
                "Smith v. Acme",
                vec![
                    employee_scope(employee_id),
                    CreateLegalHoldScope {
                        scope_type: ScopeType::Category,
                        employee_id: None,
                        department: None,
                        category: Some("i9".to_string()),
                        range_start: None,
                        range_end: None,
                    },
                ],
            ),
            created_by,
        )
        .await
        .expect("Failed to create");

    assert_eq!(hold.status, HoldStatus::Active);
    assert_eq!(hold.created_by, created_by);
    assert!(hold.materialized_at.is_none());

    let scopes = ctx
        .hold_repo
        .list_scopes(org_id, hold.id)
        .await
        .expect("Failed to list scopes");
    assert_eq!(scopes.len(), 2);
    assert!(scopes.iter().any(|s| s.scope_type == ScopeType::Employee));
    assert!(scopes.iter().any(|s| s.scope_type == ScopeType::Category));
}

pub async fn test_mark_materialized(ctx: &LegalHoldTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let (employee_id, _) = ctx.create_test_document(org_id).await;
    let hold = ctx
        .hold_repo
        .create(
            org_id,
            hold_input("Case A", vec![employee_scope(employee_id)]),
            Uuid::new_v4(),
        )
        .await
        .expect("Failed to create");

    assert_eq!(
        ctx.hold_repo
            .list_unmaterialized_active()
            .await
            .expect("Failed to list")
            .len(),
        1
    );

    ctx.hold_repo
        .mark_materialized(org_id, hold.id, Utc::now())
        .await
        .expect("Failed to mark");

    let fetched = ctx
        .hold_repo
        .get_by_id(org_id, hold.id)
        .await
        .expect("Failed to get")
        .expect("Should exist");
    assert!(fetched.materialized_at.is_some());
    assert!(
        ctx.hold_repo
            .list_unmaterialized_active()
            .await
            .expect("Failed to list")
            .is_empty()
    );
}

pub async fn test_release_is_conditional(ctx: &LegalHoldTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let (employee_id, _) = ctx.create_test_document(org_id).await;
    let hold = ctx
        .hold_repo
        .create(
            org_id,
            hold_input("Case B", vec![employee_scope(employee_id)]),
            Uuid::new_v4(),
        )
        .await
        .expect("Failed to create");

    let released_by = Uuid::new_v4();
    let released = ctx
        .hold_repo
        .release(org_id, hold.id, released_by, Utc::now())
        .await
        .expect("Failed to release");
    assert!(released);

    // A hold releases exactly once.
    let released_again = ctx
        .hold_repo
        .release(org_id, hold.id, Uuid::new_v4(), Utc::now())
        .await
        .expect("Failed to release");
    assert!(!released_again);

    let fetched = ctx
        .hold_repo
        .get_by_id(org_id, hold.id)
        .await
        .expect("Failed to get")
        .expect("Should exist");
    assert_eq!(fetched.status, HoldStatus::Released);
    assert_eq!(fetched.released_by, Some(released_by));
    assert!(fetched.released_at.is_some());
}

pub async fn test_insert_target_is_idempotent(ctx: &LegalHoldTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let (employee_id, document_id) = ctx.create_test_document(org_id).await;
    let hold = ctx
        .hold_repo
        .create(
            org_id,
            hold_input("Case C", vec![employee_scope(employee_id)]),
            Uuid::new_v4(),
        )
        .await
        .expect("Failed to create");

    let inserted = ctx
        .hold_repo
        .insert_target(org_id, hold.id, document_id)
        .await
        .expect("Failed to insert");
    assert!(inserted);

    let inserted_again = ctx
        .hold_repo
        .insert_target(org_id, hold.id, document_id)
        .await
        .expect("Failed to insert");
    assert!(!inserted_again);

    let targets = ctx
        .hold_repo
        .list_target_documents(org_id, hold.id)
        .await
        .expect("Failed to list");
    assert_eq!(targets, vec![document_id]);
}

pub async fn test_active_target_counting(ctx: &LegalHoldTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let (employee_id, document_id) = ctx.create_test_document(org_id).await;

    // Two overlapping holds protecting the same document.
    let hold_a = ctx
        .hold_repo
        .create(
            org_id,
            hold_input("Case D", vec![employee_scope(employee_id)]),
            Uuid::new_v4(),
        )
        .await
        .expect("Failed to create");
    let hold_b = ctx
        .hold_repo
        .create(
            org_id,
            hold_input("Case E", vec![employee_scope(employee_id)]),
            Uuid::new_v4(),
        )
        .await
        .expect("Failed to create");

    for hold_id in [hold_a.id, hold_b.id] {
        ctx.hold_repo
            .insert_target(org_id, hold_id, document_id)
            .await
            .expect("Failed to insert");
    }

    assert_eq!(
        ctx.hold_repo
            .count_active_targets(org_id, document_id)
            .await
            .expect("Failed to count"),
        2
    );

    // Releasing one hold leaves the other protecting the document.
    ctx.hold_repo
        .release(org_id, hold_a.id, Uuid::new_v4(), Utc::now())
        .await
        .expect("Failed to release");
    assert_eq!(
        ctx.hold_repo
            .count_active_targets(org_id, document_id)
            .await
            .expect("Failed to count"),
        1
    );

    let active = ctx
        .hold_repo
        .active_holds_for_document(org_id, document_id)
        .await
        .expect("Failed to list");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, hold_b.id);

    ctx.hold_repo
        .release(org_id, hold_b.id, Uuid::new_v4(), Utc::now())
        .await
        .expect("Failed to release");
    assert_eq!(
        ctx.hold_repo
            .count_active_targets(org_id, document_id)
            .await
            .expect("Failed to count"),
        0
    );
}

pub async fn test_released_hold_keeps_targets(ctx: &LegalHoldTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let (employee_id, document_id) = ctx.create_test_document(org_id).await;
    let hold = ctx
        .hold_repo
        .create(
            org_id,
            hold_input("Case F", vec![employee_scope(employee_id)]),
            Uuid::new_v4(),
        )
        .await
        .expect("Failed to create");
    ctx.hold_repo
        .insert_target(org_id, hold.id, document_id)
        .await
        .expect("Failed to insert");

    ctx.hold_repo
        .release(org_id, hold.id, Uuid::new_v4(), Utc::now())
        .await
        .expect("Failed to release");

    // Historical evidence survives the release.
    let targets = ctx
        .hold_repo
        .list_target_documents(org_id, hold.id)
        .await
        .expect("Failed to list");
    assert_eq!(targets, vec![document_id]);
}

pub async fn test_list_with_counts(ctx: &LegalHoldTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let (employee_id, document_id) = ctx.create_test_document(org_id).await;
    let (_, other_document) = ctx.create_test_document(org_id).await;

    let hold = ctx
        .hold_repo
        .create(
            org_id,
            hold_input("Case G", vec![employee_scope(employee_id)]),
            Uuid::new_v4(),
        )
        .await
        .expect("Failed to create");
    let empty_hold = ctx
        .hold_repo
        .create(
            org_id,
            hold_input("Case H", vec![employee_scope(employee_id)]),
            Uuid::new_v4(),
        )
        .await
        .expect("Failed to create");

    for document in [document_id, other_document] {
        ctx.hold_repo
            .insert_target(org_id, hold.id, document)
            .await
            .expect("Failed to insert");
    }

    let listed = ctx
        .hold_repo
        .list_with_counts(org_id)
        .await
        .expect("Failed to list");
    assert_eq!(listed.len(), 2);

    let counted = listed.iter().find(|h| h.hold.id == hold.id).unwrap();
    assert_eq!(counted.affected_document_count, 2);
    let empty = listed.iter().find(|h| h.hold.id == empty_hold.id).unwrap();
    assert_eq!(empty.affected_document_count, 0);
}

mod sqlite_tests {
    use super::*;
    use crate::db::{
        sqlite::{SqliteDocumentRepo, SqliteEmployeeRepo, SqliteLegalHoldRepo},
        tests::harness::migrated_pool,
    };

    macro_rules! sqlite_test {
        ($name:ident) => {
            #[tokio::test]
            async fn $name() {
                let pool = migrated_pool().await;
                let hold_repo = SqliteLegalHoldRepo::new(pool.clone());
                let document_repo = SqliteDocumentRepo::new(pool.clone());
                let employee_repo = SqliteEmployeeRepo::new(pool);
                let ctx = LegalHoldTestContext {
                    hold_repo: &hold_repo,
                    document_repo: &document_repo,
                    employee_repo: &employee_repo,
                };
                super::$name(&ctx).await;
            }
        };
    }

    sqlite_test!(test_create_with_scopes);
    sqlite_test!(test_mark_materialized);
    sqlite_test!(test_release_is_conditional);
    sqlite_test!(test_insert_target_is_idempotent);
    sqlite_test!(test_active_target_counting);
    sqlite_test!(test_released_hold_keeps_targets);
    sqlite_test!(test_list_with_counts);
}
