//! Shared tests for AuditEventRepo implementations.

use chrono::Duration;
use serde_json::json;
use uuid::Uuid;

use crate::{
    db::repos::AuditEventRepo,
    models::{AuditActorType, AuditEventQuery, CreateAuditEvent},
};

fn event_input(event_type: &str, entity_type: &str, entity_id: Uuid) -> CreateAuditEvent {
    CreateAuditEvent {
        actor_type: AuditActorType::User,
        actor_id: Some(Uuid::new_v4()),
        event_type: event_type.to_string(),
        entity_type: entity_type.to_string(),
        entity_id,
        payload: json!({}),
        dedup_key: None,
    }
}

pub struct AuditEventTestContext<'a> {
    pub audit_repo: &'a dyn AuditEventRepo,
}

pub async fn test_append_basic(ctx: &AuditEventTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let entity_id = Uuid::new_v4();
    let actor_id = Uuid::new_v4();

    let event = ctx
        .audit_repo
        .append(
            org_id,
            CreateAuditEvent {
                actor_type: AuditActorType::User,
                actor_id: Some(actor_id),
                event_type: "legal_hold.created".to_string(),
                entity_type: "legal_hold".to_string(),
                entity_id,
                payload: json!({"title": "Smith v. Acme"}),
                dedup_key: None,
            },
        )
        .await
        .expect("Failed to append")
        .expect("Should be a new event");

    assert!(!event.id.is_nil());
    assert_eq!(event.org_id, org_id);
    assert_eq!(event.actor_id, Some(actor_id));
    assert_eq!(event.event_type, "legal_hold.created");
    assert_eq!(event.entity_id, entity_id);
    assert_eq!(event.payload["title"], "Smith v. Acme");
}

pub async fn test_append_system_actor(ctx: &AuditEventTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let event = ctx
        .audit_repo
        .append(
            org_id,
            CreateAuditEvent {
                actor_type: AuditActorType::System,
                actor_id: None,
                event_type: "retention.executed".to_string(),
                entity_type: "document".to_string(),
                entity_id: Uuid::new_v4(),
                payload: json!({}),
                dedup_key: None,
            },
        )
        .await
        .expect("Failed to append")
        .expect("Should be a new event");

    assert_eq!(event.actor_type, AuditActorType::System);
    assert!(event.actor_id.is_none());
}

pub async fn test_append_dedup_key_is_idempotent(ctx: &AuditEventTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let document_id = Uuid::new_v4();
    let key = format!("retention.executed:{}", document_id);

    let input = CreateAuditEvent {
        dedup_key: Some(key),
        ..event_input("retention.executed", "document", document_id)
    };

    let first = ctx
        .audit_repo
        .append(org_id, input.clone())
        .await
        .expect("Failed to append");
    assert!(first.is_some());

    // Retried batch re-delivers the same logical event.
    let second = ctx
        .audit_repo
        .append(org_id, input)
        .await
        .expect("Failed to append");
    assert!(second.is_none());

    let events = ctx
        .audit_repo
        .list_for_entity(org_id, "document", document_id)
        .await
        .expect("Failed to list");
    assert_eq!(events.len(), 1);
}

pub async fn test_list_newest_first(ctx: &AuditEventTestContext<'_>) {
    let org_id = Uuid::new_v4();
    for i in 0..3 {
        ctx.audit_repo
            .append(
                org_id,
                event_input(&format!("retention.recomputed.{}", i), "schedule", Uuid::new_v4()),
            )
            .await
            .expect("Failed to append");
        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    }

    let result = ctx
        .audit_repo
        .list(org_id, AuditEventQuery::default())
        .await
        .expect("Failed to list");

    assert_eq!(result.items.len(), 3);
    assert!(result.items[0].created_at >= result.items[1].created_at);
    assert!(result.items[1].created_at >= result.items[2].created_at);
}

pub async fn test_list_pagination(ctx: &AuditEventTestContext<'_>) {
    let org_id = Uuid::new_v4();
    for _ in 0..5 {
        ctx.audit_repo
            .append(org_id, event_input("retention.scheduled", "schedule", Uuid::new_v4()))
            .await
            .expect("Failed to append");
        tokio::time::sleep(tokio::time::Duration::from_millis(2)).await;
    }

    let page1 = ctx
        .audit_repo
        .list(
            org_id,
            AuditEventQuery {
                limit: Some(2),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to list page 1");
    assert_eq!(page1.items.len(), 2);
    assert!(page1.has_more);

    let page2 = ctx
        .audit_repo
        .list(
            org_id,
            AuditEventQuery {
                limit: Some(2),
                cursor: page1.cursors.next.as_ref().map(|c| c.encode()),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to list page 2");
    assert_eq!(page2.items.len(), 2);
    assert_ne!(page1.items[0].id, page2.items[0].id);

    // Pages do not overlap.
    let page1_ids: Vec<Uuid> = page1.items.iter().map(|e| e.id).collect();
    assert!(page2.items.iter().all(|e| !page1_ids.contains(&e.id)));
}

pub async fn test_list_filter_by_entity(ctx: &AuditEventTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let document_id = Uuid::new_v4();

    ctx.audit_repo
        .append(org_id, event_input("document.registered", "document", document_id))
        .await
        .expect("Failed to append");
    ctx.audit_repo
        .append(org_id, event_input("document.registered", "document", Uuid::new_v4()))
        .await
        .expect("Failed to append");
    ctx.audit_repo
        .append(org_id, event_input("legal_hold.created", "legal_hold", Uuid::new_v4()))
        .await
        .expect("Failed to append");

    let result = ctx
        .audit_repo
        .list(
            org_id,
            AuditEventQuery {
                entity_type: Some("document".to_string()),
                entity_id: Some(document_id),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to list");

    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].entity_id, document_id);
}

pub async fn test_list_filter_by_event_type(ctx: &AuditEventTestContext<'_>) {
    let org_id = Uuid::new_v4();
    ctx.audit_repo
        .append(org_id, event_input("retention.paused", "schedule", Uuid::new_v4()))
        .await
        .expect("Failed to append");
    ctx.audit_repo
        .append(org_id, event_input("retention.resumed", "schedule", Uuid::new_v4()))
        .await
        .expect("Failed to append");

    let result = ctx
        .audit_repo
        .list(
            org_id,
            AuditEventQuery {
                event_type: Some("retention.paused".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to list");

    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].event_type, "retention.paused");
}

pub async fn test_list_filter_by_time_range(ctx: &AuditEventTestContext<'_>) {
    let org_id = Uuid::new_v4();
    for _ in 0..3 {
        ctx.audit_repo
            .append(org_id, event_input("retention.scheduled", "schedule", Uuid::new_v4()))
            .await
            .expect("Failed to append");
    }

    let future = chrono::Utc::now() + Duration::hours(1);
    let result = ctx
        .audit_repo
        .list(
            org_id,
            AuditEventQuery {
                from: Some(future),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to list");
    assert!(result.items.is_empty());

    let past = chrono::Utc::now() - Duration::hours(1);
    let result = ctx
        .audit_repo
        .list(
            org_id,
            AuditEventQuery {
                from: Some(past),
                to: Some(future),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to list");
    assert_eq!(result.items.len(), 3);
}

pub async fn test_list_scoped_to_org(ctx: &AuditEventTestContext<'_>) {
    let org_a = Uuid::new_v4();
    let org_b = Uuid::new_v4();

    ctx.audit_repo
        .append(org_a, event_input("legal_hold.created", "legal_hold", Uuid::new_v4()))
        .await
        .expect("Failed to append");
    ctx.audit_repo
        .append(org_b, event_input("legal_hold.created", "legal_hold", Uuid::new_v4()))
        .await
        .expect("Failed to append");

    let result = ctx
        .audit_repo
        .list(org_a, AuditEventQuery::default())
        .await
        .expect("Failed to list");

    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].org_id, org_a);
}

pub async fn test_list_for_entity_oldest_first(ctx: &AuditEventTestContext<'_>) {
    let org_id = Uuid::new_v4();
    let schedule_id = Uuid::new_v4();

    for event_type in ["retention.scheduled", "retention.paused", "retention.resumed"] {
        ctx.audit_repo
            .append(org_id, event_input(event_type, "schedule", schedule_id))
            .await
            .expect("Failed to append");
        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    }

    let events = ctx
        .audit_repo
        .list_for_entity(org_id, "schedule", schedule_id)
        .await
        .expect("Failed to list");

    // Replay order: the full history, oldest first.
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].event_type, "retention.scheduled");
    assert_eq!(events[1].event_type, "retention.paused");
    assert_eq!(events[2].event_type, "retention.resumed");
}

mod sqlite_tests {
    use super::*;
    use crate::db::{sqlite::SqliteAuditEventRepo, tests::harness::migrated_pool};

    macro_rules! sqlite_test {
        ($name:ident) => {
            #[tokio::test]
            async fn $name() {
                let pool = migrated_pool().await;
                let audit_repo = SqliteAuditEventRepo::new(pool);
                let ctx = AuditEventTestContext {
                    audit_repo: &audit_repo,
                };
                super::$name(&ctx).await;
            }
        };
    }

    sqlite_test!(test_append_basic);
    sqlite_test!(test_append_system_actor);
    sqlite_test!(test_append_dedup_key_is_idempotent);
    sqlite_test!(test_list_newest_first);
    sqlite_test!(test_list_pagination);
    sqlite_test!(test_list_filter_by_entity);
    sqlite_test!(test_list_filter_by_event_type);
    sqlite_test!(test_list_filter_by_time_range);
    sqlite_test!(test_list_scoped_to_org);
    sqlite_test!(test_list_for_entity_oldest_first);
}
