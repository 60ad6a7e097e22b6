//! Shared setup for scenario tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    config::FilesystemStorageConfig,
    db::{DbPool, tests::harness::migrated_pool},
    models::{CreateDocument, CreateEmployee, Document, Employee},
    services::{Services, file_storage::FilesystemFileStorage},
};

/// Services wired against a fresh in-memory database with content stored
/// under a temp directory. Keep the TempDir alive for the test's duration.
pub async fn test_services() -> (Services, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let storage = FilesystemFileStorage::new(FilesystemStorageConfig {
        path: dir.path().to_string_lossy().to_string(),
        create_dir: false,
    })
    .expect("Failed to create file storage");

    let db = Arc::new(DbPool::from_sqlite(migrated_pool().await));
    (Services::new(db, Arc::new(storage)), dir)
}

pub fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

/// Register an employee through the intake service.
pub async fn register_employee(
    services: &Services,
    org_id: Uuid,
    department: Option<&str>,
    work_state: &str,
) -> Employee {
    services
        .documents
        .register_employee(
            org_id,
            CreateEmployee {
                id: Uuid::new_v4(),
                department: department.map(String::from),
                work_state: work_state.to_string(),
            },
        )
        .await
        .expect("Failed to register employee")
}

/// Register a document with backing content on disk, so the sweep has
/// something real to delete.
pub async fn register_document_with_content(
    services: &Services,
    dir: &tempfile::TempDir,
    org_id: Uuid,
    employee_id: Uuid,
    category: &str,
    received_at: DateTime<Utc>,
) -> Document {
    let document_id = Uuid::new_v4();
    let content_path = format!("{}.pdf", document_id);
    std::fs::write(dir.path().join(&content_path), b"document content")
        .expect("Failed to write content file");

    services
        .documents
        .register_document(
            org_id,
            CreateDocument {
                id: document_id,
                employee_id,
                category: category.to_string(),
                received_at,
                content_path: Some(content_path),
            },
        )
        .await
        .expect("Failed to register document")
        .document
}

/// Seed the stock policies for a fresh tenant.
pub async fn seeded_org(services: &Services) -> Uuid {
    let org_id = Uuid::new_v4();
    services
        .policies
        .seed_state_defaults(org_id)
        .await
        .expect("Failed to seed policies");
    org_id
}
