use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::audit_events::{AuditEventService, events, system_event, user_event};
use crate::{
    db::{DbError, DbPool},
    models::{
        CreateRetentionPolicy, PolicyScope, RetentionPolicy, RetentionStartEvent,
        StateRetentionDefault,
    },
};

/// Errors that can occur during policy operations.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// No category override, no state default, no system fallback. A
    /// deployment-configuration error: an unretained document is a
    /// compliance violation, so callers must treat this as fatal and
    /// alertable, never skip it.
    #[error("No retention policy resolvable for state {state_code}, category {category}")]
    NoPolicyResolvable { state_code: String, category: String },

    #[error("Policy {0} not found")]
    NotFound(Uuid),

    #[error("Invalid policy definition: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

pub type PolicyResult<T> = Result<T, PolicyError>;

/// One seeded per-state default: (state code, retention years).
const SEEDED_STATE_DEFAULTS: &[(&str, u32)] =
    &[("FL", 5), ("TX", 4), ("AZ", 4), ("NC", 3), ("TN", 3)];

/// Retention years of the seeded system fallback.
const SEEDED_FALLBACK_YEARS: u32 = 7;

/// Effective date of seeded defaults. Early enough to govern any document a
/// tenant can plausibly hold.
fn seeded_effective_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
}

/// Resolves which retention policy governs a document.
///
/// Resolution order: active org category override, then the state default
/// effective on or before the as-of date, then the system fallback.
#[derive(Clone)]
pub struct PolicyResolverService {
    db: Arc<DbPool>,
    audit: AuditEventService,
}

impl PolicyResolverService {
    pub fn new(db: Arc<DbPool>, audit: AuditEventService) -> Self {
        Self { db, audit }
    }

    /// Create an immutable policy template. For category overrides and the
    /// system fallback, any previously active policy in the same slot is
    /// deactivated; schedules that already resolved it keep it.
    pub async fn create_policy(
        &self,
        org_id: Uuid,
        input: CreateRetentionPolicy,
        created_by: Option<Uuid>,
    ) -> PolicyResult<RetentionPolicy> {
        if input.duration_years == 0 {
            return Err(PolicyError::Validation(
                "duration_years must be at least 1".into(),
            ));
        }
        match input.scope {
            PolicyScope::CategoryOverride if input.category.is_none() => {
                return Err(PolicyError::Validation(
                    "category_override policy requires a category".into(),
                ));
            }
            PolicyScope::System | PolicyScope::Org if input.category.is_some() => {
                return Err(PolicyError::Validation(
                    "only category_override policies carry a category".into(),
                ));
            }
            _ => {}
        }

        // Repoint the slot before inserting the replacement.
        let previous = match input.scope {
            PolicyScope::CategoryOverride => {
                let category = input.category.as_deref().unwrap_or_default();
                self.db
                    .policies()
                    .find_active_category_override(org_id, category)
                    .await?
            }
            PolicyScope::System => self.db.policies().find_system_fallback(org_id).await?,
            PolicyScope::Org => None,
        };
        if let Some(previous) = &previous {
            self.db.policies().deactivate(org_id, previous.id).await?;
        }

        let policy = self.db.policies().create(org_id, input, created_by).await?;

        let payload = json!({
            "scope": policy.scope.to_string(),
            "category": policy.category,
            "duration_years": policy.duration_years,
            "start_event": policy.start_event.to_string(),
            "replaces": previous.map(|p| p.id),
        });
        let event = match created_by {
            Some(actor) => {
                user_event(actor, events::POLICY_CREATED, "policy", policy.id, payload, None)
            }
            None => system_event(events::POLICY_CREATED, "policy", policy.id, payload, None),
        };
        self.audit.record(org_id, event).await;

        Ok(policy)
    }

    pub async fn get_policy(&self, org_id: Uuid, id: Uuid) -> PolicyResult<RetentionPolicy> {
        self.db
            .policies()
            .get_by_id(org_id, id)
            .await?
            .ok_or(PolicyError::NotFound(id))
    }

    /// Map (state, effective date) to a policy. The policy must belong to
    /// the same org; cross-tenant references are a data-integrity error.
    pub async fn set_state_default(
        &self,
        org_id: Uuid,
        state_code: &str,
        effective_date: NaiveDate,
        policy_id: Uuid,
    ) -> PolicyResult<StateRetentionDefault> {
        if self.db.policies().get_by_id(org_id, policy_id).await?.is_none() {
            return Err(PolicyError::Validation(format!(
                "Policy {} does not exist in this organization",
                policy_id
            )));
        }

        Ok(self
            .db
            .policies()
            .create_state_default(org_id, state_code, effective_date, policy_id)
            .await?)
    }

    /// Resolve the effective policy for a document.
    #[instrument(skip(self), fields(org_id = %org_id))]
    pub async fn resolve(
        &self,
        org_id: Uuid,
        state_code: &str,
        category: &str,
        as_of: NaiveDate,
    ) -> PolicyResult<RetentionPolicy> {
        if let Some(policy) = self
            .db
            .policies()
            .find_active_category_override(org_id, category)
            .await?
        {
            return Ok(policy);
        }

        if let Some(policy) = self
            .db
            .policies()
            .find_state_default(org_id, state_code, as_of)
            .await?
        {
            return Ok(policy);
        }

        if let Some(policy) = self.db.policies().find_system_fallback(org_id).await? {
            return Ok(policy);
        }

        Err(PolicyError::NoPolicyResolvable {
            state_code: state_code.to_string(),
            category: category.to_string(),
        })
    }

    /// Seed the stock per-state defaults plus a system fallback for a new
    /// tenant. Idempotent: states that already have a default and an
    /// existing fallback are left alone.
    #[instrument(skip(self), fields(org_id = %org_id))]
    pub async fn seed_state_defaults(&self, org_id: Uuid) -> PolicyResult<usize> {
        let effective_date = seeded_effective_date();
        let mut seeded = 0;

        for &(state_code, years) in SEEDED_STATE_DEFAULTS {
            let existing = self
                .db
                .policies()
                .find_state_default(org_id, state_code, chrono::Utc::now().date_naive())
                .await?;
            if existing.is_some() {
                continue;
            }

            let policy = self
                .db
                .policies()
                .create(
                    org_id,
                    CreateRetentionPolicy {
                        scope: PolicyScope::Org,
                        category: None,
                        duration_years: years,
                        start_event: RetentionStartEvent::DocumentReceived,
                    },
                    None,
                )
                .await?;
            self.db
                .policies()
                .create_state_default(org_id, state_code, effective_date, policy.id)
                .await?;

            self.audit
                .record(
                    org_id,
                    system_event(
                        events::POLICY_SEEDED,
                        "policy",
                        policy.id,
                        json!({"state_code": state_code, "duration_years": years}),
                        Some(format!("policy.seeded:{}:{}", org_id, state_code)),
                    ),
                )
                .await;
            seeded += 1;
        }

        if self.db.policies().find_system_fallback(org_id).await?.is_none() {
            let fallback = self
                .db
                .policies()
                .create(
                    org_id,
                    CreateRetentionPolicy {
                        scope: PolicyScope::System,
                        category: None,
                        duration_years: SEEDED_FALLBACK_YEARS,
                        start_event: RetentionStartEvent::EmploymentTerminated,
                    },
                    None,
                )
                .await?;
            self.audit
                .record(
                    org_id,
                    system_event(
                        events::POLICY_SEEDED,
                        "policy",
                        fallback.id,
                        json!({"scope": "system", "duration_years": SEEDED_FALLBACK_YEARS}),
                        Some(format!("policy.seeded:{}:system", org_id)),
                    ),
                )
                .await;
            seeded += 1;
        }

        info!(org_id = %org_id, seeded, "Seeded state retention defaults");
        Ok(seeded)
    }
}
