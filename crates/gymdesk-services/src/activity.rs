//! Activity log recording.
//!
//! Every successful mutation appends one entry. Recording is best effort:
//! a storage failure is logged and never fails the mutation that caused
//! it.

use gymdesk_core::models::activity::CreateActivityLog;
use gymdesk_core::repository::ActivityLogRepository;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// One entry about to be recorded.
#[derive(Debug, Clone)]
pub struct Activity {
    pub unit_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: &'static str,
    pub entity_type: &'static str,
    pub entity_id: Option<Uuid>,
    pub description: String,
    pub metadata: Option<Value>,
}

impl Activity {
    pub fn new(
        unit_id: Uuid,
        actor_id: Option<Uuid>,
        action: &'static str,
        entity_type: &'static str,
        entity_id: Uuid,
        description: impl Into<String>,
    ) -> Self {
        Self {
            unit_id,
            actor_id,
            action,
            entity_type,
            entity_id: Some(entity_id),
            description: description.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Clone)]
pub struct ActivityRecorder<A: ActivityLogRepository> {
    repo: A,
}

impl<A: ActivityLogRepository> ActivityRecorder<A> {
    pub fn new(repo: A) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &A {
        &self.repo
    }

    pub async fn record(&self, activity: Activity) {
        let action = activity.action;
        let unit_id = activity.unit_id;
        let result = self
            .repo
            .append(CreateActivityLog {
                unit_id: activity.unit_id,
                actor_id: activity.actor_id,
                action: action.into(),
                entity_type: activity.entity_type.into(),
                entity_id: activity.entity_id,
                description: activity.description,
                metadata: activity.metadata,
            })
            .await;

        if let Err(e) = result {
            warn!(%unit_id, action, error = %e, "failed to record activity");
        }
    }
}
