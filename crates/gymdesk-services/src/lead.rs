//! Lead pipeline operations.

use gymdesk_core::error::{GymError, GymResult};
use gymdesk_core::models::lead::{CreateLead, Lead, LeadFilter, LeadStatus, UpdateLead};
use gymdesk_core::repository::{ActivityLogRepository, LeadRepository, PaginatedResult, Pagination};
use gymdesk_core::validation::{ContactFields, normalize_digits, validate_lead_contact};
use serde_json::json;
use uuid::Uuid;

use crate::activity::{Activity, ActivityRecorder};

pub struct LeadService<L: LeadRepository, A: ActivityLogRepository> {
    leads: L,
    activity: ActivityRecorder<A>,
}

fn normalize_email(email: Option<String>) -> Option<String> {
    email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
}

impl<L: LeadRepository, A: ActivityLogRepository> LeadService<L, A> {
    pub fn new(leads: L, activity: ActivityRecorder<A>) -> Self {
        Self { leads, activity }
    }

    pub async fn create(&self, actor_id: Option<Uuid>, input: CreateLead) -> GymResult<Lead> {
        if input.name.trim().is_empty() {
            return Err(GymError::validation("name is required"));
        }
        validate_lead_contact(ContactFields {
            email: input.email.as_deref(),
            phone: input.phone.as_deref(),
            cpf: input.cpf.as_deref(),
        })?;

        let lead = self
            .leads
            .create(CreateLead {
                name: input.name.trim().to_string(),
                email: normalize_email(input.email),
                phone: normalize_digits(input.phone),
                cpf: normalize_digits(input.cpf),
                ..input
            })
            .await?;

        self.activity
            .record(Activity::new(
                lead.unit_id,
                actor_id,
                "lead.created",
                "lead",
                lead.id,
                format!("Lead {} created", lead.name),
            ))
            .await;
        Ok(lead)
    }

    pub async fn get(&self, unit_id: Uuid, id: Uuid) -> GymResult<Lead> {
        self.leads.get_by_id(unit_id, id).await
    }

    pub async fn list(
        &self,
        unit_id: Uuid,
        filter: LeadFilter,
        pagination: Pagination,
    ) -> GymResult<PaginatedResult<Lead>> {
        self.leads.list(unit_id, filter, pagination).await
    }

    pub async fn update(
        &self,
        unit_id: Uuid,
        actor_id: Option<Uuid>,
        id: Uuid,
        input: UpdateLead,
    ) -> GymResult<Lead> {
        if input.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(GymError::validation("name is required"));
        }
        validate_lead_contact(ContactFields {
            email: input.email.as_deref(),
            phone: input.phone.as_deref(),
            cpf: input.cpf.as_deref(),
        })?;

        let lead = self
            .leads
            .update(
                unit_id,
                id,
                UpdateLead {
                    email: normalize_email(input.email),
                    phone: normalize_digits(input.phone),
                    cpf: normalize_digits(input.cpf),
                    ..input
                },
            )
            .await?;

        self.activity
            .record(Activity::new(
                unit_id,
                actor_id,
                "lead.updated",
                "lead",
                id,
                format!("Lead {} updated", lead.name),
            ))
            .await;
        Ok(lead)
    }

    /// Move a lead to another pipeline stage. Any stage may follow any
    /// other; the previous stage is kept in the activity entry.
    pub async fn change_status(
        &self,
        unit_id: Uuid,
        actor_id: Option<Uuid>,
        id: Uuid,
        status: LeadStatus,
    ) -> GymResult<Lead> {
        let before = self.leads.get_by_id(unit_id, id).await?;
        let lead = self.leads.set_status(unit_id, id, status).await?;

        self.activity
            .record(
                Activity::new(
                    unit_id,
                    actor_id,
                    "lead.status_changed",
                    "lead",
                    id,
                    format!(
                        "Lead {} moved from {} to {}",
                        lead.name, before.status, status
                    ),
                )
                .with_metadata(json!({ "from": before.status, "to": status })),
            )
            .await;
        Ok(lead)
    }

    pub async fn delete(&self, unit_id: Uuid, actor_id: Option<Uuid>, id: Uuid) -> GymResult<()> {
        let lead = self.leads.get_by_id(unit_id, id).await?;
        self.leads.delete(unit_id, id).await?;

        self.activity
            .record(Activity::new(
                unit_id,
                actor_id,
                "lead.deleted",
                "lead",
                id,
                format!("Lead {} deleted", lead.name),
            ))
            .await;
        Ok(())
    }
}
