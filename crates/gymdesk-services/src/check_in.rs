//! Member check-ins, typed in at the front desk or scanned from the QR
//! code on the member's phone.

use chrono::{DateTime, Duration, Utc};
use gymdesk_core::error::{GymError, GymResult};
use gymdesk_core::models::check_in::{CheckIn, CheckInMethod, CreateCheckIn};
use gymdesk_core::models::lead::{Lead, LeadStatus};
use gymdesk_core::qr::QrPayload;
use gymdesk_core::repository::{
    ActivityLogRepository, CheckInRepository, LeadRepository, PaginatedResult, Pagination,
};
use uuid::Uuid;

use crate::activity::{Activity, ActivityRecorder};

pub struct CheckInService<C: CheckInRepository, L: LeadRepository, A: ActivityLogRepository> {
    check_ins: C,
    leads: L,
    activity: ActivityRecorder<A>,
    /// Oldest QR code accepted; `None` accepts any age.
    qr_max_age: Option<Duration>,
}

impl<C, L, A> CheckInService<C, L, A>
where
    C: CheckInRepository,
    L: LeadRepository,
    A: ActivityLogRepository,
{
    pub fn new(check_ins: C, leads: L, activity: ActivityRecorder<A>) -> Self {
        Self {
            check_ins,
            leads,
            activity,
            qr_max_age: None,
        }
    }

    pub fn with_qr_max_age(mut self, max_age: Duration) -> Self {
        self.qr_max_age = Some(max_age);
        self
    }

    /// Front-desk check-in. The lead must exist in the unit.
    pub async fn manual(
        &self,
        unit_id: Uuid,
        actor_id: Option<Uuid>,
        lead_id: Uuid,
        notes: Option<String>,
    ) -> GymResult<CheckIn> {
        let lead = self.leads.get_by_id(unit_id, lead_id).await?;
        self.store(&lead, actor_id, CheckInMethod::Manual, notes).await
    }

    /// Check-in from a scanned QR payload. Only Active members of this
    /// unit are admitted.
    pub async fn scan(
        &self,
        unit_id: Uuid,
        actor_id: Option<Uuid>,
        raw_payload: &str,
        now: DateTime<Utc>,
    ) -> GymResult<CheckIn> {
        let payload = QrPayload::decode(raw_payload)?;
        if let Some(max_age) = self.qr_max_age
            && !payload.is_fresh(now, max_age)
        {
            return Err(GymError::validation("QR code expired, generate a new one"));
        }

        let lead = self
            .leads
            .get_by_id(unit_id, payload.lead_id)
            .await
            .map_err(|e| match e {
                GymError::NotFound { .. } => {
                    GymError::validation("QR code does not belong to this unit")
                }
                other => other,
            })?;
        if lead.status != LeadStatus::Active {
            return Err(GymError::Conflict {
                message: format!("{} is not an active member", lead.name),
            });
        }

        self.store(&lead, actor_id, CheckInMethod::QrCode, None)
            .await
    }

    /// Payload to render as the lead's personal QR code.
    pub async fn qr_payload(&self, unit_id: Uuid, lead_id: Uuid) -> GymResult<String> {
        let lead = self.leads.get_by_id(unit_id, lead_id).await?;
        QrPayload::check_in(lead.id, Utc::now()).encode()
    }

    pub async fn history(
        &self,
        unit_id: Uuid,
        lead_id: Uuid,
        pagination: Pagination,
    ) -> GymResult<PaginatedResult<CheckIn>> {
        self.check_ins
            .list_by_lead(unit_id, lead_id, pagination)
            .await
    }

    pub async fn between(
        &self,
        unit_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> GymResult<Vec<CheckIn>> {
        if to <= from {
            return Err(GymError::validation("range end must be after its start"));
        }
        self.check_ins.list_between(unit_id, from, to).await
    }

    async fn store(
        &self,
        lead: &Lead,
        actor_id: Option<Uuid>,
        method: CheckInMethod,
        notes: Option<String>,
    ) -> GymResult<CheckIn> {
        let check_in = self
            .check_ins
            .create(CreateCheckIn {
                unit_id: lead.unit_id,
                lead_id: lead.id,
                method,
                checked_in_at: None,
                notes,
            })
            .await?;

        self.activity
            .record(Activity::new(
                lead.unit_id,
                actor_id,
                "checkin.created",
                "check_in",
                check_in.id,
                format!("{} checked in ({method})", lead.name),
            ))
            .await;
        Ok(check_in)
    }
}
