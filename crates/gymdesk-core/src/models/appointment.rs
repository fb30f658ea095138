//! Appointment (schedule entry) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    pub enum AppointmentKind {
        Visit,
        Assessment,
        Class,
        PersonalTraining,
        Other,
    }
}

text_enum! {
    pub enum AppointmentStatus {
        Scheduled,
        Confirmed,
        Completed,
        Cancelled,
        NoShow,
    }
}

impl AppointmentStatus {
    /// Whether the slot still occupies the staff member's agenda. Only a
    /// cancellation frees it; a no-show keeps the slot on record.
    pub fn blocks_agenda(&self) -> bool {
        *self != AppointmentStatus::Cancelled
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub lead_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub title: String,
    pub kind: AppointmentKind,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Half-open interval overlap: back-to-back slots do not collide.
    pub fn overlaps(&self, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> bool {
        self.starts_at < ends_at && starts_at < self.ends_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointment {
    /// Set from the caller's unit by the API layer.
    #[serde(default)]
    pub unit_id: Uuid,
    pub lead_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub title: String,
    pub kind: AppointmentKind,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAppointment {
    pub lead_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub title: Option<String>,
    pub kind: Option<AppointmentKind>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_cancelled_frees_the_agenda() {
        for status in [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Completed,
            AppointmentStatus::NoShow,
        ] {
            assert!(status.blocks_agenda(), "{status:?}");
        }
        assert!(!AppointmentStatus::Cancelled.blocks_agenda());
    }
}
