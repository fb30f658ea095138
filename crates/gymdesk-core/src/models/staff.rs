//! Staff member domain model (the people who log into a unit).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    pub enum StaffRole {
        Owner,
        Manager,
        Instructor,
        Receptionist,
    }
}

impl StaffRole {
    /// Invoices, plans and subscriptions.
    pub fn can_manage_billing(&self) -> bool {
        matches!(self, StaffRole::Owner | StaffRole::Manager)
    }

    /// Staff accounts, unit settings and automation rules.
    pub fn can_manage_staff(&self) -> bool {
        matches!(self, StaffRole::Owner)
    }
}

text_enum! {
    pub enum StaffStatus {
        Active,
        Inactive,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: StaffRole,
    pub status: StaffStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStaffMember {
    /// Set from the caller's unit by the API layer.
    #[serde(default)]
    pub unit_id: Uuid,
    pub name: String,
    pub email: String,
    /// Raw password (will be hashed with Argon2id before storage).
    pub password: String,
    pub role: StaffRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateStaffMember {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<StaffRole>,
    pub status: Option<StaffStatus>,
}
