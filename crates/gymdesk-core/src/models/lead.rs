//! Lead domain model: the CRM pipeline record for prospects and members.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    /// Pipeline stage, in funnel order.
    ///
    /// Transitions are plain updates; any stage may follow any other.
    pub enum LeadStatus {
        Lead,
        VisitScheduled,
        Negotiation,
        Active,
        Inactive,
        Cancelled,
    }
}

text_enum! {
    pub enum Sex {
        Male,
        Female,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    /// Phone digits with area code.
    pub phone: Option<String>,
    /// CPF digits.
    pub cpf: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<Sex>,
    /// Where the lead came from (e.g., `instagram`, `walk-in`).
    pub source: Option<String>,
    pub status: LeadStatus,
    pub plan_id: Option<Uuid>,
    /// Staff member responsible for the follow-up.
    pub assigned_to: Option<Uuid>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLead {
    /// Set from the caller's unit by the API layer.
    #[serde(default)]
    pub unit_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub cpf: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub source: Option<String>,
    /// Defaults to [`LeadStatus::Lead`].
    pub status: Option<LeadStatus>,
    pub plan_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateLead {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub cpf: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub source: Option<String>,
    pub plan_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Filters for listing leads. All present filters must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    /// Case-insensitive substring matched against name, email and phone.
    pub search: Option<String>,
    pub assigned_to: Option<Uuid>,
}
