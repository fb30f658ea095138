//! Membership contract domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    pub enum ContractStatus {
        Draft,
        Sent,
        Signed,
        Cancelled,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub lead_id: Uuid,
    pub plan_id: Option<Uuid>,
    /// Rendered contract text; the client lays it out as a PDF.
    pub body: String,
    pub status: ContractStatus,
    pub signed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContract {
    pub unit_id: Uuid,
    pub lead_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateContract {
    pub body: Option<String>,
    pub status: Option<ContractStatus>,
    pub signed_at: Option<DateTime<Utc>>,
}
