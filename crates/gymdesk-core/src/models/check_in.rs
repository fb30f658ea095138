//! Check-in domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    pub enum CheckInMethod {
        Manual,
        QrCode,
    }
}

/// A timestamped access event tied to a lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub lead_id: Uuid,
    pub method: CheckInMethod,
    pub checked_in_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCheckIn {
    pub unit_id: Uuid,
    pub lead_id: Uuid,
    pub method: CheckInMethod,
    /// Defaults to now.
    pub checked_in_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}
