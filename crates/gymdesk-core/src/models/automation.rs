//! Automation rules and their delivery log.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    /// Event a rule is anchored on. The rule fires when
    /// `event date + day_offset` equals the run date.
    pub enum TriggerType {
        /// Anniversary of `birth_date` in the current year.
        Birthday,
        /// Last check-in (or lead creation when never checked in).
        InactiveDays,
        /// Lead creation date.
        WelcomeNewLead,
        /// Due date of a pending invoice.
        InvoiceDue,
        /// Due date of an overdue invoice.
        InvoiceOverdue,
        /// `ends_on` of an active subscription.
        SubscriptionExpiring,
    }
}

text_enum! {
    pub enum Channel {
        WhatsApp,
        Email,
        Sms,
    }
}

text_enum! {
    pub enum DeliveryStatus {
        Sent,
        Failed,
        Skipped,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub name: String,
    pub trigger: TriggerType,
    /// Days added to the event date; negative values fire before it.
    pub day_offset: i32,
    pub channel: Channel,
    /// Message body with `{{placeholder}}` variables.
    pub template: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAutomationRule {
    /// Set from the caller's unit by the API layer.
    #[serde(default)]
    pub unit_id: Uuid,
    pub name: String,
    pub trigger: TriggerType,
    pub day_offset: i32,
    pub channel: Channel,
    pub template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAutomationRule {
    pub name: Option<String>,
    pub trigger: Option<TriggerType>,
    pub day_offset: Option<i32>,
    pub channel: Option<Channel>,
    pub template: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationLog {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub rule_id: Uuid,
    pub lead_id: Uuid,
    pub run_date: NaiveDate,
    pub channel: Channel,
    pub message: String,
    pub status: DeliveryStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAutomationLog {
    pub unit_id: Uuid,
    pub rule_id: Uuid,
    pub lead_id: Uuid,
    pub run_date: NaiveDate,
    pub channel: Channel,
    pub message: String,
    pub status: DeliveryStatus,
    pub error: Option<String>,
}
