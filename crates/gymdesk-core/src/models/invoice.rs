//! Invoice domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    pub enum InvoiceStatus {
        Pending,
        Paid,
        Overdue,
        Cancelled,
    }
}

text_enum! {
    pub enum PaymentMethod {
        Cash,
        Pix,
        CreditCard,
        DebitCard,
        BankSlip,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub lead_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub description: String,
    pub amount_cents: i64,
    pub discount_cents: i64,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Amount actually owed after the discount.
    pub fn net_cents(&self) -> i64 {
        self.amount_cents - self.discount_cents
    }

    /// Pending invoices whose due date has passed are treated as overdue
    /// even before the sweep flips their status.
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        match self.status {
            InvoiceStatus::Overdue => true,
            InvoiceStatus::Pending => self.due_date < today,
            InvoiceStatus::Paid | InvoiceStatus::Cancelled => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoice {
    /// Set from the caller's unit by the API layer.
    #[serde(default)]
    pub unit_id: Uuid,
    pub lead_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub description: String,
    pub amount_cents: i64,
    #[serde(default)]
    pub discount_cents: i64,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateInvoice {
    pub description: Option<String>,
    pub amount_cents: Option<i64>,
    pub discount_cents: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<InvoiceStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub lead_id: Option<Uuid>,
    /// Inclusive lower bound on `due_date`.
    pub due_from: Option<NaiveDate>,
    /// Inclusive upper bound on `due_date`.
    pub due_to: Option<NaiveDate>,
    /// Inclusive lower bound on `paid_at`.
    pub paid_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `paid_at`.
    pub paid_to: Option<DateTime<Utc>>,
}
