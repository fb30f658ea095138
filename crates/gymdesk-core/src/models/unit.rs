//! Unit domain model.
//!
//! A unit is a physical gym location and the tenant boundary: leads,
//! staff, invoices and every other record belong to exactly one unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default brand color applied to units that never configured one.
pub const DEFAULT_PRIMARY_COLOR: &str = "#2563eb";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: Uuid,
    /// Human-readable name shown on receipts and messages.
    pub name: String,
    /// URL-safe unique identifier (e.g., `centro-sp`).
    pub slug: String,
    /// Company registration number (CNPJ), digits only.
    pub cnpj: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Brand color in `#RRGGBB` form, drives the derived UI theme.
    pub primary_color: String,
    pub logo_url: Option<String>,
    /// Contract body template rendered for new members.
    pub contract_template: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUnit {
    pub name: String,
    pub slug: String,
    pub cnpj: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub primary_color: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Fields that can be updated on an existing unit.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUnit {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub cnpj: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub primary_color: Option<String>,
    pub logo_url: Option<String>,
    pub contract_template: Option<String>,
    pub metadata: Option<serde_json::Value>,
}
