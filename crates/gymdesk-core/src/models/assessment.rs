//! Physical assessment domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lead::Sex;

text_enum! {
    /// Skinfold protocol used to estimate body density.
    pub enum Protocol {
        JacksonPollock3,
        JacksonPollock7,
        Guedes,
        None,
    }
}

/// Skinfold thicknesses in millimetres. Only the sites required by the
/// chosen protocol need to be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Skinfolds {
    pub chest: Option<f64>,
    pub abdomen: Option<f64>,
    pub thigh: Option<f64>,
    pub triceps: Option<f64>,
    pub subscapular: Option<f64>,
    pub suprailiac: Option<f64>,
    pub midaxillary: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicalAssessment {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub lead_id: Uuid,
    pub assessed_at: DateTime<Utc>,
    pub sex: Sex,
    pub age: u32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub protocol: Protocol,
    pub skinfolds: Skinfolds,
    pub bmi: Option<f64>,
    pub body_density: Option<f64>,
    pub body_fat_percent: Option<f64>,
    pub fat_mass_kg: Option<f64>,
    pub lean_mass_kg: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Measurements collected by the instructor. Derived body composition is
/// computed by the service before the record is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentInput {
    /// Set from the caller's unit by the API layer.
    #[serde(default)]
    pub unit_id: Uuid,
    pub lead_id: Uuid,
    pub assessed_at: Option<DateTime<Utc>>,
    pub sex: Sex,
    pub age: u32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub protocol: Protocol,
    #[serde(default)]
    pub skinfolds: Skinfolds,
    pub notes: Option<String>,
}

/// Fully computed record handed to the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAssessment {
    pub input: AssessmentInput,
    pub bmi: Option<f64>,
    pub body_density: Option<f64>,
    pub body_fat_percent: Option<f64>,
    pub fat_mass_kg: Option<f64>,
    pub lean_mass_kg: Option<f64>,
}
