//! Workout plan domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub lead_id: Uuid,
    /// e.g. `Treino A - Peito e tríceps`.
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    /// Ordered by `position`.
    pub exercises: Vec<WorkoutExercise>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutExercise {
    pub id: Uuid,
    pub workout_id: Uuid,
    pub position: u32,
    pub name: String,
    pub sets: u32,
    /// Free text so ranges like `10-12` or `até a falha` fit.
    pub reps: String,
    pub load_kg: Option<f64>,
    pub rest_seconds: Option<u32>,
    pub notes: Option<String>,
}

/// Exercise fields supplied by the caller; ids and positions are assigned
/// on insert following the input order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseInput {
    pub name: String,
    pub sets: u32,
    pub reps: String,
    pub load_kg: Option<f64>,
    pub rest_seconds: Option<u32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkout {
    /// Set from the caller's unit by the API layer.
    #[serde(default)]
    pub unit_id: Uuid,
    pub lead_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub exercises: Vec<ExerciseInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateWorkout {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}
