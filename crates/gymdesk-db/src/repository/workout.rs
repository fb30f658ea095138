//! SurrealDB implementation of [`WorkoutRepository`].
//!
//! Exercises live in their own table keyed by `(workout_id, position)`
//! and are joined back in position order on every read.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use gymdesk_core::error::GymResult;
use gymdesk_core::models::workout::{
    CreateWorkout, ExerciseInput, UpdateWorkout, Workout, WorkoutExercise,
};
use gymdesk_core::repository::WorkoutRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{first, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct WorkoutRow {
    record_id: String,
    unit_id: String,
    lead_id: String,
    name: String,
    description: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ExerciseRow {
    record_id: String,
    workout_id: String,
    position: u32,
    name: String,
    sets: u32,
    reps: String,
    load_kg: Option<f64>,
    rest_seconds: Option<u32>,
    notes: Option<String>,
}

impl ExerciseRow {
    fn try_into_exercise(self) -> Result<WorkoutExercise, DbError> {
        Ok(WorkoutExercise {
            id: parse_uuid(&self.record_id, "exercise")?,
            workout_id: parse_uuid(&self.workout_id, "workout")?,
            position: self.position,
            name: self.name,
            sets: self.sets,
            reps: self.reps,
            load_kg: self.load_kg,
            rest_seconds: self.rest_seconds,
            notes: self.notes,
        })
    }
}

impl WorkoutRow {
    fn try_into_workout(self, exercises: Vec<WorkoutExercise>) -> Result<Workout, DbError> {
        Ok(Workout {
            id: parse_uuid(&self.record_id, "workout")?,
            unit_id: parse_uuid(&self.unit_id, "unit")?,
            lead_id: parse_uuid(&self.lead_id, "lead")?,
            name: self.name,
            description: self.description,
            active: self.active,
            exercises,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_ONE: &str = "SELECT meta::id(id) AS record_id, * FROM type::record('workout', $id) \
                          WHERE unit_id = $unit_id";

/// SurrealDB implementation of the workout repository.
#[derive(Clone)]
pub struct SurrealWorkoutRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealWorkoutRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn insert_exercises(
        &self,
        unit_id: &str,
        workout_id: &str,
        exercises: Vec<ExerciseInput>,
    ) -> Result<(), DbError> {
        for (position, exercise) in exercises.into_iter().enumerate() {
            self.db
                .query(
                    "CREATE type::record('workout_exercise', $id) SET \
                     unit_id = $unit_id, workout_id = $workout_id, \
                     position = $position, name = $name, sets = $sets, \
                     reps = $reps, load_kg = $load_kg, \
                     rest_seconds = $rest_seconds, notes = $notes",
                )
                .bind(("id", Uuid::new_v4().to_string()))
                .bind(("unit_id", unit_id.to_string()))
                .bind(("workout_id", workout_id.to_string()))
                .bind(("position", position as u32))
                .bind(("name", exercise.name))
                .bind(("sets", exercise.sets))
                .bind(("reps", exercise.reps))
                .bind(("load_kg", exercise.load_kg))
                .bind(("rest_seconds", exercise.rest_seconds))
                .bind(("notes", exercise.notes))
                .await?
                .check()
                .map_err(|e| DbError::statement("workout_exercise", e))?;
        }
        Ok(())
    }

    /// Exercises for the given workouts, grouped by workout and ordered by
    /// position.
    async fn exercises_for(
        &self,
        workout_ids: Vec<String>,
    ) -> Result<HashMap<String, Vec<WorkoutExercise>>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM workout_exercise \
                 WHERE workout_id IN $ids ORDER BY position ASC",
            )
            .bind(("ids", workout_ids))
            .await?;

        let rows: Vec<ExerciseRow> = result.take(0)?;
        let mut grouped: HashMap<String, Vec<WorkoutExercise>> = HashMap::new();
        for row in rows {
            let key = row.workout_id.clone();
            grouped.entry(key).or_default().push(row.try_into_exercise()?);
        }
        Ok(grouped)
    }

    async fn load(&self, unit_id: Uuid, id: Uuid) -> Result<Workout, DbError> {
        let mut result = self
            .db
            .query(SELECT_ONE)
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await?;

        let rows: Vec<WorkoutRow> = result.take(0)?;
        let row = first(rows, "workout", id)?;
        let mut exercises = self.exercises_for(vec![row.record_id.clone()]).await?;
        let own = exercises.remove(&row.record_id).unwrap_or_default();
        row.try_into_workout(own)
    }
}

impl<C: Connection> WorkoutRepository for SurrealWorkoutRepository<C> {
    async fn create(&self, input: CreateWorkout) -> GymResult<Workout> {
        let id = Uuid::new_v4();
        let unit_id = input.unit_id.to_string();

        self.db
            .query(
                "CREATE type::record('workout', $id) SET \
                 unit_id = $unit_id, lead_id = $lead_id, name = $name, \
                 description = $description, active = true",
            )
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.clone()))
            .bind(("lead_id", input.lead_id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement("workout", e))?;

        self.insert_exercises(&unit_id, &id.to_string(), input.exercises)
            .await?;

        Ok(self.load(input.unit_id, id).await?)
    }

    async fn get_by_id(&self, unit_id: Uuid, id: Uuid) -> GymResult<Workout> {
        Ok(self.load(unit_id, id).await?)
    }

    async fn list_by_lead(&self, unit_id: Uuid, lead_id: Uuid) -> GymResult<Vec<Workout>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM workout \
                 WHERE unit_id = $unit_id AND lead_id = $lead_id \
                 ORDER BY created_at DESC",
            )
            .bind(("unit_id", unit_id.to_string()))
            .bind(("lead_id", lead_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WorkoutRow> = result.take(0).map_err(DbError::from)?;
        let ids = rows.iter().map(|r| r.record_id.clone()).collect();
        let mut exercises = self.exercises_for(ids).await?;

        let workouts = rows
            .into_iter()
            .map(|row| {
                let own = exercises.remove(&row.record_id).unwrap_or_default();
                row.try_into_workout(own)
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(workouts)
    }

    async fn update(&self, unit_id: Uuid, id: Uuid, input: UpdateWorkout) -> GymResult<Workout> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.active.is_some() {
            sets.push("active = $active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('workout', $id) SET {} WHERE unit_id = $unit_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(active) = input.active {
            builder = builder.bind(("active", active));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement("workout", e))?;

        Ok(self.load(unit_id, id).await?)
    }

    async fn replace_exercises(
        &self,
        unit_id: Uuid,
        id: Uuid,
        exercises: Vec<ExerciseInput>,
    ) -> GymResult<Workout> {
        // Ownership check before touching exercises.
        self.load(unit_id, id).await?;

        let unit = unit_id.to_string();
        let workout = id.to_string();

        self.db
            .query(
                "DELETE workout_exercise WHERE unit_id = $unit_id AND workout_id = $workout_id; \
                 UPDATE type::record('workout', $workout_id) SET updated_at = time::now()",
            )
            .bind(("unit_id", unit.clone()))
            .bind(("workout_id", workout.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement("workout_exercise", e))?;

        self.insert_exercises(&unit, &workout, exercises).await?;

        Ok(self.load(unit_id, id).await?)
    }

    async fn delete(&self, unit_id: Uuid, id: Uuid) -> GymResult<()> {
        self.db
            .query(
                "DELETE workout_exercise WHERE unit_id = $unit_id AND workout_id = $id; \
                 DELETE type::record('workout', $id) WHERE unit_id = $unit_id",
            )
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
