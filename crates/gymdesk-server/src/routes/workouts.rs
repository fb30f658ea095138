//! Workout prescriptions. There is no workout service; handlers talk to
//! the repository and record activity themselves.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use gymdesk_core::error::GymError;
use gymdesk_core::models::workout::{CreateWorkout, ExerciseInput, UpdateWorkout, Workout};
use gymdesk_core::repository::{LeadRepository, WorkoutRepository};
use gymdesk_services::activity::Activity;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/workouts", post(create))
        .route("/workouts/:id", get(fetch).patch(update).delete(remove))
        .route("/workouts/:id/exercises", put(replace_exercises))
        .route("/leads/:id/workouts", get(by_lead))
}

fn validate_exercises(exercises: &[ExerciseInput]) -> Result<(), GymError> {
    for (i, exercise) in exercises.iter().enumerate() {
        if exercise.name.trim().is_empty() {
            return Err(GymError::validation(format!("exercise {} has no name", i + 1)));
        }
        if exercise.sets == 0 {
            return Err(GymError::validation(format!(
                "exercise {} must have at least one set",
                i + 1
            )));
        }
        if exercise.load_kg.is_some_and(|load| !load.is_finite() || load < 0.0) {
            return Err(GymError::validation(format!(
                "exercise {} has an invalid load",
                i + 1
            )));
        }
    }
    Ok(())
}

async fn create(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(mut body): Json<CreateWorkout>,
) -> ApiResult<(StatusCode, Json<Workout>)> {
    if body.name.trim().is_empty() {
        return Err(GymError::validation("workout name is required").into());
    }
    validate_exercises(&body.exercises)?;
    body.unit_id = ctx.unit_id;
    state.lead_repo().get_by_id(ctx.unit_id, body.lead_id).await?;

    let workout = state.workouts().create(body).await?;
    state
        .activity()
        .record(Activity::new(
            ctx.unit_id,
            Some(ctx.staff_id),
            "workout.created",
            "workout",
            workout.id,
            format!(
                "Workout {} assigned with {} exercises",
                workout.name,
                workout.exercises.len()
            ),
        ))
        .await;
    Ok((StatusCode::CREATED, Json(workout)))
}

async fn fetch(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Workout>> {
    Ok(Json(state.workouts().get_by_id(ctx.unit_id, id).await?))
}

async fn by_lead(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(lead_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Workout>>> {
    Ok(Json(
        state.workouts().list_by_lead(ctx.unit_id, lead_id).await?,
    ))
}

async fn update(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateWorkout>,
) -> ApiResult<Json<Workout>> {
    if body.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(GymError::validation("workout name must not be empty").into());
    }
    let workout = state.workouts().update(ctx.unit_id, id, body).await?;
    state
        .activity()
        .record(Activity::new(
            ctx.unit_id,
            Some(ctx.staff_id),
            "workout.updated",
            "workout",
            workout.id,
            format!("Workout {} updated", workout.name),
        ))
        .await;
    Ok(Json(workout))
}

async fn replace_exercises(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(exercises): Json<Vec<ExerciseInput>>,
) -> ApiResult<Json<Workout>> {
    validate_exercises(&exercises)?;
    let workout = state
        .workouts()
        .replace_exercises(ctx.unit_id, id, exercises)
        .await?;
    state
        .activity()
        .record(Activity::new(
            ctx.unit_id,
            Some(ctx.staff_id),
            "workout.exercises_replaced",
            "workout",
            workout.id,
            format!("Workout {} now has {} exercises", workout.name, workout.exercises.len()),
        ))
        .await;
    Ok(Json(workout))
}

async fn remove(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.workouts().delete(ctx.unit_id, id).await?;
    state
        .activity()
        .record(Activity::new(
            ctx.unit_id,
            Some(ctx.staff_id),
            "workout.deleted",
            "workout",
            id,
            "Workout deleted",
        ))
        .await;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(name: &str, sets: u32, load: Option<f64>) -> ExerciseInput {
        ExerciseInput {
            name: name.into(),
            sets,
            reps: "10-12".into(),
            load_kg: load,
            rest_seconds: Some(60),
            notes: None,
        }
    }

    #[test]
    fn exercises_are_checked_in_order() {
        assert!(validate_exercises(&[]).is_ok());
        assert!(validate_exercises(&[exercise("Supino", 3, Some(40.0))]).is_ok());

        let err = validate_exercises(&[exercise("Supino", 3, None), exercise(" ", 3, None)])
            .unwrap_err();
        assert!(err.to_string().contains("exercise 2"));

        assert!(validate_exercises(&[exercise("Agachamento", 0, None)]).is_err());
        assert!(validate_exercises(&[exercise("Remada", 3, Some(-5.0))]).is_err());
    }
}
