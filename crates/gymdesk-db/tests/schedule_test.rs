//! Integration tests for workouts and appointments using in-memory
//! SurrealDB.

use chrono::{DateTime, Duration, TimeZone, Utc};
use gymdesk_core::models::appointment::{
    AppointmentKind, AppointmentStatus, CreateAppointment, UpdateAppointment,
};
use gymdesk_core::models::workout::{CreateWorkout, ExerciseInput, UpdateWorkout};
use gymdesk_core::repository::{AppointmentRepository, WorkoutRepository};
use gymdesk_db::repository::{SurrealAppointmentRepository, SurrealWorkoutRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gymdesk_db::run_migrations(&db).await.unwrap();
    db
}

fn exercise(name: &str, sets: u32) -> ExerciseInput {
    ExerciseInput {
        name: name.into(),
        sets,
        reps: "10-12".into(),
        load_kg: Some(20.0),
        rest_seconds: Some(60),
        notes: None,
    }
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 6, hour, minute, 0).unwrap()
}

fn appointment(unit_id: Uuid, staff_id: Uuid, start: DateTime<Utc>) -> CreateAppointment {
    CreateAppointment {
        unit_id,
        lead_id: None,
        staff_id: Some(staff_id),
        title: "Avaliação".into(),
        kind: AppointmentKind::Assessment,
        starts_at: start,
        ends_at: start + Duration::hours(1),
        notes: None,
    }
}

#[tokio::test]
async fn workout_keeps_exercise_order() {
    let db = setup().await;
    let repo = SurrealWorkoutRepository::new(db);
    let unit_id = Uuid::new_v4();
    let lead_id = Uuid::new_v4();

    let workout = repo
        .create(CreateWorkout {
            unit_id,
            lead_id,
            name: "Treino A".into(),
            description: None,
            exercises: vec![
                exercise("Agachamento", 4),
                exercise("Supino", 3),
                exercise("Remada", 3),
            ],
        })
        .await
        .unwrap();
    assert!(workout.active);
    let names: Vec<&str> = workout.exercises.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["Agachamento", "Supino", "Remada"]);
    let positions: Vec<u32> = workout.exercises.iter().map(|e| e.position).collect();
    assert_eq!(positions, [0, 1, 2]);

    let fetched = repo.get_by_id(unit_id, workout.id).await.unwrap();
    assert_eq!(fetched.exercises, workout.exercises);
}

#[tokio::test]
async fn replacing_exercises_renumbers() {
    let db = setup().await;
    let repo = SurrealWorkoutRepository::new(db);
    let unit_id = Uuid::new_v4();
    let lead_id = Uuid::new_v4();

    let workout = repo
        .create(CreateWorkout {
            unit_id,
            lead_id,
            name: "Treino B".into(),
            description: None,
            exercises: vec![exercise("Leg press", 4), exercise("Cadeira extensora", 3)],
        })
        .await
        .unwrap();

    let replaced = repo
        .replace_exercises(
            unit_id,
            workout.id,
            vec![exercise("Stiff", 3), exercise("Panturrilha", 4), exercise("Abdutora", 3)],
        )
        .await
        .unwrap();
    let names: Vec<&str> = replaced.exercises.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["Stiff", "Panturrilha", "Abdutora"]);
    assert_eq!(replaced.exercises[2].position, 2);

    let renamed = repo
        .update(
            unit_id,
            workout.id,
            UpdateWorkout {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!renamed.active);
    assert_eq!(renamed.exercises.len(), 3);

    let listed = repo.list_by_lead(unit_id, lead_id).await.unwrap();
    assert_eq!(listed.len(), 1);

    repo.delete(unit_id, workout.id).await.unwrap();
    assert!(repo.get_by_id(unit_id, workout.id).await.is_err());
    assert!(repo.list_by_lead(unit_id, lead_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn appointments_by_range_and_staff() {
    let db = setup().await;
    let repo = SurrealAppointmentRepository::new(db);
    let unit_id = Uuid::new_v4();
    let carla = Uuid::new_v4();
    let diego = Uuid::new_v4();

    let morning = repo.create(appointment(unit_id, carla, at(8, 0))).await.unwrap();
    assert_eq!(morning.status, AppointmentStatus::Scheduled);
    repo.create(appointment(unit_id, carla, at(10, 0))).await.unwrap();
    repo.create(appointment(unit_id, diego, at(8, 30))).await.unwrap();

    let day = repo.list_between(unit_id, at(0, 0), at(23, 59)).await.unwrap();
    assert_eq!(day.len(), 3);
    assert_eq!(day[0].id, morning.id);

    // 08:30-09:30 intersects Carla's 08:00-09:00 only.
    let clash = repo
        .list_for_staff_between(unit_id, carla, at(8, 30), at(9, 30))
        .await
        .unwrap();
    assert_eq!(clash.len(), 1);
    assert_eq!(clash[0].id, morning.id);

    // Touching intervals do not intersect.
    let free = repo
        .list_for_staff_between(unit_id, carla, at(9, 0), at(10, 0))
        .await
        .unwrap();
    assert!(free.is_empty());

    let done = repo
        .update(
            unit_id,
            morning.id,
            UpdateAppointment {
                status: Some(AppointmentStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(done.status, AppointmentStatus::Completed);

    repo.delete(unit_id, morning.id).await.unwrap();
    assert!(repo.get_by_id(unit_id, morning.id).await.is_err());
}
