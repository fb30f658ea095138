//! SurrealDB implementation of [`AssessmentRepository`].
//!
//! Skinfold sites are flattened into one nullable column each.

use chrono::{DateTime, Utc};
use gymdesk_core::error::GymResult;
use gymdesk_core::models::assessment::{CreateAssessment, PhysicalAssessment, Skinfolds};
use gymdesk_core::repository::AssessmentRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{first, parse_enum, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AssessmentRow {
    record_id: String,
    unit_id: String,
    lead_id: String,
    assessed_at: DateTime<Utc>,
    sex: String,
    age: u32,
    weight_kg: f64,
    height_cm: f64,
    protocol: String,
    chest: Option<f64>,
    abdomen: Option<f64>,
    thigh: Option<f64>,
    triceps: Option<f64>,
    subscapular: Option<f64>,
    suprailiac: Option<f64>,
    midaxillary: Option<f64>,
    bmi: Option<f64>,
    body_density: Option<f64>,
    body_fat_percent: Option<f64>,
    fat_mass_kg: Option<f64>,
    lean_mass_kg: Option<f64>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl AssessmentRow {
    fn try_into_assessment(self) -> Result<PhysicalAssessment, DbError> {
        Ok(PhysicalAssessment {
            id: parse_uuid(&self.record_id, "assessment")?,
            unit_id: parse_uuid(&self.unit_id, "unit")?,
            lead_id: parse_uuid(&self.lead_id, "lead")?,
            assessed_at: self.assessed_at,
            sex: parse_enum(&self.sex)?,
            age: self.age,
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            protocol: parse_enum(&self.protocol)?,
            skinfolds: Skinfolds {
                chest: self.chest,
                abdomen: self.abdomen,
                thigh: self.thigh,
                triceps: self.triceps,
                subscapular: self.subscapular,
                suprailiac: self.suprailiac,
                midaxillary: self.midaxillary,
            },
            bmi: self.bmi,
            body_density: self.body_density,
            body_fat_percent: self.body_fat_percent,
            fat_mass_kg: self.fat_mass_kg,
            lean_mass_kg: self.lean_mass_kg,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

const SELECT_ONE: &str = "SELECT meta::id(id) AS record_id, * \
                          FROM type::record('assessment', $id) WHERE unit_id = $unit_id";

/// SurrealDB implementation of the assessment repository.
#[derive(Clone)]
pub struct SurrealAssessmentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAssessmentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AssessmentRepository for SurrealAssessmentRepository<C> {
    async fn create(&self, input: CreateAssessment) -> GymResult<PhysicalAssessment> {
        let id = Uuid::new_v4().to_string();
        let data = input.input;
        let folds = data.skinfolds;

        let result = self
            .db
            .query(format!(
                "CREATE type::record('assessment', $id) SET \
                 unit_id = $unit_id, lead_id = $lead_id, assessed_at = $assessed_at, \
                 sex = $sex, age = $age, weight_kg = $weight_kg, height_cm = $height_cm, \
                 protocol = $protocol, chest = $chest, abdomen = $abdomen, \
                 thigh = $thigh, triceps = $triceps, subscapular = $subscapular, \
                 suprailiac = $suprailiac, midaxillary = $midaxillary, bmi = $bmi, \
                 body_density = $body_density, body_fat_percent = $body_fat_percent, \
                 fat_mass_kg = $fat_mass_kg, lean_mass_kg = $lean_mass_kg, \
                 notes = $notes; {SELECT_ONE}"
            ))
            .bind(("id", id.clone()))
            .bind(("unit_id", data.unit_id.to_string()))
            .bind(("lead_id", data.lead_id.to_string()))
            .bind(("assessed_at", data.assessed_at.unwrap_or_else(Utc::now)))
            .bind(("sex", data.sex.as_str()))
            .bind(("age", data.age))
            .bind(("weight_kg", data.weight_kg))
            .bind(("height_cm", data.height_cm))
            .bind(("protocol", data.protocol.as_str()))
            .bind(("chest", folds.chest))
            .bind(("abdomen", folds.abdomen))
            .bind(("thigh", folds.thigh))
            .bind(("triceps", folds.triceps))
            .bind(("subscapular", folds.subscapular))
            .bind(("suprailiac", folds.suprailiac))
            .bind(("midaxillary", folds.midaxillary))
            .bind(("bmi", input.bmi))
            .bind(("body_density", input.body_density))
            .bind(("body_fat_percent", input.body_fat_percent))
            .bind(("fat_mass_kg", input.fat_mass_kg))
            .bind(("lean_mass_kg", input.lean_mass_kg))
            .bind(("notes", data.notes))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("assessment", e))?;

        let rows: Vec<AssessmentRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "assessment", id)?.try_into_assessment()?)
    }

    async fn get_by_id(&self, unit_id: Uuid, id: Uuid) -> GymResult<PhysicalAssessment> {
        let mut result = self
            .db
            .query(SELECT_ONE)
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AssessmentRow> = result.take(0).map_err(DbError::from)?;
        Ok(first(rows, "assessment", id)?.try_into_assessment()?)
    }

    async fn list_by_lead(
        &self,
        unit_id: Uuid,
        lead_id: Uuid,
    ) -> GymResult<Vec<PhysicalAssessment>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM assessment \
                 WHERE unit_id = $unit_id AND lead_id = $lead_id \
                 ORDER BY assessed_at DESC",
            )
            .bind(("unit_id", unit_id.to_string()))
            .bind(("lead_id", lead_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AssessmentRow> = result.take(0).map_err(DbError::from)?;
        let assessments = rows
            .into_iter()
            .map(AssessmentRow::try_into_assessment)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(assessments)
    }

    async fn delete(&self, unit_id: Uuid, id: Uuid) -> GymResult<()> {
        self.db
            .query("DELETE type::record('assessment', $id) WHERE unit_id = $unit_id")
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
