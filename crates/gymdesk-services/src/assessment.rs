//! Physical assessments: body composition is computed once, at
//! creation, and stored with the measurements.

use gymdesk_core::body_composition::{bmi, compose, round_to};
use gymdesk_core::error::{GymError, GymResult};
use gymdesk_core::models::assessment::{AssessmentInput, CreateAssessment, PhysicalAssessment};
use gymdesk_core::repository::{ActivityLogRepository, AssessmentRepository};
use uuid::Uuid;

use crate::activity::{Activity, ActivityRecorder};

/// Derive the stored results from raw measurements.
pub fn evaluate(input: AssessmentInput) -> GymResult<CreateAssessment> {
    if !(input.weight_kg.is_finite() && input.weight_kg > 0.0) {
        return Err(GymError::validation("weight must be greater than zero"));
    }
    if !(input.height_cm.is_finite() && input.height_cm > 0.0) {
        return Err(GymError::validation("height must be greater than zero"));
    }
    if input.age == 0 || input.age > 120 {
        return Err(GymError::validation("age must be between 1 and 120"));
    }

    let composition = compose(
        input.protocol,
        input.sex,
        input.age,
        input.weight_kg,
        &input.skinfolds,
    );

    Ok(CreateAssessment {
        bmi: bmi(input.weight_kg, input.height_cm).map(|v| round_to(v, 2)),
        body_density: composition.map(|c| round_to(c.body_density, 5)),
        body_fat_percent: composition.map(|c| round_to(c.body_fat_percent, 2)),
        fat_mass_kg: composition.map(|c| round_to(c.fat_mass_kg, 2)),
        lean_mass_kg: composition.map(|c| round_to(c.lean_mass_kg, 2)),
        input,
    })
}

pub struct AssessmentService<R: AssessmentRepository, A: ActivityLogRepository> {
    assessments: R,
    activity: ActivityRecorder<A>,
}

impl<R: AssessmentRepository, A: ActivityLogRepository> AssessmentService<R, A> {
    pub fn new(assessments: R, activity: ActivityRecorder<A>) -> Self {
        Self {
            assessments,
            activity,
        }
    }

    pub async fn create(
        &self,
        actor_id: Option<Uuid>,
        input: AssessmentInput,
    ) -> GymResult<PhysicalAssessment> {
        let assessment = self.assessments.create(evaluate(input)?).await?;

        let summary = match assessment.body_fat_percent {
            Some(fat) => format!("Assessment recorded, body fat {fat:.1}%"),
            None => "Assessment recorded".to_string(),
        };
        self.activity
            .record(Activity::new(
                assessment.unit_id,
                actor_id,
                "assessment.created",
                "assessment",
                assessment.id,
                summary,
            ))
            .await;
        Ok(assessment)
    }

    pub async fn get(&self, unit_id: Uuid, id: Uuid) -> GymResult<PhysicalAssessment> {
        self.assessments.get_by_id(unit_id, id).await
    }

    pub async fn history(
        &self,
        unit_id: Uuid,
        lead_id: Uuid,
    ) -> GymResult<Vec<PhysicalAssessment>> {
        self.assessments.list_by_lead(unit_id, lead_id).await
    }

    pub async fn delete(&self, unit_id: Uuid, actor_id: Option<Uuid>, id: Uuid) -> GymResult<()> {
        self.assessments.delete(unit_id, id).await?;
        self.activity
            .record(Activity::new(
                unit_id,
                actor_id,
                "assessment.deleted",
                "assessment",
                id,
                "Assessment deleted",
            ))
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gymdesk_core::models::assessment::{Protocol, Skinfolds};
    use gymdesk_core::models::lead::Sex;

    fn input(protocol: Protocol, skinfolds: Skinfolds) -> AssessmentInput {
        AssessmentInput {
            unit_id: Uuid::nil(),
            lead_id: Uuid::nil(),
            assessed_at: None,
            sex: Sex::Male,
            age: 30,
            weight_kg: 80.0,
            height_cm: 180.0,
            protocol,
            skinfolds,
            notes: None,
        }
    }

    #[test]
    fn computes_and_rounds_composition() {
        let folds = Skinfolds {
            chest: Some(10.0),
            abdomen: Some(20.0),
            thigh: Some(15.0),
            ..Default::default()
        };
        let out = evaluate(input(Protocol::JacksonPollock3, folds)).unwrap();
        assert_eq!(out.bmi, Some(24.69));
        assert_eq!(out.body_fat_percent, Some(13.61));
        let fat = out.fat_mass_kg.unwrap();
        let lean = out.lean_mass_kg.unwrap();
        assert!((fat + lean - 80.0).abs() < 0.02);
    }

    #[test]
    fn missing_sites_store_measurements_only() {
        let out = evaluate(input(Protocol::JacksonPollock7, Skinfolds::default())).unwrap();
        assert!(out.bmi.is_some());
        assert!(out.body_density.is_none());
        assert!(out.body_fat_percent.is_none());
    }

    #[test]
    fn rejects_impossible_measurements() {
        let mut bad = input(Protocol::None, Skinfolds::default());
        bad.weight_kg = 0.0;
        assert!(evaluate(bad).is_err());

        let mut bad = input(Protocol::None, Skinfolds::default());
        bad.age = 0;
        assert!(evaluate(bad).is_err());
    }
}
