//! Body composition from skinfold measurements.
//!
//! Body density comes from the published Jackson-Pollock (3 and 7 site)
//! and Guedes regressions; fat percentage from the Siri equation. Every
//! function returns `None` when a required input is missing or not
//! strictly positive.

use serde::{Deserialize, Serialize};

use crate::models::assessment::{Protocol, Skinfolds};
use crate::models::lead::Sex;

/// Derived values stored alongside an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyComposition {
    pub body_density: f64,
    pub body_fat_percent: f64,
    pub fat_mass_kg: f64,
    pub lean_mass_kg: f64,
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite() && *x > 0.0)
}

/// Sum the listed sites, failing if any is absent.
fn sum_sites(sites: &[Option<f64>]) -> Option<f64> {
    sites.iter().try_fold(0.0, |acc, s| positive(*s).map(|v| acc + v))
}

/// Sites required by a protocol for the given sex, in the order the
/// regression lists them.
pub fn required_sites(protocol: Protocol, sex: Sex, folds: &Skinfolds) -> Option<Vec<Option<f64>>> {
    let sites = match (protocol, sex) {
        (Protocol::JacksonPollock3, Sex::Male) => vec![folds.chest, folds.abdomen, folds.thigh],
        (Protocol::JacksonPollock3, Sex::Female) => {
            vec![folds.triceps, folds.suprailiac, folds.thigh]
        }
        (Protocol::JacksonPollock7, _) => vec![
            folds.chest,
            folds.midaxillary,
            folds.triceps,
            folds.subscapular,
            folds.abdomen,
            folds.suprailiac,
            folds.thigh,
        ],
        (Protocol::Guedes, Sex::Male) => vec![folds.triceps, folds.suprailiac, folds.abdomen],
        (Protocol::Guedes, Sex::Female) => {
            vec![folds.subscapular, folds.suprailiac, folds.thigh]
        }
        (Protocol::None, _) => return None,
    };
    Some(sites)
}

/// Body density (g/cm³) for the protocol, or `None` when inputs are
/// missing.
pub fn body_density(protocol: Protocol, sex: Sex, age: u32, folds: &Skinfolds) -> Option<f64> {
    let sum = sum_sites(&required_sites(protocol, sex, folds)?)?;
    let age = f64::from(age);

    let density = match (protocol, sex) {
        (Protocol::JacksonPollock3, Sex::Male) => {
            1.10938 - 0.0008267 * sum + 0.0000016 * sum * sum - 0.0002574 * age
        }
        (Protocol::JacksonPollock3, Sex::Female) => {
            1.0994921 - 0.0009929 * sum + 0.0000023 * sum * sum - 0.0001392 * age
        }
        (Protocol::JacksonPollock7, Sex::Male) => {
            1.112 - 0.00043499 * sum + 0.00000055 * sum * sum - 0.00028826 * age
        }
        (Protocol::JacksonPollock7, Sex::Female) => {
            1.097 - 0.00046971 * sum + 0.00000056 * sum * sum - 0.00012828 * age
        }
        (Protocol::Guedes, Sex::Male) => 1.17136 - 0.06706 * sum.log10(),
        (Protocol::Guedes, Sex::Female) => 1.16650 - 0.07063 * sum.log10(),
        (Protocol::None, _) => return None,
    };

    (density > 0.0).then_some(density)
}

/// Siri equation: fat percentage from body density.
pub fn siri_body_fat(density: f64) -> f64 {
    (4.95 / density - 4.50) * 100.0
}

/// Body mass index (kg/m²).
pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    let weight = positive(Some(weight_kg))?;
    let height_m = positive(Some(height_cm))? / 100.0;
    Some(weight / (height_m * height_m))
}

/// Full composition: density, fat %, fat mass and lean mass.
pub fn compose(
    protocol: Protocol,
    sex: Sex,
    age: u32,
    weight_kg: f64,
    folds: &Skinfolds,
) -> Option<BodyComposition> {
    let weight = positive(Some(weight_kg))?;
    let density = body_density(protocol, sex, age, folds)?;
    let fat_percent = siri_body_fat(density);
    let fat_mass = weight * fat_percent / 100.0;
    Some(BodyComposition {
        body_density: density,
        body_fat_percent: fat_percent,
        fat_mass_kg: fat_mass,
        lean_mass_kg: weight - fat_mass,
    })
}

/// Round to `places` decimals for display and storage.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
