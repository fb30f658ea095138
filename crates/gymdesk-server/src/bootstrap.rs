//! First-start seeding of a unit and its owner.
//!
//! Every route below `/api` needs a staff token, so a fresh deployment
//! gets its first unit and Owner here. Running it again is a no-op.

use gymdesk_core::error::{GymError, GymResult};
use gymdesk_core::models::staff::{CreateStaffMember, StaffRole};
use gymdesk_core::models::unit::CreateUnit;
use gymdesk_core::repository::{StaffRepository, UnitRepository};
use gymdesk_core::validation::{MIN_PASSWORD_LEN, is_valid_email};
use tracing::info;
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub unit_name: String,
    pub unit_slug: String,
    pub owner_name: String,
    pub owner_email: String,
    pub owner_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapOutcome {
    pub unit_id: Uuid,
    pub unit_created: bool,
    pub owner_created: bool,
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

impl Bootstrap {
    fn validate(&self) -> GymResult<()> {
        if !is_valid_slug(&self.unit_slug) {
            return Err(GymError::validation(format!(
                "invalid unit slug: {}",
                self.unit_slug
            )));
        }
        if self.unit_name.trim().is_empty() || self.owner_name.trim().is_empty() {
            return Err(GymError::validation("unit and owner names are required"));
        }
        if !is_valid_email(&self.owner_email) {
            return Err(GymError::validation("invalid owner email"));
        }
        if self.owner_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(GymError::validation(format!(
                "owner password must have at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// Create the unit and its Owner unless they already exist. An existing
/// owner keeps their current password.
pub async fn ensure(state: &AppState, seed: &Bootstrap) -> GymResult<BootstrapOutcome> {
    seed.validate()?;

    let units = state.units();
    let (unit, unit_created) = match units.get_by_slug(&seed.unit_slug).await {
        Ok(unit) => (unit, false),
        Err(GymError::NotFound { .. }) => {
            let unit = units
                .create(CreateUnit {
                    name: seed.unit_name.trim().to_string(),
                    slug: seed.unit_slug.clone(),
                    cnpj: None,
                    phone: None,
                    email: None,
                    address: None,
                    primary_color: None,
                    metadata: None,
                })
                .await?;
            (unit, true)
        }
        Err(err) => return Err(err),
    };

    let staff = state.staff();
    let email = seed.owner_email.trim().to_lowercase();
    let owner_created = match staff.get_by_email(unit.id, &email).await {
        Ok(_) => false,
        Err(GymError::NotFound { .. }) => {
            staff
                .create(CreateStaffMember {
                    unit_id: unit.id,
                    name: seed.owner_name.trim().to_string(),
                    email,
                    password: seed.owner_password.clone(),
                    role: StaffRole::Owner,
                })
                .await?;
            true
        }
        Err(err) => return Err(err),
    };

    info!(
        unit_id = %unit.id,
        slug = %unit.slug,
        unit_created,
        owner_created,
        "bootstrap checked"
    );
    Ok(BootstrapOutcome {
        unit_id: unit.id,
        unit_created,
        owner_created,
    })
}
