use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use gymdesk_core::error::GymError;
use gymdesk_core::models::unit::{Unit, UpdateUnit};
use gymdesk_core::repository::UnitRepository;
use gymdesk_core::mask::only_digits;
use gymdesk_core::theme::{Rgb, ThemePalette};
use gymdesk_core::validation::{
    ContactFields, is_valid_cnpj, normalize_digits, validate_lead_contact,
};
use gymdesk_services::activity::Activity;

use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/unit", get(current).patch(update))
        .route("/unit/theme.css", get(own_theme))
}

async fn current(State(state): State<AppState>, ctx: AuthContext) -> ApiResult<Json<Unit>> {
    Ok(Json(state.unit(ctx.unit_id).await?))
}

/// Normalise documents and colors before they reach storage.
fn clean_update(mut input: UpdateUnit) -> Result<UpdateUnit, GymError> {
    if let Some(name) = &input.name
        && name.trim().is_empty()
    {
        return Err(GymError::validation("unit name must not be empty"));
    }
    validate_lead_contact(ContactFields {
        email: input.email.as_deref(),
        phone: input.phone.as_deref(),
        cpf: None,
    })?;
    if input.cnpj.is_some() {
        input.cnpj = normalize_digits(input.cnpj);
        if let Some(cnpj) = &input.cnpj
            && !is_valid_cnpj(cnpj)
        {
            return Err(GymError::validation("invalid cnpj"));
        }
    }
    input.phone = input.phone.map(|p| only_digits(&p));
    if let Some(color) = &input.primary_color {
        input.primary_color = Some(Rgb::from_hex(color)?.to_hex());
    }
    Ok(input)
}

async fn update(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(body): Json<UpdateUnit>,
) -> ApiResult<Json<Unit>> {
    ctx.require_owner()?;
    let unit = state.units().update(ctx.unit_id, clean_update(body)?).await?;
    state
        .activity()
        .record(Activity::new(
            unit.id,
            Some(ctx.staff_id),
            "unit.updated",
            "unit",
            unit.id,
            "Unit settings updated",
        ))
        .await;
    Ok(Json(unit))
}

fn theme_css(unit: &Unit) -> ApiResult<impl IntoResponse + use<>> {
    let palette = ThemePalette::derive(&unit.primary_color)?;
    let css = format!(":root {{\n{}\n}}\n", palette.css_variables());
    Ok(([(CONTENT_TYPE, "text/css; charset=utf-8")], css))
}

async fn own_theme(State(state): State<AppState>, ctx: AuthContext) -> ApiResult<impl IntoResponse> {
    let unit = state.unit(ctx.unit_id).await?;
    theme_css(&unit)
}

/// Served without authentication so login pages can be branded.
pub async fn public_theme(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let unit = state.units().get_by_slug(&slug).await?;
    theme_css(&unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_normalises_color_and_cnpj() {
        let cleaned = clean_update(UpdateUnit {
            cnpj: Some("11.222.333/0001-81".into()),
            primary_color: Some("#ABC".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cleaned.cnpj.as_deref(), Some("11222333000181"));
        assert_eq!(cleaned.primary_color.as_deref(), Some("#aabbcc"));
    }

    #[test]
    fn update_rejects_bad_values() {
        for input in [
            UpdateUnit {
                cnpj: Some("11.222.333/0001-80".into()),
                ..Default::default()
            },
            UpdateUnit {
                primary_color: Some("blue".into()),
                ..Default::default()
            },
            UpdateUnit {
                name: Some("  ".into()),
                ..Default::default()
            },
            UpdateUnit {
                email: Some("not-an-email".into()),
                ..Default::default()
            },
        ] {
            assert!(matches!(clean_update(input), Err(GymError::Validation { .. })));
        }
    }
}
