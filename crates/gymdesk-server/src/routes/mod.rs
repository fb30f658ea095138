//! HTTP routes.
//!
//! Everything under `/api` except login and refresh requires a bearer
//! token; the unit of every request is taken from the token.

mod activity;
mod assessments;
mod auth;
mod automation;
mod billing;
mod chat;
mod check_ins;
mod contracts;
mod dashboard;
mod exports;
mod leads;
mod schedule;
mod staff;
mod units;
mod workouts;

use axum::Router;
use axum::routing::get;
use gymdesk_core::repository::Pagination;
use serde::Deserialize;

use crate::state::AppState;

const MAX_PAGE: u64 = 500;

/// `?offset=&limit=` on list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination {
            offset: self.offset.unwrap_or(default.offset),
            limit: self.limit.unwrap_or(default.limit).clamp(1, MAX_PAGE),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth::routes())
        .merge(units::routes())
        .merge(staff::routes())
        .merge(leads::routes())
        .merge(check_ins::routes())
        .merge(workouts::routes())
        .merge(schedule::routes())
        .merge(billing::routes())
        .merge(contracts::routes())
        .merge(assessments::routes())
        .merge(chat::routes())
        .merge(automation::routes())
        .merge(activity::routes())
        .merge(dashboard::routes())
        .merge(exports::routes());

    Router::new()
        .route("/health", get(health))
        .route("/units/:slug/theme.css", get(units::public_theme))
        .nest("/api", api)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
