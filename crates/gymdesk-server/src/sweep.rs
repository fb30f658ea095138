//! Periodic per-unit maintenance: overdue invoices, subscription
//! billing, automation rules and expired refresh sessions.
//!
//! A failure in one unit is logged and does not stop the others.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use gymdesk_core::error::GymResult;
use gymdesk_core::models::unit::Unit;
use gymdesk_core::repository::{SessionRepository, UnitRepository, collect_pages};
use gymdesk_services::{LoggingSender, RunSummary};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::state::AppState;

/// What one pass did for one unit.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UnitSweep {
    pub overdue_marked: u64,
    pub invoices_issued: usize,
    pub automation: RunSummary,
    pub sessions_removed: u64,
}

async fn sweep_unit(state: &AppState, unit: Unit, today: NaiveDate) -> GymResult<UnitSweep> {
    let unit_id = unit.id;
    let billing = state.billing();
    let overdue_marked = billing.mark_overdue(unit_id, today).await?;
    let invoices_issued = billing.bill_due_subscriptions(unit_id, today).await?.len();

    let snapshot = state.snapshot(unit).await?;
    let automation = state.automation(LoggingSender).run(&snapshot, today).await?;

    let sessions_removed = state.sessions().cleanup_expired(unit_id).await?;

    Ok(UnitSweep {
        overdue_marked,
        invoices_issued,
        automation,
        sessions_removed,
    })
}

/// Sweep every unit once for `today`, returning how many units succeeded.
pub async fn run_once(state: &AppState, today: NaiveDate) -> GymResult<usize> {
    let repo = state.units();
    let units = collect_pages(|page| repo.list(page)).await?;
    let mut succeeded = 0;

    for unit in units {
        let unit_id = unit.id;
        match sweep_unit(state, unit, today).await {
            Ok(result) => {
                succeeded += 1;
                info!(
                    %unit_id,
                    overdue = result.overdue_marked,
                    issued = result.invoices_issued,
                    sent = result.automation.sent,
                    failed = result.automation.failed,
                    sessions_removed = result.sessions_removed,
                    "unit sweep finished"
                );
            }
            Err(err) => warn!(%unit_id, error = %err, "unit sweep failed"),
        }
    }

    state.chat_hub().prune();
    Ok(succeeded)
}

/// Run [`run_once`] every `interval`, starting immediately.
pub fn spawn(state: AppState, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let today = Utc::now().date_naive();
            if let Err(err) = run_once(&state, today).await {
                warn!(error = %err, "sweep could not list units");
            }
        }
    })
}
