//! Dashboard assembly.

use std::collections::HashSet;

use chrono::{Datelike, Days, Months, NaiveDate};
use gymdesk_core::error::{GymError, GymResult};
use gymdesk_core::models::invoice::{Invoice, InvoiceFilter, InvoiceStatus};
use gymdesk_core::models::lead::{LeadFilter, LeadStatus};
use gymdesk_core::reporting::{
    self, DailyCount, LeadFunnel, MonthlyCount, RevenueSummary, start_of_day,
};
use gymdesk_core::repository::{
    CheckInRepository, InvoiceRepository, LeadRepository, SubscriptionRepository, collect_pages,
};
use serde::Serialize;
use uuid::Uuid;

/// Days covered by the check-in chart, today included.
pub const CHECK_IN_WINDOW_DAYS: u64 = 30;
/// Months covered by the new-leads chart, current month included.
pub const NEW_LEADS_MONTHS: u32 = 6;

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub generated_for: NaiveDate,
    pub funnel: LeadFunnel,
    pub active_members: u64,
    pub check_ins_today: u64,
    pub check_ins_per_day: Vec<DailyCount>,
    pub revenue: RevenueSummary,
    pub monthly_recurring_revenue_cents: i64,
    pub active_subscriptions: u64,
    pub new_leads_per_month: Vec<MonthlyCount>,
}

pub struct ReportService<L, C, I, S>
where
    L: LeadRepository,
    C: CheckInRepository,
    I: InvoiceRepository,
    S: SubscriptionRepository,
{
    leads: L,
    check_ins: C,
    invoices: I,
    subscriptions: S,
}

impl<L, C, I, S> ReportService<L, C, I, S>
where
    L: LeadRepository,
    C: CheckInRepository,
    I: InvoiceRepository,
    S: SubscriptionRepository,
{
    pub fn new(leads: L, check_ins: C, invoices: I, subscriptions: S) -> Self {
        Self {
            leads,
            check_ins,
            invoices,
            subscriptions,
        }
    }

    pub async fn dashboard(&self, unit_id: Uuid, today: NaiveDate) -> GymResult<Dashboard> {
        let funnel = reporting::lead_funnel(&self.leads.count_by_status(unit_id).await?);
        let active_members = funnel
            .stages
            .iter()
            .find(|s| s.status == LeadStatus::Active)
            .map(|s| s.count)
            .unwrap_or(0);

        let from = today
            .checked_sub_days(Days::new(CHECK_IN_WINDOW_DAYS - 1))
            .ok_or_else(out_of_range)?;
        let tomorrow = today
            .checked_add_days(Days::new(1))
            .ok_or_else(out_of_range)?;
        let check_ins = self
            .check_ins
            .list_between(unit_id, start_of_day(from), start_of_day(tomorrow))
            .await?;
        let check_ins_per_day = reporting::check_ins_per_day(&check_ins, from, today);
        let check_ins_today = check_ins_per_day.last().map(|d| d.count).unwrap_or(0);

        let invoices = self.invoices_touching_month(unit_id, today).await?;
        let revenue = reporting::revenue_summary(&invoices, today, today);

        let subscriptions = self.subscriptions.list_active(unit_id).await?;

        let leads =
            collect_pages(|page| self.leads.list(unit_id, LeadFilter::default(), page)).await?;

        Ok(Dashboard {
            generated_for: today,
            funnel,
            active_members,
            check_ins_today,
            check_ins_per_day,
            revenue,
            monthly_recurring_revenue_cents: reporting::monthly_recurring_revenue(&subscriptions),
            active_subscriptions: subscriptions.len() as u64,
            new_leads_per_month: reporting::new_leads_per_month(&leads, today, NEW_LEADS_MONTHS),
        })
    }

    /// Invoices due in the month containing `day`, plus those paid in it.
    async fn invoices_touching_month(
        &self,
        unit_id: Uuid,
        day: NaiveDate,
    ) -> GymResult<Vec<Invoice>> {
        let first = day.with_day(1).ok_or_else(out_of_range)?;
        let next = first
            .checked_add_months(Months::new(1))
            .ok_or_else(out_of_range)?;
        let last = next.pred_opt().ok_or_else(out_of_range)?;

        let due = InvoiceFilter {
            due_from: Some(first),
            due_to: Some(last),
            ..Default::default()
        };
        let paid = InvoiceFilter {
            status: Some(InvoiceStatus::Paid),
            paid_from: Some(start_of_day(first)),
            paid_to: Some(start_of_day(next)),
            ..Default::default()
        };

        let mut invoices =
            collect_pages(|page| self.invoices.list(unit_id, due.clone(), page)).await?;
        let seen: HashSet<Uuid> = invoices.iter().map(|i| i.id).collect();
        let paid_in_month =
            collect_pages(|page| self.invoices.list(unit_id, paid.clone(), page)).await?;
        invoices.extend(paid_in_month.into_iter().filter(|i| !seen.contains(&i.id)));
        Ok(invoices)
    }
}

fn out_of_range() -> GymError {
    GymError::validation("date out of range")
}
