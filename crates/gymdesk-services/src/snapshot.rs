//! Point-in-time view of one unit, loaded once per sweep and shared by
//! the automation engine and the dashboard.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use gymdesk_core::error::GymResult;
use gymdesk_core::models::invoice::{Invoice, InvoiceFilter, InvoiceStatus};
use gymdesk_core::models::lead::{Lead, LeadFilter, LeadStatus};
use gymdesk_core::models::plan::{Plan, Subscription};
use gymdesk_core::models::unit::Unit;
use gymdesk_core::repository::{
    CheckInRepository, InvoiceRepository, LeadRepository, PlanRepository,
    SubscriptionRepository, collect_pages,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UnitSnapshot {
    pub unit: Unit,
    pub leads: Vec<Lead>,
    /// Most recent check-in per Active lead; absent when they never came.
    pub last_check_ins: HashMap<Uuid, DateTime<Utc>>,
    /// Pending and Overdue invoices.
    pub open_invoices: Vec<Invoice>,
    pub active_subscriptions: Vec<Subscription>,
    pub plans: HashMap<Uuid, Plan>,
}

impl UnitSnapshot {
    pub async fn load<L, C, I, S, P>(
        unit: Unit,
        leads: &L,
        check_ins: &C,
        invoices: &I,
        subscriptions: &S,
        plans: &P,
    ) -> GymResult<Self>
    where
        L: LeadRepository,
        C: CheckInRepository,
        I: InvoiceRepository,
        S: SubscriptionRepository,
        P: PlanRepository,
    {
        let unit_id = unit.id;
        let all_leads =
            collect_pages(|page| leads.list(unit_id, LeadFilter::default(), page)).await?;

        let mut last_check_ins = HashMap::new();
        for lead in all_leads.iter().filter(|l| l.status == LeadStatus::Active) {
            if let Some(check_in) = check_ins.last_for_lead(unit_id, lead.id).await? {
                last_check_ins.insert(lead.id, check_in.checked_in_at);
            }
        }

        let mut open_invoices = Vec::new();
        for status in [InvoiceStatus::Pending, InvoiceStatus::Overdue] {
            let filter = InvoiceFilter {
                status: Some(status),
                ..Default::default()
            };
            let rows =
                collect_pages(|page| invoices.list(unit_id, filter.clone(), page)).await?;
            open_invoices.extend(rows);
        }

        let active_subscriptions = subscriptions.list_active(unit_id).await?;
        let plans = plans
            .list(unit_id, false)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(Self {
            unit,
            leads: all_leads,
            last_check_ins,
            open_invoices,
            active_subscriptions,
            plans,
        })
    }

    pub fn lead(&self, id: Uuid) -> Option<&Lead> {
        self.leads.iter().find(|l| l.id == id)
    }

    /// Name of the plan a lead is on: their active subscription first,
    /// then the plan recorded on the lead.
    pub fn plan_name_for(&self, lead: &Lead) -> Option<&str> {
        self.active_subscriptions
            .iter()
            .find(|s| s.lead_id == lead.id)
            .map(|s| s.plan_id)
            .or(lead.plan_id)
            .and_then(|id| self.plans.get(&id))
            .map(|p| p.name.as_str())
    }
}
