//! Dashboard aggregations.
//!
//! Pure functions over already-fetched records; the service layer does
//! the fetching.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::Serialize;

use crate::models::check_in::CheckIn;
use crate::models::invoice::{Invoice, InvoiceStatus};
use crate::models::lead::{Lead, LeadStatus};
use crate::models::plan::{Subscription, SubscriptionStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelStage {
    pub status: LeadStatus,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadFunnel {
    /// Every stage in pipeline order, zero-filled.
    pub stages: Vec<FunnelStage>,
    pub total: u64,
    /// Active leads over all leads, `0.0` when there are none.
    pub conversion_rate: f64,
}

pub fn lead_funnel(counts: &[(LeadStatus, u64)]) -> LeadFunnel {
    let stages: Vec<FunnelStage> = LeadStatus::ALL
        .iter()
        .map(|status| FunnelStage {
            status: *status,
            count: counts
                .iter()
                .filter(|(s, _)| s == status)
                .map(|(_, c)| c)
                .sum(),
        })
        .collect();

    let total: u64 = stages.iter().map(|s| s.count).sum();
    let active = stages
        .iter()
        .find(|s| s.status == LeadStatus::Active)
        .map(|s| s.count)
        .unwrap_or(0);

    LeadFunnel {
        stages,
        total,
        conversion_rate: if total == 0 {
            0.0
        } else {
            active as f64 / total as f64
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// One bucket per calendar day (UTC) in `from..=to`, zero-filled.
pub fn check_ins_per_day(check_ins: &[CheckIn], from: NaiveDate, to: NaiveDate) -> Vec<DailyCount> {
    let mut buckets: BTreeMap<NaiveDate, u64> =
        from.iter_days().take_while(|d| *d <= to).map(|d| (d, 0)).collect();

    for check_in in check_ins {
        if let Some(count) = buckets.get_mut(&check_in.checked_in_at.date_naive()) {
            *count += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RevenueSummary {
    /// Paid during the month, by payment date.
    pub received_cents: i64,
    /// Pending and not yet due, due within the month.
    pub pending_cents: i64,
    /// Overdue (or pending past due) with due date within the month.
    pub overdue_cents: i64,
    pub cancelled_cents: i64,
}

fn same_month(date: NaiveDate, month: NaiveDate) -> bool {
    date.year() == month.year() && date.month() == month.month()
}

/// Revenue for the month containing `month`, evaluated on `today`.
/// Amounts are net of discounts.
pub fn revenue_summary(invoices: &[Invoice], month: NaiveDate, today: NaiveDate) -> RevenueSummary {
    let mut summary = RevenueSummary::default();
    for invoice in invoices {
        let net = invoice.net_cents();
        match invoice.status {
            InvoiceStatus::Paid => {
                let paid_on = invoice
                    .paid_at
                    .map(|at| at.date_naive())
                    .unwrap_or(invoice.due_date);
                if same_month(paid_on, month) {
                    summary.received_cents += net;
                }
            }
            InvoiceStatus::Cancelled => {
                if same_month(invoice.due_date, month) {
                    summary.cancelled_cents += net;
                }
            }
            InvoiceStatus::Pending | InvoiceStatus::Overdue => {
                if !same_month(invoice.due_date, month) {
                    continue;
                }
                if invoice.is_overdue_on(today) {
                    summary.overdue_cents += net;
                } else {
                    summary.pending_cents += net;
                }
            }
        }
    }
    summary
}

/// Active subscriptions normalised to a monthly amount.
pub fn monthly_recurring_revenue(subscriptions: &[Subscription]) -> i64 {
    subscriptions
        .iter()
        .filter(|s| s.status == SubscriptionStatus::Active)
        .map(|s| s.price_cents / i64::from(s.billing_months.max(1)))
        .sum()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyCount {
    /// First day of the month.
    pub month: NaiveDate,
    pub count: u64,
}

/// Leads created per month for the `months` months ending with the month
/// containing `today`, oldest first.
pub fn new_leads_per_month(leads: &[Lead], today: NaiveDate, months: u32) -> Vec<MonthlyCount> {
    let Some(current) = today.with_day(1) else {
        return Vec::new();
    };

    (0..months)
        .rev()
        .filter_map(|back| current.checked_sub_months(Months::new(back)))
        .map(|month| MonthlyCount {
            month,
            count: leads
                .iter()
                .filter(|l| same_month(l.created_at.date_naive(), month))
                .count() as u64,
        })
        .collect()
}

/// Start of the UTC day, used to turn date ranges into instant ranges.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    use crate::models::check_in::CheckInMethod;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice(status: InvoiceStatus, due: NaiveDate, amount: i64, discount: i64) -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            unit_id: Uuid::nil(),
            lead_id: Uuid::nil(),
            subscription_id: None,
            description: "Mensalidade".into(),
            amount_cents: amount,
            discount_cents: discount,
            due_date: due,
            status,
            paid_at: None,
            payment_method: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn funnel_is_zero_filled_and_ordered() {
        let funnel = lead_funnel(&[(LeadStatus::Active, 3), (LeadStatus::Lead, 7)]);
        assert_eq!(funnel.stages.len(), LeadStatus::ALL.len());
        assert_eq!(funnel.stages[0].status, LeadStatus::Lead);
        assert_eq!(funnel.stages[0].count, 7);
        assert_eq!(funnel.stages[1].count, 0);
        assert_eq!(funnel.total, 10);
        assert!((funnel.conversion_rate - 0.3).abs() < 1e-9);

        assert_eq!(lead_funnel(&[]).conversion_rate, 0.0);
    }

    #[test]
    fn check_ins_are_bucketed_by_day() {
        let at = |d: u32, h: u32| CheckIn {
            id: Uuid::new_v4(),
            unit_id: Uuid::nil(),
            lead_id: Uuid::nil(),
            method: CheckInMethod::Manual,
            checked_in_at: Utc.with_ymd_and_hms(2025, 3, d, h, 0, 0).unwrap(),
            notes: None,
        };
        let buckets = check_ins_per_day(
            &[at(1, 7), at(1, 19), at(3, 6), at(9, 6)],
            date(2025, 3, 1),
            date(2025, 3, 3),
        );
        let counts: Vec<u64> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 0, 1]);
        assert_eq!(buckets[2].date, date(2025, 3, 3));
    }

    #[test]
    fn revenue_splits_by_status() {
        let month = date(2025, 3, 1);
        let today = date(2025, 3, 15);

        let mut paid = invoice(InvoiceStatus::Paid, date(2025, 2, 28), 10_000, 1_000);
        paid.paid_at = Some(Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap());

        let invoices = vec![
            paid,
            invoice(InvoiceStatus::Pending, date(2025, 3, 20), 12_000, 0),
            invoice(InvoiceStatus::Pending, date(2025, 3, 10), 8_000, 0),
            invoice(InvoiceStatus::Overdue, date(2025, 3, 5), 5_000, 500),
            invoice(InvoiceStatus::Cancelled, date(2025, 3, 1), 3_000, 0),
            invoice(InvoiceStatus::Pending, date(2025, 4, 10), 99_000, 0),
        ];

        let summary = revenue_summary(&invoices, month, today);
        assert_eq!(summary.received_cents, 9_000);
        assert_eq!(summary.pending_cents, 12_000);
        assert_eq!(summary.overdue_cents, 12_500);
        assert_eq!(summary.cancelled_cents, 3_000);
    }

    #[test]
    fn mrr_normalises_billing_periods() {
        let sub = |price: i64, months: u32, status: SubscriptionStatus| Subscription {
            id: Uuid::new_v4(),
            unit_id: Uuid::nil(),
            lead_id: Uuid::nil(),
            plan_id: Uuid::nil(),
            price_cents: price,
            billing_months: months,
            starts_on: date(2025, 1, 1),
            ends_on: None,
            next_billing_on: date(2025, 1, 1),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let subs = vec![
            sub(12_000, 1, SubscriptionStatus::Active),
            sub(30_000, 3, SubscriptionStatus::Active),
            sub(50_000, 1, SubscriptionStatus::Cancelled),
        ];
        assert_eq!(monthly_recurring_revenue(&subs), 22_000);
    }

    #[test]
    fn new_leads_cover_requested_months() {
        let lead_at = |y: i32, m: u32| Lead {
            id: Uuid::new_v4(),
            unit_id: Uuid::nil(),
            name: "Lead".into(),
            email: None,
            phone: None,
            cpf: None,
            birth_date: None,
            sex: None,
            source: None,
            status: LeadStatus::Lead,
            plan_id: None,
            assigned_to: None,
            notes: None,
            tags: Vec::new(),
            created_at: Utc.with_ymd_and_hms(y, m, 10, 0, 0, 0).unwrap(),
            updated_at: Utc::now(),
        };
        let leads = vec![
            lead_at(2025, 1),
            lead_at(2025, 3),
            lead_at(2025, 3),
            lead_at(2024, 12),
        ];
        let series = new_leads_per_month(&leads, date(2025, 3, 18), 3);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].month, date(2025, 1, 1));
        assert_eq!(
            series.iter().map(|m| m.count).collect::<Vec<_>>(),
            vec![1, 0, 2]
        );
    }
}
