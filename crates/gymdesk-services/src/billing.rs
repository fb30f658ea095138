//! Invoicing, subscription billing and payment receipts.

use chrono::{DateTime, Months, NaiveDate, Utc};
use gymdesk_core::error::{GymError, GymResult};
use gymdesk_core::mask::{format_brl, mask_cnpj, mask_cpf};
use gymdesk_core::models::invoice::{
    CreateInvoice, Invoice, InvoiceFilter, InvoiceStatus, PaymentMethod, UpdateInvoice,
};
use gymdesk_core::models::lead::Lead;
use gymdesk_core::models::plan::{
    CreateSubscription, Subscription, SubscriptionStatus, UpdateSubscription,
};
use gymdesk_core::models::unit::Unit;
use gymdesk_core::repository::{
    ActivityLogRepository, InvoiceRepository, PaginatedResult, Pagination, PlanRepository,
    SubscriptionRepository, collect_pages,
};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::activity::{Activity, ActivityRecorder};

fn check_amounts(amount_cents: i64, discount_cents: i64) -> GymResult<()> {
    if amount_cents <= 0 {
        return Err(GymError::validation("amount must be greater than zero"));
    }
    if discount_cents < 0 || discount_cents > amount_cents {
        return Err(GymError::validation(
            "discount must be between zero and the amount",
        ));
    }
    Ok(())
}

pub struct BillingService<I, S, P, A>
where
    I: InvoiceRepository,
    S: SubscriptionRepository,
    P: PlanRepository,
    A: ActivityLogRepository,
{
    invoices: I,
    subscriptions: S,
    plans: P,
    activity: ActivityRecorder<A>,
}

impl<I, S, P, A> BillingService<I, S, P, A>
where
    I: InvoiceRepository,
    S: SubscriptionRepository,
    P: PlanRepository,
    A: ActivityLogRepository,
{
    pub fn new(invoices: I, subscriptions: S, plans: P, activity: ActivityRecorder<A>) -> Self {
        Self {
            invoices,
            subscriptions,
            plans,
            activity,
        }
    }

    // -----------------------------------------------------------------------
    // Invoices
    // -----------------------------------------------------------------------

    pub async fn create_invoice(
        &self,
        actor_id: Option<Uuid>,
        input: CreateInvoice,
    ) -> GymResult<Invoice> {
        if input.description.trim().is_empty() {
            return Err(GymError::validation("description is required"));
        }
        check_amounts(input.amount_cents, input.discount_cents)?;

        let invoice = self.invoices.create(input).await?;
        self.activity
            .record(Activity::new(
                invoice.unit_id,
                actor_id,
                "invoice.created",
                "invoice",
                invoice.id,
                format!(
                    "Invoice \"{}\" of {} created",
                    invoice.description,
                    format_brl(invoice.net_cents())
                ),
            ))
            .await;
        Ok(invoice)
    }

    pub async fn get_invoice(&self, unit_id: Uuid, id: Uuid) -> GymResult<Invoice> {
        self.invoices.get_by_id(unit_id, id).await
    }

    pub async fn list_invoices(
        &self,
        unit_id: Uuid,
        filter: InvoiceFilter,
        pagination: Pagination,
    ) -> GymResult<PaginatedResult<Invoice>> {
        self.invoices.list(unit_id, filter, pagination).await
    }

    pub async fn update_invoice(
        &self,
        unit_id: Uuid,
        actor_id: Option<Uuid>,
        id: Uuid,
        input: UpdateInvoice,
    ) -> GymResult<Invoice> {
        let current = self.invoices.get_by_id(unit_id, id).await?;
        check_amounts(
            input.amount_cents.unwrap_or(current.amount_cents),
            input.discount_cents.unwrap_or(current.discount_cents),
        )?;
        if input.status == Some(InvoiceStatus::Paid) {
            return Err(GymError::validation(
                "use the payment operation to settle an invoice",
            ));
        }

        let invoice = self.invoices.update(unit_id, id, input).await?;
        self.activity
            .record(Activity::new(
                unit_id,
                actor_id,
                "invoice.updated",
                "invoice",
                id,
                format!("Invoice \"{}\" updated", invoice.description),
            ))
            .await;
        Ok(invoice)
    }

    pub async fn delete_invoice(
        &self,
        unit_id: Uuid,
        actor_id: Option<Uuid>,
        id: Uuid,
    ) -> GymResult<()> {
        let invoice = self.invoices.get_by_id(unit_id, id).await?;
        self.invoices.delete(unit_id, id).await?;
        self.activity
            .record(Activity::new(
                unit_id,
                actor_id,
                "invoice.deleted",
                "invoice",
                id,
                format!("Invoice \"{}\" deleted", invoice.description),
            ))
            .await;
        Ok(())
    }

    pub async fn mark_paid(
        &self,
        unit_id: Uuid,
        actor_id: Option<Uuid>,
        id: Uuid,
        method: PaymentMethod,
        paid_at: DateTime<Utc>,
    ) -> GymResult<Invoice> {
        let current = self.invoices.get_by_id(unit_id, id).await?;
        match current.status {
            InvoiceStatus::Paid => {
                return Err(GymError::Conflict {
                    message: "invoice is already paid".into(),
                });
            }
            InvoiceStatus::Cancelled => {
                return Err(GymError::Conflict {
                    message: "cancelled invoices cannot be paid".into(),
                });
            }
            InvoiceStatus::Pending | InvoiceStatus::Overdue => {}
        }

        let invoice = self
            .invoices
            .mark_paid(unit_id, id, method, paid_at)
            .await?;
        self.activity
            .record(
                Activity::new(
                    unit_id,
                    actor_id,
                    "invoice.paid",
                    "invoice",
                    id,
                    format!(
                        "Invoice \"{}\" paid: {} via {method}",
                        invoice.description,
                        format_brl(invoice.net_cents())
                    ),
                )
                .with_metadata(json!({ "method": method, "amount_cents": invoice.net_cents() })),
            )
            .await;
        Ok(invoice)
    }

    pub async fn cancel_invoice(
        &self,
        unit_id: Uuid,
        actor_id: Option<Uuid>,
        id: Uuid,
    ) -> GymResult<Invoice> {
        let current = self.invoices.get_by_id(unit_id, id).await?;
        if current.status == InvoiceStatus::Paid {
            return Err(GymError::Conflict {
                message: "paid invoices cannot be cancelled".into(),
            });
        }

        let invoice = self
            .invoices
            .update(
                unit_id,
                id,
                UpdateInvoice {
                    status: Some(InvoiceStatus::Cancelled),
                    ..Default::default()
                },
            )
            .await?;
        self.activity
            .record(Activity::new(
                unit_id,
                actor_id,
                "invoice.cancelled",
                "invoice",
                id,
                format!("Invoice \"{}\" cancelled", invoice.description),
            ))
            .await;
        Ok(invoice)
    }

    /// Flip Pending invoices due before `today` to Overdue, returning how
    /// many changed.
    pub async fn mark_overdue(&self, unit_id: Uuid, today: NaiveDate) -> GymResult<u64> {
        let Some(yesterday) = today.pred_opt() else {
            return Ok(0);
        };
        let filter = InvoiceFilter {
            status: Some(InvoiceStatus::Pending),
            due_to: Some(yesterday),
            ..Default::default()
        };
        let pending =
            collect_pages(|page| self.invoices.list(unit_id, filter.clone(), page)).await?;

        let mut changed = 0;
        for invoice in pending {
            self.invoices
                .update(
                    unit_id,
                    invoice.id,
                    UpdateInvoice {
                        status: Some(InvoiceStatus::Overdue),
                        ..Default::default()
                    },
                )
                .await?;
            changed += 1;
        }

        if changed > 0 {
            info!(%unit_id, count = changed, "invoices marked overdue");
        }
        Ok(changed)
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Subscribe a lead to a plan at the plan's current price.
    pub async fn subscribe(
        &self,
        unit_id: Uuid,
        actor_id: Option<Uuid>,
        lead_id: Uuid,
        plan_id: Uuid,
        starts_on: NaiveDate,
    ) -> GymResult<Subscription> {
        let plan = self.plans.get_by_id(unit_id, plan_id).await?;
        if !plan.active {
            return Err(GymError::validation(format!(
                "plan {} is no longer offered",
                plan.name
            )));
        }

        let subscription = self
            .subscriptions
            .create(CreateSubscription {
                unit_id,
                lead_id,
                plan_id,
                price_cents: plan.price_cents,
                billing_months: plan.billing_months.max(1),
                starts_on,
                ends_on: None,
            })
            .await?;
        self.activity
            .record(Activity::new(
                unit_id,
                actor_id,
                "subscription.created",
                "subscription",
                subscription.id,
                format!("Subscribed to {}", plan.name),
            ))
            .await;
        Ok(subscription)
    }

    pub async fn subscriptions_of(
        &self,
        unit_id: Uuid,
        lead_id: Uuid,
    ) -> GymResult<Vec<Subscription>> {
        self.subscriptions.list_by_lead(unit_id, lead_id).await
    }

    pub async fn update_subscription(
        &self,
        unit_id: Uuid,
        actor_id: Option<Uuid>,
        id: Uuid,
        input: UpdateSubscription,
    ) -> GymResult<Subscription> {
        if input.price_cents.is_some_and(|p| p <= 0) {
            return Err(GymError::validation("price must be greater than zero"));
        }
        let subscription = self.subscriptions.update(unit_id, id, input).await?;
        self.activity
            .record(Activity::new(
                unit_id,
                actor_id,
                "subscription.updated",
                "subscription",
                id,
                format!("Subscription now {}", subscription.status),
            ))
            .await;
        Ok(subscription)
    }

    /// Issue one invoice for every Active subscription due on or before
    /// `today` and move its next billing date forward by its period.
    /// A subscription whose end date falls before the next billing date
    /// expires.
    pub async fn bill_due_subscriptions(
        &self,
        unit_id: Uuid,
        today: NaiveDate,
    ) -> GymResult<Vec<Invoice>> {
        let due = self
            .subscriptions
            .list_due_for_billing(unit_id, today)
            .await?;

        let mut issued = Vec::with_capacity(due.len());
        for subscription in due {
            let plan_name = match self.plans.get_by_id(unit_id, subscription.plan_id).await {
                Ok(plan) => plan.name,
                Err(GymError::NotFound { .. }) => "Plano".to_string(),
                Err(e) => return Err(e),
            };

            let Some(next) = subscription
                .next_billing_on
                .checked_add_months(Months::new(subscription.billing_months.max(1)))
            else {
                warn!(subscription_id = %subscription.id, "billing date out of range");
                continue;
            };

            let invoice = self
                .invoices
                .create(CreateInvoice {
                    unit_id,
                    lead_id: subscription.lead_id,
                    subscription_id: Some(subscription.id),
                    description: format!(
                        "{plan_name} {}",
                        subscription.next_billing_on.format("%m/%Y")
                    ),
                    amount_cents: subscription.price_cents,
                    discount_cents: 0,
                    due_date: subscription.next_billing_on,
                })
                .await?;

            let expired = subscription.ends_on.is_some_and(|end| end < next);
            self.subscriptions
                .update(
                    unit_id,
                    subscription.id,
                    UpdateSubscription {
                        next_billing_on: Some(next),
                        status: expired.then_some(SubscriptionStatus::Expired),
                        ..Default::default()
                    },
                )
                .await?;

            self.activity
                .record(Activity::new(
                    unit_id,
                    None,
                    "invoice.created",
                    "invoice",
                    invoice.id,
                    format!("Invoice \"{}\" issued for subscription", invoice.description),
                ))
                .await;
            issued.push(invoice);
        }

        if !issued.is_empty() {
            info!(%unit_id, count = issued.len(), "subscription invoices issued");
        }
        Ok(issued)
    }
}

fn method_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "Dinheiro",
        PaymentMethod::Pix => "Pix",
        PaymentMethod::CreditCard => "Cartão de crédito",
        PaymentMethod::DebitCard => "Cartão de débito",
        PaymentMethod::BankSlip => "Boleto",
    }
}

/// Plain-text payment receipt for a paid invoice. The client lays it out
/// as a PDF.
pub fn receipt(unit: &Unit, lead: &Lead, invoice: &Invoice) -> GymResult<String> {
    if invoice.status != InvoiceStatus::Paid {
        return Err(GymError::Conflict {
            message: "receipts are only issued for paid invoices".into(),
        });
    }
    let paid_at = invoice.paid_at.unwrap_or(invoice.updated_at);

    let mut lines = vec![
        "RECIBO DE PAGAMENTO".to_string(),
        String::new(),
        unit.name.clone(),
    ];
    if let Some(cnpj) = &unit.cnpj {
        lines.push(format!("CNPJ: {}", mask_cnpj(cnpj)));
    }
    if let Some(address) = &unit.address {
        lines.push(address.clone());
    }
    lines.push(String::new());
    lines.push(format!("Recebemos de: {}", lead.name));
    if let Some(cpf) = &lead.cpf {
        lines.push(format!("CPF: {}", mask_cpf(cpf)));
    }
    lines.push(format!("Referente a: {}", invoice.description));
    lines.push(format!("Valor: {}", format_brl(invoice.amount_cents)));
    if invoice.discount_cents > 0 {
        lines.push(format!("Desconto: {}", format_brl(invoice.discount_cents)));
    }
    lines.push(format!("Total pago: {}", format_brl(invoice.net_cents())));
    if let Some(method) = invoice.payment_method {
        lines.push(format!("Forma de pagamento: {}", method_label(method)));
    }
    lines.push(format!("Data do pagamento: {}", paid_at.format("%d/%m/%Y")));
    lines.push(format!("Vencimento: {}", invoice.due_date.format("%d/%m/%Y")));
    lines.push(String::new());
    lines.push(format!("Recibo nº {}", invoice.id));

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gymdesk_core::models::lead::LeadStatus;

    fn unit() -> Unit {
        Unit {
            id: Uuid::new_v4(),
            name: "Academia Centro".into(),
            slug: "centro".into(),
            cnpj: Some("11222333000181".into()),
            phone: None,
            email: None,
            address: Some("Rua Augusta, 100".into()),
            primary_color: "#2563eb".into(),
            logo_url: None,
            contract_template: None,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn lead() -> Lead {
        Lead {
            id: Uuid::new_v4(),
            unit_id: Uuid::nil(),
            name: "Ana Lima".into(),
            email: None,
            phone: None,
            cpf: Some("52998224725".into()),
            birth_date: None,
            sex: None,
            source: None,
            status: LeadStatus::Active,
            plan_id: None,
            assigned_to: None,
            notes: None,
            tags: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn invoice(status: InvoiceStatus) -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            unit_id: Uuid::nil(),
            lead_id: Uuid::nil(),
            subscription_id: None,
            description: "Mensal 03/2025".into(),
            amount_cents: 12_990,
            discount_cents: 1_000,
            due_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            status,
            paid_at: Some(Utc.with_ymd_and_hms(2025, 3, 8, 14, 0, 0).unwrap()),
            payment_method: Some(PaymentMethod::Pix),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn amounts_are_checked() {
        assert!(check_amounts(100, 0).is_ok());
        assert!(check_amounts(100, 100).is_ok());
        assert!(check_amounts(0, 0).is_err());
        assert!(check_amounts(100, 101).is_err());
        assert!(check_amounts(100, -1).is_err());
    }

    #[test]
    fn receipt_lists_payment_details() {
        let text = receipt(&unit(), &lead(), &invoice(InvoiceStatus::Paid)).unwrap();
        assert!(text.starts_with("RECIBO DE PAGAMENTO"));
        assert!(text.contains("CNPJ: 11.222.333/0001-81"));
        assert!(text.contains("Recebemos de: Ana Lima"));
        assert!(text.contains("CPF: 529.982.247-25"));
        assert!(text.contains("Desconto: R$ 10,00"));
        assert!(text.contains("Total pago: R$ 119,90"));
        assert!(text.contains("Forma de pagamento: Pix"));
        assert!(text.contains("Data do pagamento: 08/03/2025"));
    }

    #[test]
    fn receipt_requires_payment() {
        let err = receipt(&unit(), &lead(), &invoice(InvoiceStatus::Pending)).unwrap_err();
        assert!(matches!(err, GymError::Conflict { .. }));
    }
}
