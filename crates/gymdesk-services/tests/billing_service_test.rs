//! Invoices and subscription billing against in-memory SurrealDB.

use chrono::{NaiveDate, Utc};
use gymdesk_core::error::GymError;
use gymdesk_core::models::invoice::{CreateInvoice, InvoiceFilter, InvoiceStatus, PaymentMethod};
use gymdesk_core::models::plan::{CreatePlan, SubscriptionStatus, UpdatePlan, UpdateSubscription};
use gymdesk_core::repository::{Pagination, PlanRepository, SubscriptionRepository};
use gymdesk_db::repository::{
    SurrealActivityLogRepository, SurrealInvoiceRepository, SurrealPlanRepository,
    SurrealSubscriptionRepository,
};
use gymdesk_services::{ActivityRecorder, BillingService};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Billing = BillingService<
    SurrealInvoiceRepository<Db>,
    SurrealSubscriptionRepository<Db>,
    SurrealPlanRepository<Db>,
    SurrealActivityLogRepository<Db>,
>;

async fn setup() -> (Surreal<Db>, Billing) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gymdesk_db::run_migrations(&db).await.unwrap();
    let billing = BillingService::new(
        SurrealInvoiceRepository::new(db.clone()),
        SurrealSubscriptionRepository::new(db.clone()),
        SurrealPlanRepository::new(db.clone()),
        ActivityRecorder::new(SurrealActivityLogRepository::new(db.clone())),
    );
    (db, billing)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn invoice(unit_id: Uuid, lead_id: Uuid, amount: i64, due: NaiveDate) -> CreateInvoice {
    CreateInvoice {
        unit_id,
        lead_id,
        subscription_id: None,
        description: "Mensalidade".into(),
        amount_cents: amount,
        discount_cents: 0,
        due_date: due,
    }
}

#[tokio::test]
async fn invoice_amounts_are_validated() {
    let (_db, billing) = setup().await;
    let unit_id = Uuid::new_v4();
    let lead_id = Uuid::new_v4();

    let zero = billing
        .create_invoice(None, invoice(unit_id, lead_id, 0, date(2025, 3, 10)))
        .await;
    assert!(matches!(zero, Err(GymError::Validation { .. })));

    let too_much_discount = billing
        .create_invoice(
            None,
            CreateInvoice {
                discount_cents: 15_000,
                ..invoice(unit_id, lead_id, 10_000, date(2025, 3, 10))
            },
        )
        .await;
    assert!(matches!(too_much_discount, Err(GymError::Validation { .. })));

    let full_discount = billing
        .create_invoice(
            None,
            CreateInvoice {
                discount_cents: 10_000,
                ..invoice(unit_id, lead_id, 10_000, date(2025, 3, 10))
            },
        )
        .await
        .unwrap();
    assert_eq!(full_discount.net_cents(), 0);
    assert_eq!(full_discount.status, InvoiceStatus::Pending);
}

#[tokio::test]
async fn payment_and_cancellation_transitions() {
    let (_db, billing) = setup().await;
    let unit_id = Uuid::new_v4();
    let lead_id = Uuid::new_v4();

    let open = billing
        .create_invoice(None, invoice(unit_id, lead_id, 12_990, date(2025, 3, 10)))
        .await
        .unwrap();
    let paid = billing
        .mark_paid(unit_id, None, open.id, PaymentMethod::Pix, Utc::now())
        .await
        .unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert_eq!(paid.payment_method, Some(PaymentMethod::Pix));

    assert!(matches!(
        billing
            .mark_paid(unit_id, None, open.id, PaymentMethod::Cash, Utc::now())
            .await,
        Err(GymError::Conflict { .. })
    ));
    assert!(matches!(
        billing.cancel_invoice(unit_id, None, open.id).await,
        Err(GymError::Conflict { .. })
    ));

    let other = billing
        .create_invoice(None, invoice(unit_id, lead_id, 5_000, date(2025, 3, 12)))
        .await
        .unwrap();
    let cancelled = billing.cancel_invoice(unit_id, None, other.id).await.unwrap();
    assert_eq!(cancelled.status, InvoiceStatus::Cancelled);
    assert!(matches!(
        billing
            .mark_paid(unit_id, None, other.id, PaymentMethod::Cash, Utc::now())
            .await,
        Err(GymError::Conflict { .. })
    ));

    // Another unit cannot see the invoice.
    assert!(matches!(
        billing.get_invoice(Uuid::new_v4(), open.id).await,
        Err(GymError::NotFound { .. })
    ));
}

#[tokio::test]
async fn overdue_sweep_only_touches_pending_past_due() {
    let (_db, billing) = setup().await;
    let unit_id = Uuid::new_v4();
    let lead_id = Uuid::new_v4();

    let late = billing
        .create_invoice(None, invoice(unit_id, lead_id, 10_000, date(2025, 3, 5)))
        .await
        .unwrap();
    let due_today = billing
        .create_invoice(None, invoice(unit_id, lead_id, 10_000, date(2025, 3, 10)))
        .await
        .unwrap();
    let paid = billing
        .create_invoice(None, invoice(unit_id, lead_id, 10_000, date(2025, 3, 1)))
        .await
        .unwrap();
    billing
        .mark_paid(unit_id, None, paid.id, PaymentMethod::Cash, Utc::now())
        .await
        .unwrap();

    assert_eq!(billing.mark_overdue(unit_id, date(2025, 3, 10)).await.unwrap(), 1);
    assert_eq!(
        billing.get_invoice(unit_id, late.id).await.unwrap().status,
        InvoiceStatus::Overdue
    );
    assert_eq!(
        billing.get_invoice(unit_id, due_today.id).await.unwrap().status,
        InvoiceStatus::Pending
    );

    // Second run has nothing left to do.
    assert_eq!(billing.mark_overdue(unit_id, date(2025, 3, 10)).await.unwrap(), 0);
}

#[tokio::test]
async fn due_subscriptions_are_billed_once_per_period() {
    let (db, billing) = setup().await;
    let unit_id = Uuid::new_v4();
    let lead_id = Uuid::new_v4();
    let plans = SurrealPlanRepository::new(db.clone());

    let quarterly = plans
        .create(CreatePlan {
            unit_id,
            name: "Trimestral".into(),
            description: None,
            price_cents: 29_900,
            billing_months: 3,
        })
        .await
        .unwrap();

    let subscription = billing
        .subscribe(unit_id, None, lead_id, quarterly.id, date(2025, 1, 15))
        .await
        .unwrap();
    assert_eq!(subscription.price_cents, 29_900);
    assert_eq!(subscription.next_billing_on, date(2025, 1, 15));

    let issued = billing
        .bill_due_subscriptions(unit_id, date(2025, 1, 15))
        .await
        .unwrap();
    assert_eq!(issued.len(), 1);
    assert_eq!(issued[0].description, "Trimestral 01/2025");
    assert_eq!(issued[0].amount_cents, 29_900);
    assert_eq!(issued[0].due_date, date(2025, 1, 15));
    assert_eq!(issued[0].subscription_id, Some(subscription.id));

    let advanced = SurrealSubscriptionRepository::new(db.clone())
        .get_by_id(unit_id, subscription.id)
        .await
        .unwrap();
    assert_eq!(advanced.next_billing_on, date(2025, 4, 15));

    // Nothing due again until April.
    assert!(
        billing
            .bill_due_subscriptions(unit_id, date(2025, 3, 31))
            .await
            .unwrap()
            .is_empty()
    );

    let all = billing
        .list_invoices(
            unit_id,
            InvoiceFilter {
                lead_id: Some(lead_id),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(all.total, 1);
}

#[tokio::test]
async fn subscription_expires_when_end_precedes_next_bill() {
    let (db, billing) = setup().await;
    let unit_id = Uuid::new_v4();
    let plans = SurrealPlanRepository::new(db.clone());
    let monthly = plans
        .create(CreatePlan {
            unit_id,
            name: "Mensal".into(),
            description: None,
            price_cents: 9_990,
            billing_months: 1,
        })
        .await
        .unwrap();

    let subscription = billing
        .subscribe(unit_id, None, Uuid::new_v4(), monthly.id, date(2025, 5, 1))
        .await
        .unwrap();
    billing
        .update_subscription(
            unit_id,
            None,
            subscription.id,
            UpdateSubscription {
                ends_on: Some(date(2025, 5, 20)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let issued = billing
        .bill_due_subscriptions(unit_id, date(2025, 5, 1))
        .await
        .unwrap();
    assert_eq!(issued.len(), 1);

    let after = billing.subscriptions_of(unit_id, subscription.lead_id).await.unwrap();
    assert_eq!(after[0].status, SubscriptionStatus::Expired);

    // Retired plans cannot take new subscribers.
    plans
        .update(
            unit_id,
            monthly.id,
            UpdatePlan {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(matches!(
        billing
            .subscribe(unit_id, None, Uuid::new_v4(), monthly.id, date(2025, 6, 1))
            .await,
        Err(GymError::Validation { .. })
    ));
}
