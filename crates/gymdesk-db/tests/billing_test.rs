//! Integration tests for plans, subscriptions, invoices and contracts
//! using in-memory SurrealDB.

use chrono::{NaiveDate, Utc};
use gymdesk_core::error::GymError;
use gymdesk_core::models::contract::{ContractStatus, CreateContract, UpdateContract};
use gymdesk_core::models::invoice::{CreateInvoice, InvoiceFilter, InvoiceStatus, PaymentMethod};
use gymdesk_core::models::plan::{
    CreatePlan, CreateSubscription, SubscriptionStatus, UpdatePlan, UpdateSubscription,
};
use gymdesk_core::repository::{
    ContractRepository, InvoiceRepository, Pagination, PlanRepository, SubscriptionRepository,
};
use gymdesk_db::repository::{
    SurrealContractRepository, SurrealInvoiceRepository, SurrealPlanRepository,
    SurrealSubscriptionRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gymdesk_db::run_migrations(&db).await.unwrap();
    db
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn plan(unit_id: Uuid, name: &str, price_cents: i64) -> CreatePlan {
    CreatePlan {
        unit_id,
        name: name.into(),
        description: None,
        price_cents,
        billing_months: 1,
    }
}

fn invoice(unit_id: Uuid, lead_id: Uuid, due: NaiveDate) -> CreateInvoice {
    CreateInvoice {
        unit_id,
        lead_id,
        subscription_id: None,
        description: "Mensalidade".into(),
        amount_cents: 12_990,
        discount_cents: 0,
        due_date: due,
    }
}

#[tokio::test]
async fn plan_names_are_unique_per_unit() {
    let db = setup().await;
    let repo = SurrealPlanRepository::new(db);
    let unit_id = Uuid::new_v4();

    let mensal = repo.create(plan(unit_id, "Mensal", 12_990)).await.unwrap();
    assert!(mensal.active);
    let err = repo.create(plan(unit_id, "Mensal", 9_990)).await.unwrap_err();
    assert!(matches!(err, GymError::AlreadyExists { .. }));

    repo.create(plan(unit_id, "Anual", 99_000)).await.unwrap();
    repo.update(
        unit_id,
        mensal.id,
        UpdatePlan {
            active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(repo.list(unit_id, false).await.unwrap().len(), 2);
    let active = repo.list(unit_id, true).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "Anual");
}

#[tokio::test]
async fn subscriptions_due_for_billing() {
    let db = setup().await;
    let repo = SurrealSubscriptionRepository::new(db);
    let unit_id = Uuid::new_v4();
    let lead_id = Uuid::new_v4();

    let subscribe = |starts_on: NaiveDate| CreateSubscription {
        unit_id,
        lead_id,
        plan_id: Uuid::new_v4(),
        price_cents: 12_990,
        billing_months: 1,
        starts_on,
        ends_on: None,
    };

    let due = repo.create(subscribe(date(2025, 3, 1))).await.unwrap();
    assert_eq!(due.status, SubscriptionStatus::Active);
    assert_eq!(due.next_billing_on, date(2025, 3, 1));

    repo.create(subscribe(date(2025, 3, 20))).await.unwrap();
    let paused = repo.create(subscribe(date(2025, 2, 1))).await.unwrap();
    repo.update(
        unit_id,
        paused.id,
        UpdateSubscription {
            status: Some(SubscriptionStatus::Paused),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let billable = repo
        .list_due_for_billing(unit_id, date(2025, 3, 10))
        .await
        .unwrap();
    assert_eq!(billable.len(), 1);
    assert_eq!(billable[0].id, due.id);

    assert_eq!(repo.list_active(unit_id).await.unwrap().len(), 2);
    assert_eq!(repo.list_by_lead(unit_id, lead_id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn invoice_filters_and_payment() {
    let db = setup().await;
    let repo = SurrealInvoiceRepository::new(db);
    let unit_id = Uuid::new_v4();
    let ana = Uuid::new_v4();
    let bruno = Uuid::new_v4();

    let march = repo.create(invoice(unit_id, ana, date(2025, 3, 10))).await.unwrap();
    assert_eq!(march.status, InvoiceStatus::Pending);
    repo.create(invoice(unit_id, ana, date(2025, 4, 10))).await.unwrap();
    repo.create(invoice(unit_id, bruno, date(2025, 3, 5))).await.unwrap();

    let in_march = repo
        .list(
            unit_id,
            InvoiceFilter {
                due_from: Some(date(2025, 3, 1)),
                due_to: Some(date(2025, 3, 31)),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(in_march.total, 2);
    assert_eq!(in_march.items[0].due_date, date(2025, 3, 5));

    let paid = repo
        .mark_paid(unit_id, march.id, PaymentMethod::Pix, Utc::now())
        .await
        .unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert_eq!(paid.payment_method, Some(PaymentMethod::Pix));
    assert!(paid.paid_at.is_some());

    let anas_pending = repo
        .list(
            unit_id,
            InvoiceFilter {
                status: Some(InvoiceStatus::Pending),
                lead_id: Some(ana),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(anas_pending.total, 1);
    assert_eq!(anas_pending.items[0].due_date, date(2025, 4, 10));
}

#[tokio::test]
async fn contract_lifecycle() {
    let db = setup().await;
    let repo = SurrealContractRepository::new(db);
    let unit_id = Uuid::new_v4();
    let lead_id = Uuid::new_v4();

    let draft = repo
        .create(CreateContract {
            unit_id,
            lead_id,
            plan_id: None,
            body: "Contrato de prestação de serviços".into(),
        })
        .await
        .unwrap();
    assert_eq!(draft.status, ContractStatus::Draft);

    let signed_at = Utc::now();
    let signed = repo
        .update(
            unit_id,
            draft.id,
            UpdateContract {
                status: Some(ContractStatus::Signed),
                signed_at: Some(signed_at),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(signed.status, ContractStatus::Signed);
    assert!(signed.signed_at.is_some());
    assert_eq!(signed.body, draft.body);

    assert_eq!(repo.list_by_lead(unit_id, lead_id).await.unwrap().len(), 1);
}
