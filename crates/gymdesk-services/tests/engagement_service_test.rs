//! Automation engine, chat, contracts and the dashboard against
//! in-memory SurrealDB.

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use gymdesk_core::error::{GymError, GymResult};
use gymdesk_core::models::automation::{
    Channel, CreateAutomationRule, DeliveryStatus, TriggerType, UpdateAutomationRule,
};
use gymdesk_core::models::chat::{CreateChatRoom, SenderKind};
use gymdesk_core::models::check_in::{CheckInMethod, CreateCheckIn};
use gymdesk_core::models::contract::ContractStatus;
use gymdesk_core::models::lead::{CreateLead, Lead, LeadStatus};
use gymdesk_core::models::plan::CreatePlan;
use gymdesk_core::models::unit::{CreateUnit, Unit};
use gymdesk_core::repository::{
    CheckInRepository, LeadRepository, Pagination, PlanRepository, UnitRepository,
};
use gymdesk_db::repository::{
    SurrealActivityLogRepository, SurrealAutomationLogRepository,
    SurrealAutomationRuleRepository, SurrealChatRepository, SurrealCheckInRepository,
    SurrealContractRepository, SurrealInvoiceRepository, SurrealLeadRepository,
    SurrealPlanRepository, SurrealSubscriptionRepository, SurrealUnitRepository,
};
use gymdesk_services::{
    ActivityRecorder, AutomationEngine, ChatHub, ChatService, ContractService, MessageSender,
    ReportService, RunSummary, UnitSnapshot,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> (Surreal<Db>, Unit) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gymdesk_db::run_migrations(&db).await.unwrap();
    let unit = SurrealUnitRepository::new(db.clone())
        .create(CreateUnit {
            name: "Academia Centro".into(),
            slug: "centro".into(),
            cnpj: Some("11222333000181".into()),
            phone: None,
            email: None,
            address: Some("Rua Augusta, 100".into()),
            primary_color: None,
            metadata: None,
        })
        .await
        .unwrap();
    (db, unit)
}

fn new_lead(unit_id: Uuid, name: &str) -> CreateLead {
    CreateLead {
        unit_id,
        name: name.into(),
        email: None,
        phone: None,
        cpf: None,
        birth_date: None,
        sex: None,
        source: None,
        status: Some(LeadStatus::Active),
        plan_id: None,
        assigned_to: None,
        notes: None,
        tags: Vec::new(),
    }
}

/// Records WhatsApp and SMS messages; every e-mail delivery fails.
#[derive(Clone, Default)]
struct RecordingSender {
    sent: Arc<Mutex<Vec<(Channel, Uuid, String)>>>,
}

impl MessageSender for RecordingSender {
    async fn send(&self, channel: Channel, lead: &Lead, message: &str) -> GymResult<()> {
        if channel == Channel::Email {
            return Err(GymError::Internal("smtp unavailable".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel, lead.id, message.to_string()));
        Ok(())
    }
}

async fn snapshot(db: &Surreal<Db>, unit: &Unit) -> UnitSnapshot {
    UnitSnapshot::load(
        unit.clone(),
        &SurrealLeadRepository::new(db.clone()),
        &SurrealCheckInRepository::new(db.clone()),
        &SurrealInvoiceRepository::new(db.clone()),
        &SurrealSubscriptionRepository::new(db.clone()),
        &SurrealPlanRepository::new(db.clone()),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn birthday_rules_send_skip_fail_and_never_repeat() {
    let (db, unit) = setup().await;
    let leads = SurrealLeadRepository::new(db.clone());
    let birthday = NaiveDate::from_ymd_opt(1990, 6, 15);

    let ana = leads
        .create(CreateLead {
            phone: Some("11987654321".into()),
            email: Some("ana@example.com".into()),
            birth_date: birthday,
            ..new_lead(unit.id, "Ana Lima")
        })
        .await
        .unwrap();
    // No contact channel at all.
    leads
        .create(CreateLead {
            birth_date: birthday,
            ..new_lead(unit.id, "Bia Souza")
        })
        .await
        .unwrap();
    // Former member.
    leads
        .create(CreateLead {
            phone: Some("11912345678".into()),
            birth_date: birthday,
            status: Some(LeadStatus::Inactive),
            ..new_lead(unit.id, "Caio Reis")
        })
        .await
        .unwrap();

    let sender = RecordingSender::default();
    let engine = AutomationEngine::new(
        SurrealAutomationRuleRepository::new(db.clone()),
        SurrealAutomationLogRepository::new(db.clone()),
        sender.clone(),
    );
    let rule = |name: &str, channel| CreateAutomationRule {
        unit_id: unit.id,
        name: name.into(),
        trigger: TriggerType::Birthday,
        day_offset: 0,
        channel,
        template: "Feliz aniversário, {{first_name}}! Equipe {{unit}}".into(),
    };
    engine
        .create_rule(rule("Aniversário WhatsApp", Channel::WhatsApp))
        .await
        .unwrap();
    engine
        .create_rule(rule("Aniversário e-mail", Channel::Email))
        .await
        .unwrap();
    let paused = engine
        .create_rule(rule("Aniversário SMS", Channel::Sms))
        .await
        .unwrap();
    engine
        .update_rule(
            unit.id,
            paused.id,
            UpdateAutomationRule {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
    let snap = snapshot(&db, &unit).await;

    let summary = engine.run(&snap, today).await.unwrap();
    assert_eq!(
        summary,
        RunSummary {
            sent: 1,
            failed: 1,
            skipped: 2,
            already_done: 0,
        }
    );

    let sent = sender.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, Channel::WhatsApp);
    assert_eq!(sent[0].1, ana.id);
    assert_eq!(sent[0].2, "Feliz aniversário, Ana! Equipe Academia Centro");

    let logs = engine.logs(unit.id, None, Pagination::default()).await.unwrap();
    assert_eq!(logs.total, 4);
    let failed = logs
        .items
        .iter()
        .find(|l| l.status == DeliveryStatus::Failed)
        .unwrap();
    assert_eq!(failed.lead_id, ana.id);
    assert!(failed.error.as_deref().unwrap().contains("smtp unavailable"));

    // Same day again: everything already attempted.
    let again = engine.run(&snap, today).await.unwrap();
    assert_eq!(again.sent + again.failed + again.skipped, 0);
    assert_eq!(again.already_done, 4);
    assert_eq!(sender.sent.lock().unwrap().len(), 1);

    // Nobody has a birthday the next day.
    let next_day = engine.run(&snap, today.succ_opt().unwrap()).await.unwrap();
    assert_eq!(next_day, RunSummary::default());
}

#[tokio::test]
async fn empty_template_is_rejected() {
    let (db, unit) = setup().await;
    let engine = AutomationEngine::new(
        SurrealAutomationRuleRepository::new(db.clone()),
        SurrealAutomationLogRepository::new(db.clone()),
        RecordingSender::default(),
    );
    let result = engine
        .create_rule(CreateAutomationRule {
            unit_id: unit.id,
            name: "Boas-vindas".into(),
            trigger: TriggerType::WelcomeNewLead,
            day_offset: 0,
            channel: Channel::WhatsApp,
            template: "   ".into(),
        })
        .await;
    assert!(matches!(result, Err(GymError::Validation { .. })));
}

#[tokio::test]
async fn posted_messages_reach_subscribers_of_the_unit() {
    let (db, unit) = setup().await;
    let chat = ChatService::new(SurrealChatRepository::new(db.clone()), ChatHub::default());
    let room = chat
        .create_room(CreateChatRoom {
            unit_id: unit.id,
            lead_id: None,
            name: "Recepção".into(),
        })
        .await
        .unwrap();

    let mut inbox = chat.hub().subscribe(unit.id);
    let mut elsewhere = chat.hub().subscribe(Uuid::new_v4());

    let staff_id = Uuid::new_v4();
    let posted = chat
        .post(
            unit.id,
            room.id,
            SenderKind::Staff,
            staff_id,
            "  Bom dia! A academia abre às 6h.  ".into(),
        )
        .await
        .unwrap();
    assert_eq!(posted.body, "Bom dia! A academia abre às 6h.");

    let received = inbox.recv().await.unwrap();
    assert_eq!(received.id, posted.id);
    assert!(elsewhere.try_recv().is_err());

    let history = chat.history(unit.id, room.id, None).await.unwrap();
    assert_eq!(history.len(), 1);

    assert!(matches!(
        chat.post(unit.id, room.id, SenderKind::Lead, staff_id, " ".into())
            .await,
        Err(GymError::Validation { .. })
    ));
    assert!(matches!(
        chat.post(Uuid::new_v4(), room.id, SenderKind::Lead, staff_id, "oi".into())
            .await,
        Err(GymError::NotFound { .. })
    ));
}

#[tokio::test]
async fn contract_is_rendered_from_unit_and_plan() {
    let (db, unit) = setup().await;
    let lead = SurrealLeadRepository::new(db.clone())
        .create(CreateLead {
            cpf: Some("52998224725".into()),
            ..new_lead(unit.id, "Ana Lima")
        })
        .await
        .unwrap();
    let plan = SurrealPlanRepository::new(db.clone())
        .create(CreatePlan {
            unit_id: unit.id,
            name: "Mensal".into(),
            description: None,
            price_cents: 9_990,
            billing_months: 1,
        })
        .await
        .unwrap();

    let contracts = ContractService::new(
        SurrealContractRepository::new(db.clone()),
        ActivityRecorder::new(SurrealActivityLogRepository::new(db.clone())),
    );
    let draft = contracts
        .draft(None, &unit, &lead, Some(&plan))
        .await
        .unwrap();
    assert_eq!(draft.status, ContractStatus::Draft);
    assert!(draft.body.contains("CONTRATANTE: Ana Lima, CPF 529.982.247-25."));
    assert!(draft.body.contains("CNPJ 11.222.333/0001-81"));
    assert!(draft.body.contains("Valor: R$ 99,90 a cada 1 mês(es)"));
    assert!(!draft.body.contains("{{"));

    let signed = contracts.sign(unit.id, None, draft.id).await.unwrap();
    assert_eq!(signed.status, ContractStatus::Signed);
    assert!(signed.signed_at.is_some());

    let edit = contracts
        .edit(unit.id, None, draft.id, "outro texto".into())
        .await;
    assert!(matches!(edit, Err(GymError::Conflict { .. })));

    // Leads from another unit cannot be drafted here.
    let foreign = Lead {
        unit_id: Uuid::new_v4(),
        ..lead
    };
    assert!(matches!(
        contracts.draft(None, &unit, &foreign, None).await,
        Err(GymError::TenantContext)
    ));
}

#[tokio::test]
async fn dashboard_summarises_the_unit() {
    let (db, unit) = setup().await;
    let leads = SurrealLeadRepository::new(db.clone());
    let check_ins = SurrealCheckInRepository::new(db.clone());

    let member = leads.create(new_lead(unit.id, "Ana")).await.unwrap();
    leads.create(new_lead(unit.id, "Bruno")).await.unwrap();
    leads
        .create(CreateLead {
            status: None,
            ..new_lead(unit.id, "Carla")
        })
        .await
        .unwrap();
    check_ins
        .create(CreateCheckIn {
            unit_id: unit.id,
            lead_id: member.id,
            method: CheckInMethod::Manual,
            checked_in_at: None,
            notes: None,
        })
        .await
        .unwrap();

    let reports = ReportService::new(
        leads,
        check_ins,
        SurrealInvoiceRepository::new(db.clone()),
        SurrealSubscriptionRepository::new(db.clone()),
    );
    let today = Utc::now().date_naive();
    let dashboard = reports.dashboard(unit.id, today).await.unwrap();

    assert_eq!(dashboard.funnel.total, 3);
    assert_eq!(dashboard.active_members, 2);
    assert_eq!(dashboard.check_ins_today, 1);
    assert_eq!(dashboard.check_ins_per_day.len(), 30);
    assert_eq!(dashboard.new_leads_per_month.last().unwrap().count, 3);
    assert_eq!(dashboard.monthly_recurring_revenue_cents, 0);

    // Other units see nothing.
    let empty = reports.dashboard(Uuid::new_v4(), today).await.unwrap();
    assert_eq!(empty.funnel.total, 0);
    assert_eq!(empty.check_ins_today, 0);
}
