//! Lead pipeline, check-in and scheduling services against in-memory
//! SurrealDB.

use chrono::{Duration, TimeZone, Utc};
use gymdesk_core::error::GymError;
use gymdesk_core::models::activity::ActivityFilter;
use gymdesk_core::models::appointment::{
    AppointmentKind, AppointmentStatus, CreateAppointment, UpdateAppointment,
};
use gymdesk_core::models::check_in::CheckInMethod;
use gymdesk_core::models::lead::{CreateLead, LeadStatus, UpdateLead};
use gymdesk_core::qr::QrPayload;
use gymdesk_core::repository::{ActivityLogRepository, Pagination};
use gymdesk_db::repository::{
    SurrealActivityLogRepository, SurrealAppointmentRepository, SurrealCheckInRepository,
    SurrealLeadRepository,
};
use gymdesk_services::{ActivityRecorder, CheckInService, LeadService, ScheduleService};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gymdesk_db::run_migrations(&db).await.unwrap();
    db
}

fn recorder(db: &Surreal<Db>) -> ActivityRecorder<SurrealActivityLogRepository<Db>> {
    ActivityRecorder::new(SurrealActivityLogRepository::new(db.clone()))
}

fn lead_service(
    db: &Surreal<Db>,
) -> LeadService<SurrealLeadRepository<Db>, SurrealActivityLogRepository<Db>> {
    LeadService::new(SurrealLeadRepository::new(db.clone()), recorder(db))
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
        status: None,
        plan_id: None,
        assigned_to: None,
        notes: None,
        tags: Vec::new(),
    }
}

#[tokio::test]
async fn create_lead_normalizes_contact_and_logs_activity() {
    let db = setup().await;
    let service = lead_service(&db);
    let unit_id = Uuid::new_v4();
    let actor = Uuid::new_v4();

    let lead = service
        .create(
            Some(actor),
            CreateLead {
                email: Some("  Ana.Lima@Example.COM ".into()),
                phone: Some("(11) 98765-4321".into()),
                cpf: Some("529.982.247-25".into()),
                ..new_lead(unit_id, "  Ana Lima ")
            },
        )
        .await
        .unwrap();

    assert_eq!(lead.name, "Ana Lima");
    assert_eq!(lead.email.as_deref(), Some("ana.lima@example.com"));
    assert_eq!(lead.phone.as_deref(), Some("11987654321"));
    assert_eq!(lead.cpf.as_deref(), Some("52998224725"));

    let log = SurrealActivityLogRepository::new(db.clone())
        .list(
            unit_id,
            ActivityFilter {
                entity_id: Some(lead.id),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(log.total, 1);
    assert_eq!(log.items[0].action, "lead.created");
    assert_eq!(log.items[0].actor_id, Some(actor));
}

#[tokio::test]
async fn invalid_contact_fields_are_rejected() {
    let db = setup().await;
    let service = lead_service(&db);
    let unit_id = Uuid::new_v4();

    let bad_cpf = service
        .create(
            None,
            CreateLead {
                cpf: Some("111.111.111-11".into()),
                ..new_lead(unit_id, "Bruno")
            },
        )
        .await;
    assert!(matches!(bad_cpf, Err(GymError::Validation { .. })));

    let bad_email = service
        .create(
            None,
            CreateLead {
                email: Some("bruno@".into()),
                ..new_lead(unit_id, "Bruno")
            },
        )
        .await;
    assert!(matches!(bad_email, Err(GymError::Validation { .. })));

    let blank = service.create(None, new_lead(unit_id, "   ")).await;
    assert!(matches!(blank, Err(GymError::Validation { .. })));
}

#[tokio::test]
async fn status_change_records_transition() {
    let db = setup().await;
    let service = lead_service(&db);
    let unit_id = Uuid::new_v4();

    let lead = service.create(None, new_lead(unit_id, "Carla")).await.unwrap();
    let updated = service
        .change_status(unit_id, None, lead.id, LeadStatus::Negotiation)
        .await
        .unwrap();
    assert_eq!(updated.status, LeadStatus::Negotiation);

    let renamed = service
        .update(
            unit_id,
            None,
            lead.id,
            UpdateLead {
                notes: Some("prefere horário noturno".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.notes.as_deref(), Some("prefere horário noturno"));

    let log = SurrealActivityLogRepository::new(db.clone())
        .list(
            unit_id,
            ActivityFilter {
                entity_id: Some(lead.id),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    let change = log
        .items
        .iter()
        .find(|e| e.action == "lead.status_changed")
        .unwrap();
    assert_eq!(change.metadata["from"], "Lead");
    assert_eq!(change.metadata["to"], "Negotiation");
}

#[tokio::test]
async fn qr_check_in_requires_active_member_of_the_unit() {
    let db = setup().await;
    let leads = lead_service(&db);
    let check_ins = CheckInService::new(
        SurrealCheckInRepository::new(db.clone()),
        SurrealLeadRepository::new(db.clone()),
        recorder(&db),
    )
    .with_qr_max_age(Duration::minutes(5));
    let unit_id = Uuid::new_v4();

    let member = leads
        .create(
            None,
            CreateLead {
                status: Some(LeadStatus::Active),
                ..new_lead(unit_id, "Diego")
            },
        )
        .await
        .unwrap();
    let prospect = leads.create(None, new_lead(unit_id, "Elisa")).await.unwrap();

    let now = Utc::now();
    let payload = QrPayload::check_in(member.id, now).encode().unwrap();
    let check_in = check_ins.scan(unit_id, None, &payload, now).await.unwrap();
    assert_eq!(check_in.lead_id, member.id);
    assert_eq!(check_in.method, CheckInMethod::QrCode);

    // Stale code.
    let later = now + Duration::minutes(6);
    assert!(matches!(
        check_ins.scan(unit_id, None, &payload, later).await,
        Err(GymError::Validation { .. })
    ));

    // Another unit's scanner.
    assert!(matches!(
        check_ins.scan(Uuid::new_v4(), None, &payload, now).await,
        Err(GymError::Validation { .. })
    ));

    // Not yet a member.
    let prospect_payload = QrPayload::check_in(prospect.id, now).encode().unwrap();
    assert!(matches!(
        check_ins.scan(unit_id, None, &prospect_payload, now).await,
        Err(GymError::Conflict { .. })
    ));

    assert!(matches!(
        check_ins.scan(unit_id, None, "not a qr code", now).await,
        Err(GymError::Validation { .. })
    ));

    // Front desk can still let the prospect in manually.
    let manual = check_ins
        .manual(unit_id, None, prospect.id, Some("aula experimental".into()))
        .await
        .unwrap();
    assert_eq!(manual.method, CheckInMethod::Manual);

    let history = check_ins
        .history(unit_id, member.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(history.total, 1);
}

fn slot(unit_id: Uuid, staff_id: Uuid, start_hour: u32, end_hour: u32) -> CreateAppointment {
    CreateAppointment {
        unit_id,
        lead_id: None,
        staff_id: Some(staff_id),
        title: "Avaliação física".into(),
        kind: AppointmentKind::Assessment,
        starts_at: Utc.with_ymd_and_hms(2025, 5, 6, start_hour, 0, 0).unwrap(),
        ends_at: Utc.with_ymd_and_hms(2025, 5, 6, end_hour, 0, 0).unwrap(),
        notes: None,
    }
}

#[tokio::test]
async fn staff_cannot_be_double_booked() {
    let db = setup().await;
    let schedule = ScheduleService::new(SurrealAppointmentRepository::new(db.clone()), recorder(&db));
    let unit_id = Uuid::new_v4();
    let trainer = Uuid::new_v4();

    let first = schedule.create(None, slot(unit_id, trainer, 9, 10)).await.unwrap();

    let overlapping = schedule.create(None, slot(unit_id, trainer, 9, 11)).await;
    assert!(matches!(overlapping, Err(GymError::Conflict { .. })));

    // Back-to-back is fine, so is another trainer.
    schedule.create(None, slot(unit_id, trainer, 10, 11)).await.unwrap();
    schedule
        .create(None, slot(unit_id, Uuid::new_v4(), 9, 10))
        .await
        .unwrap();

    let inverted = schedule.create(None, slot(unit_id, trainer, 12, 11)).await;
    assert!(matches!(inverted, Err(GymError::Validation { .. })));

    // Cancelling frees the slot.
    let cancelled = schedule.cancel(unit_id, None, first.id).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    schedule.create(None, slot(unit_id, trainer, 9, 10)).await.unwrap();
}

#[tokio::test]
async fn no_show_keeps_the_slot_taken() {
    let db = setup().await;
    let schedule = ScheduleService::new(SurrealAppointmentRepository::new(db.clone()), recorder(&db));
    let unit_id = Uuid::new_v4();
    let trainer = Uuid::new_v4();

    let missed = schedule.create(None, slot(unit_id, trainer, 9, 10)).await.unwrap();
    let marked = schedule
        .update(
            unit_id,
            None,
            missed.id,
            UpdateAppointment {
                status: Some(AppointmentStatus::NoShow),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(marked.status, AppointmentStatus::NoShow);

    let rebooked = schedule.create(None, slot(unit_id, trainer, 9, 10)).await;
    assert!(matches!(rebooked, Err(GymError::Conflict { .. })));
}

#[tokio::test]
async fn rescheduling_rechecks_the_agenda() {
    let db = setup().await;
    let schedule = ScheduleService::new(SurrealAppointmentRepository::new(db.clone()), recorder(&db));
    let unit_id = Uuid::new_v4();
    let trainer = Uuid::new_v4();

    let morning = schedule.create(None, slot(unit_id, trainer, 8, 9)).await.unwrap();
    schedule.create(None, slot(unit_id, trainer, 10, 11)).await.unwrap();

    // Moving within its own slot does not clash with itself.
    let shortened = schedule
        .update(
            unit_id,
            None,
            morning.id,
            UpdateAppointment {
                ends_at: Some(Utc.with_ymd_and_hms(2025, 5, 6, 8, 30, 0).unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(shortened.starts_at, morning.starts_at);

    let clash = schedule
        .update(
            unit_id,
            None,
            morning.id,
            UpdateAppointment {
                starts_at: Some(Utc.with_ymd_and_hms(2025, 5, 6, 10, 30, 0).unwrap()),
                ends_at: Some(Utc.with_ymd_and_hms(2025, 5, 6, 11, 30, 0).unwrap()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(clash, Err(GymError::Conflict { .. })));

    let day = schedule
        .agenda(
            unit_id,
            Some(trainer),
            Utc.with_ymd_and_hms(2025, 5, 6, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 5, 7, 0, 0, 0).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(day.len(), 2);
}
