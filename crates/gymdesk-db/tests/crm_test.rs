//! Integration tests for leads and check-ins using in-memory SurrealDB.

use chrono::{Duration, TimeZone, Utc};
use gymdesk_core::error::GymError;
use gymdesk_core::models::check_in::{CheckInMethod, CreateCheckIn};
use gymdesk_core::models::lead::{CreateLead, LeadFilter, LeadStatus, Sex, UpdateLead};
use gymdesk_core::repository::{CheckInRepository, LeadRepository, Pagination};
use gymdesk_db::repository::{SurrealCheckInRepository, SurrealLeadRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gymdesk_db::run_migrations(&db).await.unwrap();
    db
}

fn lead(unit_id: Uuid, name: &str) -> CreateLead {
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
async fn create_get_and_update_lead() {
    let db = setup().await;
    let repo = SurrealLeadRepository::new(db);
    let unit_id = Uuid::new_v4();

    let created = repo
        .create(CreateLead {
            email: Some("ana@example.com".into()),
            phone: Some("11987654321".into()),
            birth_date: chrono::NaiveDate::from_ymd_opt(1990, 4, 12),
            sex: Some(Sex::Female),
            tags: vec!["musculação".into()],
            ..lead(unit_id, "Ana Lima")
        })
        .await
        .unwrap();
    assert_eq!(created.status, LeadStatus::Lead);
    assert_eq!(created.sex, Some(Sex::Female));

    let fetched = repo.get_by_id(unit_id, created.id).await.unwrap();
    assert_eq!(fetched.birth_date, created.birth_date);
    assert_eq!(fetched.tags, vec!["musculação".to_string()]);

    let updated = repo
        .update(
            unit_id,
            created.id,
            UpdateLead {
                notes: Some("Prefere manhã".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.notes.as_deref(), Some("Prefere manhã"));
    assert_eq!(updated.email.as_deref(), Some("ana@example.com"));

    let moved = repo
        .set_status(unit_id, created.id, LeadStatus::Negotiation)
        .await
        .unwrap();
    assert_eq!(moved.status, LeadStatus::Negotiation);
}

#[tokio::test]
async fn lead_is_invisible_to_other_units() {
    let db = setup().await;
    let repo = SurrealLeadRepository::new(db);
    let unit_id = Uuid::new_v4();
    let created = repo.create(lead(unit_id, "Ana")).await.unwrap();

    let other = Uuid::new_v4();
    assert!(matches!(
        repo.get_by_id(other, created.id).await.unwrap_err(),
        GymError::NotFound { .. }
    ));

    repo.delete(unit_id, created.id).await.unwrap();
    assert!(repo.get_by_id(unit_id, created.id).await.is_err());
}

#[tokio::test]
async fn list_filters_and_searches() {
    let db = setup().await;
    let repo = SurrealLeadRepository::new(db);
    let unit_id = Uuid::new_v4();
    let instructor = Uuid::new_v4();

    repo.create(CreateLead {
        email: Some("bruno@mail.com".into()),
        phone: Some("11912345678".into()),
        status: Some(LeadStatus::Active),
        assigned_to: Some(instructor),
        ..lead(unit_id, "Bruno Alves")
    })
    .await
    .unwrap();
    repo.create(CreateLead {
        cpf: Some("52998224725".into()),
        ..lead(unit_id, "Carla Dias")
    })
    .await
    .unwrap();
    repo.create(lead(unit_id, "Daniel Brito")).await.unwrap();
    repo.create(lead(Uuid::new_v4(), "Bruna Outra Unidade"))
        .await
        .unwrap();

    let all = repo
        .list(unit_id, LeadFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(all.total, 3);

    let active = repo
        .list(
            unit_id,
            LeadFilter {
                status: Some(LeadStatus::Active),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(active.total, 1);
    assert_eq!(active.items[0].name, "Bruno Alves");

    let by_name = repo
        .list(
            unit_id,
            LeadFilter {
                search: Some("BRU".into()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_name.total, 1);

    let by_cpf = repo
        .list(
            unit_id,
            LeadFilter {
                search: Some("529.982".into()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_cpf.total, 1);
    assert_eq!(by_cpf.items[0].name, "Carla Dias");

    let assigned = repo
        .list(
            unit_id,
            LeadFilter {
                assigned_to: Some(instructor),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(assigned.total, 1);

    let page = repo
        .list(
            unit_id,
            LeadFilter::default(),
            Pagination {
                offset: 2,
                limit: 2,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn counts_leads_per_status() {
    let db = setup().await;
    let repo = SurrealLeadRepository::new(db);
    let unit_id = Uuid::new_v4();

    for status in [LeadStatus::Lead, LeadStatus::Lead, LeadStatus::Active] {
        repo.create(CreateLead {
            status: Some(status),
            ..lead(unit_id, "Lead")
        })
        .await
        .unwrap();
    }

    let mut counts = repo.count_by_status(unit_id).await.unwrap();
    counts.sort_by_key(|(status, _)| status.as_str());
    assert_eq!(
        counts,
        vec![(LeadStatus::Active, 1), (LeadStatus::Lead, 2)]
    );
}

#[tokio::test]
async fn check_ins_are_ordered() {
    let db = setup().await;
    let leads = SurrealLeadRepository::new(db.clone());
    let repo = SurrealCheckInRepository::new(db);
    let unit_id = Uuid::new_v4();
    let member = leads.create(lead(unit_id, "Ana")).await.unwrap();

    let base = Utc.with_ymd_and_hms(2025, 3, 10, 7, 0, 0).unwrap();
    for (offset, method) in [
        (0, CheckInMethod::Manual),
        (1, CheckInMethod::QrCode),
        (2, CheckInMethod::Manual),
    ] {
        repo.create(CreateCheckIn {
            unit_id,
            lead_id: member.id,
            method,
            checked_in_at: Some(base + Duration::days(offset)),
            notes: None,
        })
        .await
        .unwrap();
    }

    let history = repo
        .list_by_lead(unit_id, member.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(history.total, 3);
    assert_eq!(history.items[0].checked_in_at, base + Duration::days(2));

    let window = repo
        .list_between(unit_id, base, base + Duration::days(2))
        .await
        .unwrap();
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].checked_in_at, base);
    assert_eq!(window[1].method, CheckInMethod::QrCode);

    let last = repo.last_for_lead(unit_id, member.id).await.unwrap();
    assert_eq!(last.unwrap().checked_in_at, base + Duration::days(2));

    let none = repo.last_for_lead(unit_id, Uuid::new_v4()).await.unwrap();
    assert!(none.is_none());
}
