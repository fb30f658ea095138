//! Shared application state and service construction.
//!
//! Repositories are thin wrappers around a cloned SurrealDB handle, so
//! services are built per request instead of being stored.

use std::sync::Arc;

use chrono::Duration;
use gymdesk_auth::{AuthConfig, AuthService};
use gymdesk_core::error::GymResult;
use gymdesk_core::models::unit::Unit;
use gymdesk_core::repository::UnitRepository;
use gymdesk_db::repository::{
    SurrealActivityLogRepository, SurrealAppointmentRepository, SurrealAssessmentRepository,
    SurrealAutomationLogRepository, SurrealAutomationRuleRepository, SurrealChatRepository,
    SurrealCheckInRepository, SurrealContractRepository, SurrealInvoiceRepository,
    SurrealLeadRepository, SurrealPlanRepository, SurrealSessionRepository,
    SurrealStaffRepository, SurrealSubscriptionRepository, SurrealUnitRepository,
    SurrealWorkoutRepository,
};
use gymdesk_services::{
    ActivityRecorder, AssessmentService, AutomationEngine, BillingService, ChatHub, ChatService,
    CheckInService, ContractService, LeadService, MessageSender, ReportService,
    ScheduleService, UnitSnapshot,
};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use uuid::Uuid;

pub type Activity = SurrealActivityLogRepository<Any>;

#[derive(Clone)]
pub struct AppState {
    db: Surreal<Any>,
    auth: Arc<AuthConfig>,
    chat_hub: ChatHub,
    qr_max_age: Option<Duration>,
}

impl AppState {
    pub fn new(db: Surreal<Any>, auth: AuthConfig) -> Self {
        Self {
            db,
            auth: Arc::new(auth),
            chat_hub: ChatHub::default(),
            qr_max_age: None,
        }
    }

    /// Reject QR codes older than `max_age`.
    pub fn with_qr_max_age(mut self, max_age: Duration) -> Self {
        self.qr_max_age = Some(max_age);
        self
    }

    pub fn db(&self) -> &Surreal<Any> {
        &self.db
    }

    pub fn auth_config(&self) -> &AuthConfig {
        &self.auth
    }

    pub fn chat_hub(&self) -> &ChatHub {
        &self.chat_hub
    }

    // -----------------------------------------------------------------------
    // Repositories
    // -----------------------------------------------------------------------

    pub fn units(&self) -> SurrealUnitRepository<Any> {
        SurrealUnitRepository::new(self.db.clone())
    }

    pub fn staff(&self) -> SurrealStaffRepository<Any> {
        match &self.auth.pepper {
            Some(pepper) => SurrealStaffRepository::with_pepper(self.db.clone(), pepper.clone()),
            None => SurrealStaffRepository::new(self.db.clone()),
        }
    }

    pub fn lead_repo(&self) -> SurrealLeadRepository<Any> {
        SurrealLeadRepository::new(self.db.clone())
    }

    pub fn check_in_repo(&self) -> SurrealCheckInRepository<Any> {
        SurrealCheckInRepository::new(self.db.clone())
    }

    pub fn workouts(&self) -> SurrealWorkoutRepository<Any> {
        SurrealWorkoutRepository::new(self.db.clone())
    }

    pub fn plans(&self) -> SurrealPlanRepository<Any> {
        SurrealPlanRepository::new(self.db.clone())
    }

    pub fn invoice_repo(&self) -> SurrealInvoiceRepository<Any> {
        SurrealInvoiceRepository::new(self.db.clone())
    }

    pub fn subscription_repo(&self) -> SurrealSubscriptionRepository<Any> {
        SurrealSubscriptionRepository::new(self.db.clone())
    }

    pub fn sessions(&self) -> SurrealSessionRepository<Any> {
        SurrealSessionRepository::new(self.db.clone())
    }

    pub fn activity_repo(&self) -> Activity {
        SurrealActivityLogRepository::new(self.db.clone())
    }

    pub fn activity(&self) -> ActivityRecorder<Activity> {
        ActivityRecorder::new(self.activity_repo())
    }

    // -----------------------------------------------------------------------
    // Services
    // -----------------------------------------------------------------------

    pub fn auth_service(
        &self,
    ) -> AuthService<SurrealStaffRepository<Any>, SurrealSessionRepository<Any>> {
        AuthService::new(
            self.staff(),
            self.sessions(),
            (*self.auth).clone(),
        )
    }

    pub fn leads(&self) -> LeadService<SurrealLeadRepository<Any>, Activity> {
        LeadService::new(self.lead_repo(), self.activity())
    }

    pub fn check_ins(
        &self,
    ) -> CheckInService<SurrealCheckInRepository<Any>, SurrealLeadRepository<Any>, Activity> {
        let service = CheckInService::new(self.check_in_repo(), self.lead_repo(), self.activity());
        match self.qr_max_age {
            Some(max_age) => service.with_qr_max_age(max_age),
            None => service,
        }
    }

    pub fn schedule(&self) -> ScheduleService<SurrealAppointmentRepository<Any>, Activity> {
        ScheduleService::new(
            SurrealAppointmentRepository::new(self.db.clone()),
            self.activity(),
        )
    }

    pub fn billing(
        &self,
    ) -> BillingService<
        SurrealInvoiceRepository<Any>,
        SurrealSubscriptionRepository<Any>,
        SurrealPlanRepository<Any>,
        Activity,
    > {
        BillingService::new(
            self.invoice_repo(),
            self.subscription_repo(),
            self.plans(),
            self.activity(),
        )
    }

    pub fn contracts(&self) -> ContractService<SurrealContractRepository<Any>, Activity> {
        ContractService::new(
            SurrealContractRepository::new(self.db.clone()),
            self.activity(),
        )
    }

    pub fn assessments(&self) -> AssessmentService<SurrealAssessmentRepository<Any>, Activity> {
        AssessmentService::new(
            SurrealAssessmentRepository::new(self.db.clone()),
            self.activity(),
        )
    }

    pub fn chat(&self) -> ChatService<SurrealChatRepository<Any>> {
        ChatService::new(
            SurrealChatRepository::new(self.db.clone()),
            self.chat_hub.clone(),
        )
    }

    pub fn automation<M: MessageSender>(
        &self,
        sender: M,
    ) -> AutomationEngine<SurrealAutomationRuleRepository<Any>, SurrealAutomationLogRepository<Any>, M>
    {
        AutomationEngine::new(
            SurrealAutomationRuleRepository::new(self.db.clone()),
            SurrealAutomationLogRepository::new(self.db.clone()),
            sender,
        )
    }

    pub fn reports(
        &self,
    ) -> ReportService<
        SurrealLeadRepository<Any>,
        SurrealCheckInRepository<Any>,
        SurrealInvoiceRepository<Any>,
        SurrealSubscriptionRepository<Any>,
    > {
        ReportService::new(
            self.lead_repo(),
            self.check_in_repo(),
            self.invoice_repo(),
            self.subscription_repo(),
        )
    }

    pub async fn unit(&self, unit_id: Uuid) -> GymResult<Unit> {
        self.units().get_by_id(unit_id).await
    }

    pub async fn snapshot(&self, unit: Unit) -> GymResult<UnitSnapshot> {
        UnitSnapshot::load(
            unit,
            &self.lead_repo(),
            &self.check_in_repo(),
            &self.invoice_repo(),
            &self.subscription_repo(),
            &self.plans(),
        )
        .await
    }
}
