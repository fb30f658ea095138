//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Unit-scoped repositories
//! require a `unit_id` parameter to enforce tenant isolation.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::GymResult;
use crate::models::{
    activity::{ActivityFilter, ActivityLog, CreateActivityLog},
    appointment::{Appointment, CreateAppointment, UpdateAppointment},
    assessment::{CreateAssessment, PhysicalAssessment},
    automation::{
        AutomationLog, AutomationRule, CreateAutomationLog, CreateAutomationRule,
        UpdateAutomationRule,
    },
    chat::{ChatMessage, ChatRoom, CreateChatMessage, CreateChatRoom},
    check_in::{CheckIn, CreateCheckIn},
    contract::{Contract, CreateContract, UpdateContract},
    invoice::{CreateInvoice, Invoice, InvoiceFilter, PaymentMethod, UpdateInvoice},
    lead::{CreateLead, Lead, LeadFilter, LeadStatus, UpdateLead},
    plan::{
        CreatePlan, CreateSubscription, Plan, Subscription, UpdatePlan, UpdateSubscription,
    },
    session::{CreateSession, Session},
    staff::{CreateStaffMember, StaffMember, UpdateStaffMember},
    unit::{CreateUnit, Unit, UpdateUnit},
    workout::{CreateWorkout, ExerciseInput, UpdateWorkout, Workout},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

impl Pagination {
    /// Rows per round trip when [`collect_pages`] walks a listing.
    pub const CHUNK: u64 = 500;
}

/// A paginated result set.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Fetch every row of a paginated listing, [`Pagination::CHUNK`] rows at
/// a time. Sweeps, reports and exports use this to see the full set.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> GymResult<Vec<T>>
where
    F: FnMut(Pagination) -> Fut,
    Fut: Future<Output = GymResult<PaginatedResult<T>>>,
{
    let mut items = Vec::new();
    let mut offset = 0;
    loop {
        let page = fetch(Pagination {
            offset,
            limit: Pagination::CHUNK,
        })
        .await?;
        let fetched = page.items.len() as u64;
        items.extend(page.items);
        offset += fetched;
        if fetched < Pagination::CHUNK || offset >= page.total {
            return Ok(items);
        }
    }
}

// ---------------------------------------------------------------------------
// Units (global scope)
// ---------------------------------------------------------------------------

pub trait UnitRepository: Send + Sync {
    fn create(&self, input: CreateUnit) -> impl Future<Output = GymResult<Unit>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GymResult<Unit>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = GymResult<Unit>> + Send;
    fn update(&self, id: Uuid, input: UpdateUnit)
    -> impl Future<Output = GymResult<Unit>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = GymResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = GymResult<PaginatedResult<Unit>>> + Send;
}

// ---------------------------------------------------------------------------
// Staff & sessions
// ---------------------------------------------------------------------------

pub trait StaffRepository: Send + Sync {
    fn create(
        &self,
        input: CreateStaffMember,
    ) -> impl Future<Output = GymResult<StaffMember>> + Send;
    fn get_by_id(
        &self,
        unit_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = GymResult<StaffMember>> + Send;
    fn get_by_email(
        &self,
        unit_id: Uuid,
        email: &str,
    ) -> impl Future<Output = GymResult<StaffMember>> + Send;
    fn update(
        &self,
        unit_id: Uuid,
        id: Uuid,
        input: UpdateStaffMember,
    ) -> impl Future<Output = GymResult<StaffMember>> + Send;
    /// Soft-delete: sets status to Inactive.
    fn delete(&self, unit_id: Uuid, id: Uuid) -> impl Future<Output = GymResult<()>> + Send;
    fn list(
        &self,
        unit_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = GymResult<PaginatedResult<StaffMember>>> + Send;
}

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = GymResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        unit_id: Uuid,
        token_hash: &str,
    ) -> impl Future<Output = GymResult<Session>> + Send;
    fn invalidate(&self, unit_id: Uuid, id: Uuid) -> impl Future<Output = GymResult<()>> + Send;
    fn invalidate_staff_sessions(
        &self,
        unit_id: Uuid,
        staff_id: Uuid,
    ) -> impl Future<Output = GymResult<()>> + Send;
    /// Remove expired sessions, returning how many were deleted.
    fn cleanup_expired(&self, unit_id: Uuid) -> impl Future<Output = GymResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// CRM
// ---------------------------------------------------------------------------

pub trait LeadRepository: Send + Sync {
    fn create(&self, input: CreateLead) -> impl Future<Output = GymResult<Lead>> + Send;
    fn get_by_id(&self, unit_id: Uuid, id: Uuid) -> impl Future<Output = GymResult<Lead>> + Send;
    fn update(
        &self,
        unit_id: Uuid,
        id: Uuid,
        input: UpdateLead,
    ) -> impl Future<Output = GymResult<Lead>> + Send;
    fn set_status(
        &self,
        unit_id: Uuid,
        id: Uuid,
        status: LeadStatus,
    ) -> impl Future<Output = GymResult<Lead>> + Send;
    fn delete(&self, unit_id: Uuid, id: Uuid) -> impl Future<Output = GymResult<()>> + Send;
    fn list(
        &self,
        unit_id: Uuid,
        filter: LeadFilter,
        pagination: Pagination,
    ) -> impl Future<Output = GymResult<PaginatedResult<Lead>>> + Send;
    /// Number of leads per pipeline stage. Stages without leads are absent.
    fn count_by_status(
        &self,
        unit_id: Uuid,
    ) -> impl Future<Output = GymResult<Vec<(LeadStatus, u64)>>> + Send;
}

pub trait CheckInRepository: Send + Sync {
    fn create(&self, input: CreateCheckIn) -> impl Future<Output = GymResult<CheckIn>> + Send;
    /// Most recent first.
    fn list_by_lead(
        &self,
        unit_id: Uuid,
        lead_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = GymResult<PaginatedResult<CheckIn>>> + Send;
    /// Check-ins with `from <= checked_in_at < to`, oldest first.
    fn list_between(
        &self,
        unit_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = GymResult<Vec<CheckIn>>> + Send;
    fn last_for_lead(
        &self,
        unit_id: Uuid,
        lead_id: Uuid,
    ) -> impl Future<Output = GymResult<Option<CheckIn>>> + Send;
}

// ---------------------------------------------------------------------------
// Training & schedule
// ---------------------------------------------------------------------------

pub trait WorkoutRepository: Send + Sync {
    fn create(&self, input: CreateWorkout) -> impl Future<Output = GymResult<Workout>> + Send;
    fn get_by_id(
        &self,
        unit_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = GymResult<Workout>> + Send;
    fn list_by_lead(
        &self,
        unit_id: Uuid,
        lead_id: Uuid,
    ) -> impl Future<Output = GymResult<Vec<Workout>>> + Send;
    fn update(
        &self,
        unit_id: Uuid,
        id: Uuid,
        input: UpdateWorkout,
    ) -> impl Future<Output = GymResult<Workout>> + Send;
    /// Replace the whole exercise list, renumbering positions from 0.
    fn replace_exercises(
        &self,
        unit_id: Uuid,
        id: Uuid,
        exercises: Vec<ExerciseInput>,
    ) -> impl Future<Output = GymResult<Workout>> + Send;
    /// Deletes the workout and its exercises.
    fn delete(&self, unit_id: Uuid, id: Uuid) -> impl Future<Output = GymResult<()>> + Send;
}

pub trait AppointmentRepository: Send + Sync {
    fn create(
        &self,
        input: CreateAppointment,
    ) -> impl Future<Output = GymResult<Appointment>> + Send;
    fn get_by_id(
        &self,
        unit_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = GymResult<Appointment>> + Send;
    fn update(
        &self,
        unit_id: Uuid,
        id: Uuid,
        input: UpdateAppointment,
    ) -> impl Future<Output = GymResult<Appointment>> + Send;
    fn delete(&self, unit_id: Uuid, id: Uuid) -> impl Future<Output = GymResult<()>> + Send;
    /// Appointments starting in `[from, to)`, ordered by start.
    fn list_between(
        &self,
        unit_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = GymResult<Vec<Appointment>>> + Send;
    /// Appointments of one staff member intersecting `[from, to)`.
    fn list_for_staff_between(
        &self,
        unit_id: Uuid,
        staff_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = GymResult<Vec<Appointment>>> + Send;
}

// ---------------------------------------------------------------------------
// Billing
// ---------------------------------------------------------------------------

pub trait PlanRepository: Send + Sync {
    fn create(&self, input: CreatePlan) -> impl Future<Output = GymResult<Plan>> + Send;
    fn get_by_id(&self, unit_id: Uuid, id: Uuid) -> impl Future<Output = GymResult<Plan>> + Send;
    fn update(
        &self,
        unit_id: Uuid,
        id: Uuid,
        input: UpdatePlan,
    ) -> impl Future<Output = GymResult<Plan>> + Send;
    fn delete(&self, unit_id: Uuid, id: Uuid) -> impl Future<Output = GymResult<()>> + Send;
    fn list(
        &self,
        unit_id: Uuid,
        active_only: bool,
    ) -> impl Future<Output = GymResult<Vec<Plan>>> + Send;
}

pub trait SubscriptionRepository: Send + Sync {
    /// New subscriptions start Active with `next_billing_on = starts_on`.
    fn create(
        &self,
        input: CreateSubscription,
    ) -> impl Future<Output = GymResult<Subscription>> + Send;
    fn get_by_id(
        &self,
        unit_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = GymResult<Subscription>> + Send;
    fn update(
        &self,
        unit_id: Uuid,
        id: Uuid,
        input: UpdateSubscription,
    ) -> impl Future<Output = GymResult<Subscription>> + Send;
    fn list_by_lead(
        &self,
        unit_id: Uuid,
        lead_id: Uuid,
    ) -> impl Future<Output = GymResult<Vec<Subscription>>> + Send;
    fn list_active(&self, unit_id: Uuid)
    -> impl Future<Output = GymResult<Vec<Subscription>>> + Send;
    /// Active subscriptions whose `next_billing_on` is on or before `on`.
    fn list_due_for_billing(
        &self,
        unit_id: Uuid,
        on: NaiveDate,
    ) -> impl Future<Output = GymResult<Vec<Subscription>>> + Send;
}

pub trait InvoiceRepository: Send + Sync {
    /// New invoices start Pending.
    fn create(&self, input: CreateInvoice) -> impl Future<Output = GymResult<Invoice>> + Send;
    fn get_by_id(
        &self,
        unit_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = GymResult<Invoice>> + Send;
    fn update(
        &self,
        unit_id: Uuid,
        id: Uuid,
        input: UpdateInvoice,
    ) -> impl Future<Output = GymResult<Invoice>> + Send;
    fn delete(&self, unit_id: Uuid, id: Uuid) -> impl Future<Output = GymResult<()>> + Send;
    /// Ordered by due date ascending.
    fn list(
        &self,
        unit_id: Uuid,
        filter: InvoiceFilter,
        pagination: Pagination,
    ) -> impl Future<Output = GymResult<PaginatedResult<Invoice>>> + Send;
    fn mark_paid(
        &self,
        unit_id: Uuid,
        id: Uuid,
        method: PaymentMethod,
        paid_at: DateTime<Utc>,
    ) -> impl Future<Output = GymResult<Invoice>> + Send;
}

pub trait ContractRepository: Send + Sync {
    fn create(&self, input: CreateContract) -> impl Future<Output = GymResult<Contract>> + Send;
    fn get_by_id(
        &self,
        unit_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = GymResult<Contract>> + Send;
    fn update(
        &self,
        unit_id: Uuid,
        id: Uuid,
        input: UpdateContract,
    ) -> impl Future<Output = GymResult<Contract>> + Send;
    fn list_by_lead(
        &self,
        unit_id: Uuid,
        lead_id: Uuid,
    ) -> impl Future<Output = GymResult<Vec<Contract>>> + Send;
}

// ---------------------------------------------------------------------------
// Messaging & automation
// ---------------------------------------------------------------------------

pub trait ChatRepository: Send + Sync {
    fn create_room(&self, input: CreateChatRoom)
    -> impl Future<Output = GymResult<ChatRoom>> + Send;
    fn get_room(&self, unit_id: Uuid, id: Uuid)
    -> impl Future<Output = GymResult<ChatRoom>> + Send;
    fn list_rooms(&self, unit_id: Uuid) -> impl Future<Output = GymResult<Vec<ChatRoom>>> + Send;
    fn post_message(
        &self,
        input: CreateChatMessage,
    ) -> impl Future<Output = GymResult<ChatMessage>> + Send;
    /// Oldest first; with `after`, only messages created strictly later.
    fn list_messages(
        &self,
        unit_id: Uuid,
        room_id: Uuid,
        after: Option<DateTime<Utc>>,
    ) -> impl Future<Output = GymResult<Vec<ChatMessage>>> + Send;
}

pub trait AutomationRuleRepository: Send + Sync {
    fn create(
        &self,
        input: CreateAutomationRule,
    ) -> impl Future<Output = GymResult<AutomationRule>> + Send;
    fn get_by_id(
        &self,
        unit_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = GymResult<AutomationRule>> + Send;
    fn update(
        &self,
        unit_id: Uuid,
        id: Uuid,
        input: UpdateAutomationRule,
    ) -> impl Future<Output = GymResult<AutomationRule>> + Send;
    fn delete(&self, unit_id: Uuid, id: Uuid) -> impl Future<Output = GymResult<()>> + Send;
    fn list(
        &self,
        unit_id: Uuid,
        active_only: bool,
    ) -> impl Future<Output = GymResult<Vec<AutomationRule>>> + Send;
}

pub trait AutomationLogRepository: Send + Sync {
    fn append(
        &self,
        input: CreateAutomationLog,
    ) -> impl Future<Output = GymResult<AutomationLog>> + Send;
    /// Whether the rule already produced an entry for the lead on `run_date`.
    fn exists_for(
        &self,
        unit_id: Uuid,
        rule_id: Uuid,
        lead_id: Uuid,
        run_date: NaiveDate,
    ) -> impl Future<Output = GymResult<bool>> + Send;
    /// Most recent first.
    fn list(
        &self,
        unit_id: Uuid,
        rule_id: Option<Uuid>,
        pagination: Pagination,
    ) -> impl Future<Output = GymResult<PaginatedResult<AutomationLog>>> + Send;
}

// ---------------------------------------------------------------------------
// Activity log & assessments
// ---------------------------------------------------------------------------

pub trait ActivityLogRepository: Send + Sync {
    /// Append a new entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateActivityLog,
    ) -> impl Future<Output = GymResult<ActivityLog>> + Send;
    /// Most recent first.
    fn list(
        &self,
        unit_id: Uuid,
        filter: ActivityFilter,
        pagination: Pagination,
    ) -> impl Future<Output = GymResult<PaginatedResult<ActivityLog>>> + Send;
}

pub trait AssessmentRepository: Send + Sync {
    fn create(
        &self,
        input: CreateAssessment,
    ) -> impl Future<Output = GymResult<PhysicalAssessment>> + Send;
    fn get_by_id(
        &self,
        unit_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = GymResult<PhysicalAssessment>> + Send;
    /// Most recent first.
    fn list_by_lead(
        &self,
        unit_id: Uuid,
        lead_id: Uuid,
    ) -> impl Future<Output = GymResult<Vec<PhysicalAssessment>>> + Send;
    fn delete(&self, unit_id: Uuid, id: Uuid) -> impl Future<Output = GymResult<()>> + Send;
}
