//! SurrealDB repository implementations.

mod activity;
mod appointment;
mod assessment;
mod automation;
mod chat;
mod check_in;
mod contract;
mod invoice;
mod lead;
mod plan;
mod session;
mod staff;
mod support;
mod unit;
mod workout;

pub use activity::SurrealActivityLogRepository;
pub use appointment::SurrealAppointmentRepository;
pub use assessment::SurrealAssessmentRepository;
pub use automation::{SurrealAutomationLogRepository, SurrealAutomationRuleRepository};
pub use chat::SurrealChatRepository;
pub use check_in::SurrealCheckInRepository;
pub use contract::SurrealContractRepository;
pub use invoice::SurrealInvoiceRepository;
pub use lead::SurrealLeadRepository;
pub use plan::{SurrealPlanRepository, SurrealSubscriptionRepository};
pub use session::SurrealSessionRepository;
pub use staff::{SurrealStaffRepository, hash_password};
pub use unit::SurrealUnitRepository;
pub use workout::SurrealWorkoutRepository;
