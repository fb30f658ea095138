//! GymDesk Services. Application logic on top of the repository traits:
//! lead pipeline, check-ins, scheduling, billing, contracts, assessments,
//! realtime chat, automation rules and dashboard reports.
//!
//! Services are generic over repository implementations so this crate has
//! no dependency on the database crate.

pub mod activity;
pub mod assessment;
pub mod automation;
pub mod billing;
pub mod chat;
pub mod check_in;
pub mod contract;
pub mod lead;
pub mod reports;
pub mod schedule;
pub mod snapshot;

pub use activity::ActivityRecorder;
pub use assessment::AssessmentService;
pub use automation::{AutomationEngine, LoggingSender, MessageSender, RunSummary};
pub use billing::BillingService;
pub use chat::{ChatHub, ChatService, MessageBuffer};
pub use check_in::CheckInService;
pub use contract::ContractService;
pub use lead::LeadService;
pub use reports::{Dashboard, ReportService};
pub use schedule::ScheduleService;
pub use snapshot::UnitSnapshot;
