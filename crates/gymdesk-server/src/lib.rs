//! GymDesk Server: REST API, realtime chat stream and the periodic
//! billing/automation sweep.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod sweep;

pub use config::Args;
pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::AppState;
