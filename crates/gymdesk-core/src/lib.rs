//! GymDesk Core: domain models, repository traits, error types and the
//! pure utilities shared by every other crate (document validation,
//! input masks, body composition, theme colors, QR payloads, message
//! templates and dashboard aggregations).

pub mod body_composition;
pub mod error;
pub mod mask;
pub mod models;
pub mod qr;
pub mod reporting;
pub mod repository;
pub mod template;
pub mod theme;
pub mod validation;

pub use error::{GymError, GymResult};
