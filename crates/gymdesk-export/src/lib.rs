//! GymDesk Export: tabular CSV and XLSX exports of leads, invoices,
//! check-ins and the activity log.

mod error;
mod rows;
mod writer;

pub use error::ExportError;
pub use rows::{Cell, Tabular};
pub use writer::{ExportFormat, export, to_csv, to_xlsx};
