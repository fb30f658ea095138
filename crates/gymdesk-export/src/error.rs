//! Export error types and conversions.

use gymdesk_core::error::GymError;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid delimiter: {0:?}")]
    Delimiter(char),
}

impl From<ExportError> for GymError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Delimiter(_) => GymError::validation(err.to_string()),
            other => GymError::Export(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_delimiter_is_a_validation_error() {
        assert!(matches!(
            GymError::from(ExportError::Delimiter('é')),
            GymError::Validation { .. }
        ));
    }

    #[test]
    fn writer_failures_are_export_errors() {
        let io = std::io::Error::other("disk full");
        assert!(matches!(
            GymError::from(ExportError::from(io)),
            GymError::Export(_)
        ));
    }
}
