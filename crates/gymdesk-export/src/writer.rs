//! CSV and XLSX writers.

use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::rows::{Cell, Tabular};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

/// UTF-8 CSV with a header row. Fields containing the delimiter, quotes
/// or line breaks are quoted.
pub fn to_csv<T: Tabular>(rows: &[T], delimiter: char) -> Result<Vec<u8>, ExportError> {
    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(|b| b.is_ascii() && !matches!(b, b'"' | b'\n' | b'\r'))
        .ok_or(ExportError::Delimiter(delimiter))?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    writer.write_record(T::headers())?;
    for row in rows {
        writer.write_record(row.row().iter().map(Cell::render))?;
    }
    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// Single-sheet workbook with a bold header row.
pub fn to_xlsx<T: Tabular>(rows: &[T], sheet: &str) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet)?;

    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format("#,##0.00");

    for (col, header) in T::headers().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    for (i, record) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, cell) in record.row().into_iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(text) => {
                    worksheet.write_string(row, col, text)?;
                }
                Cell::Money(cents) => {
                    worksheet.write_number_with_format(row, col, cents as f64 / 100.0, &money)?;
                }
                Cell::Empty => {}
            }
        }
    }
    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();

    Ok(workbook.save_to_buffer()?)
}

/// Dispatch on `format`. CSV uses `;`, which spreadsheet software in
/// Brazilian locales opens without an import dialog.
pub fn export<T: Tabular>(
    rows: &[T],
    format: ExportFormat,
    sheet: &str,
) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Csv => to_csv(rows, ';'),
        ExportFormat::Xlsx => to_xlsx(rows, sheet),
    }
}
