//! Field fidelity of CSV and XLSX exports.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use chrono::{NaiveDate, TimeZone, Utc};
use gymdesk_core::models::activity::ActivityLog;
use gymdesk_core::models::check_in::{CheckIn, CheckInMethod};
use gymdesk_core::models::invoice::{Invoice, InvoiceStatus, PaymentMethod};
use gymdesk_core::models::lead::{Lead, LeadStatus};
use gymdesk_export::{ExportError, ExportFormat, Tabular, export, to_csv, to_xlsx};
use uuid::Uuid;

fn lead(name: &str, notes: Option<&str>) -> Lead {
    Lead {
        id: Uuid::new_v4(),
        unit_id: Uuid::nil(),
        name: name.into(),
        email: Some("joao@example.com".into()),
        phone: Some("11987654321".into()),
        cpf: Some("52998224725".into()),
        birth_date: NaiveDate::from_ymd_opt(1988, 11, 3),
        sex: None,
        source: Some("instagram".into()),
        status: LeadStatus::Negotiation,
        plan_id: None,
        assigned_to: None,
        notes: notes.map(Into::into),
        tags: vec!["musculação".into(), "manhã".into()],
        created_at: Utc.with_ymd_and_hms(2025, 2, 1, 14, 30, 0).unwrap(),
        updated_at: Utc::now(),
    }
}

fn read_csv(bytes: &[u8], delimiter: u8) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_reader(bytes);
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

fn read_xlsx(bytes: Vec<u8>, sheet: &str) -> Vec<Vec<Data>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
    let range = workbook.worksheet_range(sheet).unwrap();
    range.rows().map(<[Data]>::to_vec).collect()
}

fn text(value: &str) -> Data {
    Data::String(value.into())
}

fn invoice(description: &str, amount_cents: i64, discount_cents: i64) -> Invoice {
    Invoice {
        id: Uuid::new_v4(),
        unit_id: Uuid::nil(),
        lead_id: Uuid::nil(),
        subscription_id: None,
        description: description.into(),
        amount_cents,
        discount_cents,
        due_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        status: InvoiceStatus::Paid,
        paid_at: Some(Utc.with_ymd_and_hms(2025, 3, 9, 10, 0, 0).unwrap()),
        payment_method: Some(PaymentMethod::Pix),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn csv_round_trips_awkward_text() {
    let tricky = "Prefere treinar às 6h; \"sem\" aulas coletivas,\nretorna em março";
    let leads = vec![
        lead("João Conceição, Jr.", Some(tricky)),
        lead("Zoë Müller", None),
    ];

    for delimiter in [',', ';', '\t'] {
        let bytes = to_csv(&leads, delimiter).unwrap();
        assert!(std::str::from_utf8(&bytes).is_ok());

        let records = read_csv(&bytes, delimiter as u8);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], Lead::headers());
        assert_eq!(records[1][0], "João Conceição, Jr.");
        assert_eq!(records[1][8], tricky);
        assert_eq!(records[2][0], "Zoë Müller");
        assert_eq!(records[2][8], "");
    }
}

#[test]
fn csv_formats_documents_dates_and_status() {
    let records = read_csv(&to_csv(&[lead("Ana", None)], ';').unwrap(), b';');
    let row = &records[1];
    assert_eq!(row[2], "(11) 98765-4321");
    assert_eq!(row[3], "529.982.247-25");
    assert_eq!(row[4], "03/11/1988");
    assert_eq!(row[5], "Negociação");
    assert_eq!(row[7], "musculação, manhã");
    assert_eq!(row[9], "01/02/2025 14:30");
}

#[test]
fn invoice_amounts_are_exported_as_decimals() {
    let invoice = invoice("Mensalidade março", 12_990, 1_000);
    let records = read_csv(&to_csv(&[invoice], ',').unwrap(), b',');
    assert_eq!(
        records[1],
        vec![
            "Mensalidade março",
            "129.90",
            "10.00",
            "119.90",
            "10/03/2025",
            "Pago",
            "09/03/2025 10:00",
            "Pix",
        ]
    );
}

#[test]
fn check_ins_and_activity_have_one_column_per_header() {
    let check_in = CheckIn {
        id: Uuid::new_v4(),
        unit_id: Uuid::nil(),
        lead_id: Uuid::new_v4(),
        method: CheckInMethod::QrCode,
        checked_in_at: Utc::now(),
        notes: None,
    };
    assert_eq!(check_in.row().len(), CheckIn::headers().len());

    let entry = ActivityLog {
        id: Uuid::new_v4(),
        unit_id: Uuid::nil(),
        actor_id: None,
        action: "lead.created".into(),
        entity_type: "lead".into(),
        entity_id: Some(Uuid::new_v4()),
        description: "Lead Ana criado".into(),
        metadata: serde_json::json!({}),
        created_at: Utc::now(),
    };
    assert_eq!(entry.row().len(), ActivityLog::headers().len());

    let records = read_csv(&to_csv(&[entry], ',').unwrap(), b',');
    assert_eq!(records[1][1], "lead.created");
    assert_eq!(records[1][5], "");
}

#[test]
fn empty_export_still_has_headers() {
    let rows: Vec<Lead> = Vec::new();
    let records = read_csv(&to_csv(&rows, ',').unwrap(), b',');
    assert_eq!(records.len(), 1);
}

#[test]
fn unusable_delimiters_are_rejected() {
    let leads = vec![lead("Ana", None)];
    assert!(matches!(to_csv(&leads, '"'), Err(ExportError::Delimiter('"'))));
    assert!(matches!(to_csv(&leads, 'ç'), Err(ExportError::Delimiter('ç'))));
}

#[test]
fn xlsx_is_a_zip_workbook() {
    let leads = vec![lead("Ana", Some("observação"))];
    let bytes = to_xlsx(&leads, "Leads").unwrap();
    assert!(bytes.len() > 100);
    assert_eq!(&bytes[..2], b"PK");

    // Sheet names are limited to 31 characters.
    let long_name = "x".repeat(40);
    assert!(matches!(
        to_xlsx(&leads, &long_name),
        Err(ExportError::Xlsx(_))
    ));
}

#[test]
fn xlsx_cells_read_back_as_written() {
    let notes = "Prefere treinar às 6h; \"sem\" aulas coletivas, só musculação";
    let leads = vec![
        lead("Luíza \"Lu\" Martins", Some(notes)),
        lead("Zoë Müller", None),
    ];
    let rows = read_xlsx(to_xlsx(&leads, "Leads").unwrap(), "Leads");

    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[0],
        Lead::headers().iter().map(|h| text(h)).collect::<Vec<_>>()
    );
    assert_eq!(rows[1][0], text("Luíza \"Lu\" Martins"));
    assert_eq!(rows[1][3], text("529.982.247-25"));
    assert_eq!(rows[1][5], text("Negociação"));
    assert_eq!(rows[1][7], text("musculação, manhã"));
    assert_eq!(rows[1][8], text(notes));
    assert_eq!(rows[2][0], text("Zoë Müller"));
    assert_eq!(rows[2][8], Data::Empty);
}

#[test]
fn xlsx_money_cells_are_numbers() {
    let invoices = vec![
        invoice("Plano trimestral \"promo\"", 34_990, 4_999),
        invoice("Avaliação física", 8_000, 0),
    ];
    let rows = read_xlsx(to_xlsx(&invoices, "Faturas").unwrap(), "Faturas");

    let money = |cell: &Data| match cell {
        Data::Float(value) => *value,
        other => panic!("expected a number, got {other:?}"),
    };
    assert_eq!(rows[1][0], text("Plano trimestral \"promo\""));
    assert!((money(&rows[1][1]) - 349.90).abs() < 1e-9);
    assert!((money(&rows[1][2]) - 49.99).abs() < 1e-9);
    assert!((money(&rows[1][3]) - 299.91).abs() < 1e-9);
    assert_eq!(rows[1][5], text("Pago"));

    assert_eq!(rows[2][0], text("Avaliação física"));
    assert!((money(&rows[2][1]) - 80.0).abs() < 1e-9);
    assert!(money(&rows[2][2]).abs() < 1e-9);
}

#[test]
fn export_dispatches_on_format() {
    let leads = vec![lead("Ana", None)];
    let csv = export(&leads, ExportFormat::Csv, "Leads").unwrap();
    assert!(String::from_utf8(csv).unwrap().starts_with("Nome;E-mail;"));
    let xlsx = export(&leads, ExportFormat::Xlsx, "Leads").unwrap();
    assert_eq!(&xlsx[..2], b"PK");
    assert_eq!(ExportFormat::Xlsx.extension(), "xlsx");
}
