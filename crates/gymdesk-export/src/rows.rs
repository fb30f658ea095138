//! Row shapes for every exportable record.
//!
//! Column labels are in Portuguese: the files are opened by gym staff in
//! spreadsheet software.

use chrono::{DateTime, NaiveDate, Utc};
use gymdesk_core::mask::{mask_cpf, mask_phone};
use gymdesk_core::models::activity::ActivityLog;
use gymdesk_core::models::check_in::{CheckIn, CheckInMethod};
use gymdesk_core::models::invoice::{Invoice, InvoiceStatus, PaymentMethod};
use gymdesk_core::models::lead::{Lead, LeadStatus};

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    /// Written as a number in XLSX, with two decimals in CSV.
    Money(i64),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn optional(value: Option<impl Into<String>>) -> Self {
        value.map(|v| Cell::Text(v.into())).unwrap_or(Cell::Empty)
    }

    /// CSV rendering. Money uses a dot as decimal separator.
    pub fn render(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Money(cents) => {
                let sign = if *cents < 0 { "-" } else { "" };
                let abs = cents.unsigned_abs();
                format!("{sign}{}.{:02}", abs / 100, abs % 100)
            }
            Cell::Empty => String::new(),
        }
    }
}

/// A record that can be written as one spreadsheet row.
pub trait Tabular {
    fn headers() -> &'static [&'static str];
    fn row(&self) -> Vec<Cell>;
}

fn date(d: NaiveDate) -> Cell {
    Cell::Text(d.format("%d/%m/%Y").to_string())
}

fn timestamp(t: DateTime<Utc>) -> Cell {
    Cell::Text(t.format("%d/%m/%Y %H:%M").to_string())
}

fn lead_status(status: LeadStatus) -> &'static str {
    match status {
        LeadStatus::Lead => "Lead",
        LeadStatus::VisitScheduled => "Visita agendada",
        LeadStatus::Negotiation => "Negociação",
        LeadStatus::Active => "Ativo",
        LeadStatus::Inactive => "Inativo",
        LeadStatus::Cancelled => "Cancelado",
    }
}

fn invoice_status(status: InvoiceStatus) -> &'static str {
    match status {
        InvoiceStatus::Pending => "Pendente",
        InvoiceStatus::Paid => "Pago",
        InvoiceStatus::Overdue => "Vencido",
        InvoiceStatus::Cancelled => "Cancelado",
    }
}

fn payment_method(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "Dinheiro",
        PaymentMethod::Pix => "Pix",
        PaymentMethod::CreditCard => "Cartão de crédito",
        PaymentMethod::DebitCard => "Cartão de débito",
        PaymentMethod::BankSlip => "Boleto",
    }
}

impl Tabular for Lead {
    fn headers() -> &'static [&'static str] {
        &[
            "Nome",
            "E-mail",
            "Telefone",
            "CPF",
            "Nascimento",
            "Status",
            "Origem",
            "Tags",
            "Observações",
            "Cadastrado em",
        ]
    }

    fn row(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.name),
            Cell::optional(self.email.as_deref()),
            Cell::optional(self.phone.as_deref().map(mask_phone)),
            Cell::optional(self.cpf.as_deref().map(mask_cpf)),
            self.birth_date.map(date).unwrap_or(Cell::Empty),
            Cell::text(lead_status(self.status)),
            Cell::optional(self.source.as_deref()),
            Cell::text(self.tags.join(", ")),
            Cell::optional(self.notes.as_deref()),
            timestamp(self.created_at),
        ]
    }
}

impl Tabular for Invoice {
    fn headers() -> &'static [&'static str] {
        &[
            "Descrição",
            "Valor",
            "Desconto",
            "Total",
            "Vencimento",
            "Status",
            "Pago em",
            "Forma de pagamento",
        ]
    }

    fn row(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.description),
            Cell::Money(self.amount_cents),
            Cell::Money(self.discount_cents),
            Cell::Money(self.net_cents()),
            date(self.due_date),
            Cell::text(invoice_status(self.status)),
            self.paid_at.map(timestamp).unwrap_or(Cell::Empty),
            Cell::optional(self.payment_method.map(payment_method)),
        ]
    }
}

impl Tabular for CheckIn {
    fn headers() -> &'static [&'static str] {
        &["Lead", "Data e hora", "Método", "Observações"]
    }

    fn row(&self) -> Vec<Cell> {
        vec![
            Cell::text(self.lead_id.to_string()),
            timestamp(self.checked_in_at),
            Cell::text(match self.method {
                CheckInMethod::Manual => "Manual",
                CheckInMethod::QrCode => "QR Code",
            }),
            Cell::optional(self.notes.as_deref()),
        ]
    }
}

impl Tabular for ActivityLog {
    fn headers() -> &'static [&'static str] {
        &["Data e hora", "Ação", "Entidade", "Registro", "Descrição", "Usuário"]
    }

    fn row(&self) -> Vec<Cell> {
        vec![
            timestamp(self.created_at),
            Cell::text(&self.action),
            Cell::text(&self.entity_type),
            Cell::optional(self.entity_id.map(|id| id.to_string())),
            Cell::text(&self.description),
            Cell::optional(self.actor_id.map(|id| id.to_string())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_renders_with_two_decimals() {
        assert_eq!(Cell::Money(12_990).render(), "129.90");
        assert_eq!(Cell::Money(5).render(), "0.05");
        assert_eq!(Cell::Money(-250).render(), "-2.50");
        assert_eq!(Cell::Empty.render(), "");
    }
}
