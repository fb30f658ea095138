//! Automation rules: daily templated messages driven by lead, invoice
//! and subscription dates.
//!
//! A rule fires for a lead on the day `event_date + day_offset` equals
//! today. The event date depends on the trigger:
//!
//! | Trigger              | Event date                                   |
//! |----------------------|----------------------------------------------|
//! | Birthday             | birthday (Feb 29 → Feb 28 in common years)   |
//! | InactiveDays         | last check-in, or lead creation              |
//! | WelcomeNewLead       | lead creation                                |
//! | InvoiceDue           | due date of a Pending invoice                |
//! | InvoiceOverdue       | due date of an overdue invoice               |
//! | SubscriptionExpiring | end date of an active subscription           |
//!
//! Birthday and InactiveDays only consider Active leads. Each
//! (rule, lead, day) is attempted at most once; the attempt is written to
//! the automation log whatever its outcome.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate};
use gymdesk_core::error::{GymError, GymResult};
use gymdesk_core::mask::format_brl;
use gymdesk_core::models::automation::{
    AutomationLog, AutomationRule, Channel, CreateAutomationLog, CreateAutomationRule,
    DeliveryStatus, TriggerType, UpdateAutomationRule,
};
use gymdesk_core::models::invoice::InvoiceStatus;
use gymdesk_core::models::lead::{Lead, LeadStatus};
use gymdesk_core::repository::{
    AutomationLogRepository, AutomationRuleRepository, PaginatedResult, Pagination,
};
use gymdesk_core::template;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::snapshot::UnitSnapshot;

/// Outbound delivery of automation messages (WhatsApp gateway, e-mail,
/// SMS provider).
pub trait MessageSender: Send + Sync {
    fn send(
        &self,
        channel: Channel,
        lead: &Lead,
        message: &str,
    ) -> impl Future<Output = GymResult<()>> + Send;
}

/// Sender that only writes the message to the log. Used when no gateway
/// is configured.
#[derive(Debug, Clone, Default)]
pub struct LoggingSender;

impl MessageSender for LoggingSender {
    async fn send(&self, channel: Channel, lead: &Lead, message: &str) -> GymResult<()> {
        info!(
            lead_id = %lead.id,
            channel = channel.as_str(),
            chars = message.chars().count(),
            "automation message"
        );
        Ok(())
    }
}

/// Address the channel would deliver to, if the lead has one.
pub fn recipient(channel: Channel, lead: &Lead) -> Option<&str> {
    match channel {
        Channel::WhatsApp | Channel::Sms => lead.phone.as_deref(),
        Channel::Email => lead.email.as_deref(),
    }
    .filter(|s| !s.trim().is_empty())
}

/// `birth` moved into `year`, with Feb 29 becoming Feb 28 when `year` is
/// not a leap year.
pub fn birthday_in(birth: NaiveDate, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, birth.month(), birth.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, birth.month(), birth.day().saturating_sub(1)))
}

fn fires(event: NaiveDate, offset: i32, today: NaiveDate) -> bool {
    event
        .checked_add_signed(Duration::days(i64::from(offset)))
        .is_some_and(|d| d == today)
}

/// A message the engine decided to send.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMessage {
    pub lead_id: Uuid,
    pub message: String,
}

/// Decide which leads a rule targets today and render their messages.
/// At most one message per lead.
pub fn plan_rule(
    rule: &AutomationRule,
    snapshot: &UnitSnapshot,
    today: NaiveDate,
) -> Vec<PlannedMessage> {
    // lead_id -> extra template variables
    let mut targets: Vec<(Uuid, HashMap<&'static str, String>)> = Vec::new();
    let mut seen = HashSet::new();
    let mut target = |lead_id: Uuid, vars: HashMap<&'static str, String>| {
        if seen.insert(lead_id) {
            targets.push((lead_id, vars));
        }
    };

    let active = || {
        snapshot
            .leads
            .iter()
            .filter(|l| l.status == LeadStatus::Active)
    };

    match rule.trigger {
        TriggerType::Birthday => {
            for lead in active() {
                let Some(birth) = lead.birth_date else {
                    continue;
                };
                // Neighbouring years let offsets cross New Year.
                let hit = [today.year() - 1, today.year(), today.year() + 1]
                    .into_iter()
                    .filter_map(|y| birthday_in(birth, y))
                    .any(|d| fires(d, rule.day_offset, today));
                if hit {
                    target(lead.id, HashMap::new());
                }
            }
        }
        TriggerType::InactiveDays => {
            for lead in active() {
                let last_seen = snapshot
                    .last_check_ins
                    .get(&lead.id)
                    .copied()
                    .unwrap_or(lead.created_at)
                    .date_naive();
                if fires(last_seen, rule.day_offset, today) {
                    target(lead.id, HashMap::new());
                }
            }
        }
        TriggerType::WelcomeNewLead => {
            for lead in &snapshot.leads {
                if fires(lead.created_at.date_naive(), rule.day_offset, today) {
                    target(lead.id, HashMap::new());
                }
            }
        }
        TriggerType::InvoiceDue | TriggerType::InvoiceOverdue => {
            let wants_overdue = rule.trigger == TriggerType::InvoiceOverdue;
            for invoice in &snapshot.open_invoices {
                let matches_kind = if wants_overdue {
                    invoice.is_overdue_on(today)
                } else {
                    invoice.status == InvoiceStatus::Pending
                };
                if matches_kind && fires(invoice.due_date, rule.day_offset, today) {
                    target(
                        invoice.lead_id,
                        HashMap::from([
                            ("amount", format_brl(invoice.net_cents())),
                            ("due_date", invoice.due_date.format("%d/%m/%Y").to_string()),
                        ]),
                    );
                }
            }
        }
        TriggerType::SubscriptionExpiring => {
            for subscription in &snapshot.active_subscriptions {
                let Some(ends_on) = subscription.ends_on else {
                    continue;
                };
                if fires(ends_on, rule.day_offset, today) {
                    target(
                        subscription.lead_id,
                        HashMap::from([
                            ("amount", format_brl(subscription.price_cents)),
                            ("due_date", ends_on.format("%d/%m/%Y").to_string()),
                        ]),
                    );
                }
            }
        }
    }

    targets
        .into_iter()
        .filter_map(|(lead_id, extra)| {
            let lead = snapshot.lead(lead_id)?;
            let mut vars = HashMap::from([
                ("name", lead.name.clone()),
                ("first_name", template::first_name(&lead.name).to_string()),
                ("unit", snapshot.unit.name.clone()),
                (
                    "plan",
                    snapshot.plan_name_for(lead).unwrap_or_default().to_string(),
                ),
                ("amount", String::new()),
                ("due_date", String::new()),
            ]);
            vars.extend(extra);
            Some(PlannedMessage {
                lead_id,
                message: template::render(&rule.template, &vars),
            })
        })
        .collect()
}

/// Outcome counts of one engine run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub sent: u32,
    pub failed: u32,
    pub skipped: u32,
    /// Already handled earlier the same day.
    pub already_done: u32,
}

pub struct AutomationEngine<R, G, M>
where
    R: AutomationRuleRepository,
    G: AutomationLogRepository,
    M: MessageSender,
{
    rules: R,
    logs: G,
    sender: M,
}

impl<R, G, M> AutomationEngine<R, G, M>
where
    R: AutomationRuleRepository,
    G: AutomationLogRepository,
    M: MessageSender,
{
    pub fn new(rules: R, logs: G, sender: M) -> Self {
        Self {
            rules,
            logs,
            sender,
        }
    }

    // -----------------------------------------------------------------------
    // Rule management
    // -----------------------------------------------------------------------

    pub async fn create_rule(&self, input: CreateAutomationRule) -> GymResult<AutomationRule> {
        if input.name.trim().is_empty() {
            return Err(GymError::validation("rule name is required"));
        }
        if input.template.trim().is_empty() {
            return Err(GymError::validation("message template is required"));
        }
        self.rules.create(input).await
    }

    pub async fn update_rule(
        &self,
        unit_id: Uuid,
        id: Uuid,
        input: UpdateAutomationRule,
    ) -> GymResult<AutomationRule> {
        if input.template.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(GymError::validation("message template is required"));
        }
        self.rules.update(unit_id, id, input).await
    }

    pub async fn delete_rule(&self, unit_id: Uuid, id: Uuid) -> GymResult<()> {
        self.rules.delete(unit_id, id).await
    }

    pub async fn get_rule(&self, unit_id: Uuid, id: Uuid) -> GymResult<AutomationRule> {
        self.rules.get_by_id(unit_id, id).await
    }

    pub async fn list_rules(&self, unit_id: Uuid) -> GymResult<Vec<AutomationRule>> {
        self.rules.list(unit_id, false).await
    }

    pub async fn logs(
        &self,
        unit_id: Uuid,
        rule_id: Option<Uuid>,
        pagination: Pagination,
    ) -> GymResult<PaginatedResult<AutomationLog>> {
        self.logs.list(unit_id, rule_id, pagination).await
    }

    // -----------------------------------------------------------------------
    // Execution
    // -----------------------------------------------------------------------

    /// Run every active rule of the snapshot's unit for `today`.
    pub async fn run(&self, snapshot: &UnitSnapshot, today: NaiveDate) -> GymResult<RunSummary> {
        let unit_id = snapshot.unit.id;
        let mut summary = RunSummary::default();

        for rule in self.rules.list(unit_id, true).await? {
            for planned in plan_rule(&rule, snapshot, today) {
                if self
                    .logs
                    .exists_for(unit_id, rule.id, planned.lead_id, today)
                    .await?
                {
                    summary.already_done += 1;
                    continue;
                }
                let Some(lead) = snapshot.lead(planned.lead_id) else {
                    continue;
                };

                let (status, error) = if recipient(rule.channel, lead).is_none() {
                    (
                        DeliveryStatus::Skipped,
                        Some(format!("no {} contact", rule.channel)),
                    )
                } else {
                    match self.sender.send(rule.channel, lead, &planned.message).await {
                        Ok(()) => (DeliveryStatus::Sent, None),
                        Err(e) => {
                            warn!(%unit_id, rule_id = %rule.id, lead_id = %lead.id, error = %e, "automation delivery failed");
                            (DeliveryStatus::Failed, Some(e.to_string()))
                        }
                    }
                };

                match status {
                    DeliveryStatus::Sent => summary.sent += 1,
                    DeliveryStatus::Failed => summary.failed += 1,
                    DeliveryStatus::Skipped => summary.skipped += 1,
                }

                self.logs
                    .append(CreateAutomationLog {
                        unit_id,
                        rule_id: rule.id,
                        lead_id: lead.id,
                        run_date: today,
                        channel: rule.channel,
                        message: planned.message,
                        status,
                        error,
                    })
                    .await?;
            }
        }

        info!(
            %unit_id,
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped,
            "automation run finished"
        );
        Ok(summary)
    }
}
