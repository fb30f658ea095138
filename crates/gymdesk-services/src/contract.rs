//! Membership contracts rendered from the unit's template.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use gymdesk_core::error::{GymError, GymResult};
use gymdesk_core::mask::{format_brl, mask_cnpj, mask_cpf};
use gymdesk_core::models::contract::{Contract, ContractStatus, CreateContract, UpdateContract};
use gymdesk_core::models::lead::Lead;
use gymdesk_core::models::plan::Plan;
use gymdesk_core::models::unit::Unit;
use gymdesk_core::repository::{ActivityLogRepository, ContractRepository};
use gymdesk_core::template;
use uuid::Uuid;

use crate::activity::{Activity, ActivityRecorder};

/// Used when the unit has not configured its own template.
pub const DEFAULT_CONTRACT_TEMPLATE: &str = "\
CONTRATO DE PRESTAÇÃO DE SERVIÇOS

CONTRATADA: {{unit}}, CNPJ {{unit_cnpj}}, {{unit_address}}.
CONTRATANTE: {{name}}, CPF {{cpf}}.

Plano: {{plan}}
Valor: {{amount}} a cada {{billing_months}} mês(es)

O CONTRATANTE declara estar apto à prática de atividades físicas e ciente \
das normas internas da CONTRATADA.

{{city_date}}";

/// Template variables for a contract. Absent optional data renders as
/// an empty string so the document never shows raw placeholders.
pub fn contract_vars(
    unit: &Unit,
    lead: &Lead,
    plan: Option<&Plan>,
    today: NaiveDate,
) -> HashMap<&'static str, String> {
    HashMap::from([
        ("name", lead.name.clone()),
        ("first_name", template::first_name(&lead.name).to_string()),
        ("cpf", lead.cpf.as_deref().map(mask_cpf).unwrap_or_default()),
        ("email", lead.email.clone().unwrap_or_default()),
        ("unit", unit.name.clone()),
        (
            "unit_cnpj",
            unit.cnpj.as_deref().map(mask_cnpj).unwrap_or_default(),
        ),
        ("unit_address", unit.address.clone().unwrap_or_default()),
        ("plan", plan.map(|p| p.name.clone()).unwrap_or_default()),
        (
            "amount",
            plan.map(|p| format_brl(p.price_cents)).unwrap_or_default(),
        ),
        (
            "billing_months",
            plan.map(|p| p.billing_months.to_string())
                .unwrap_or_default(),
        ),
        ("date", today.format("%d/%m/%Y").to_string()),
        ("city_date", today.format("%d/%m/%Y").to_string()),
    ])
}

pub struct ContractService<K: ContractRepository, A: ActivityLogRepository> {
    contracts: K,
    activity: ActivityRecorder<A>,
}

impl<K: ContractRepository, A: ActivityLogRepository> ContractService<K, A> {
    pub fn new(contracts: K, activity: ActivityRecorder<A>) -> Self {
        Self {
            contracts,
            activity,
        }
    }

    /// Render and store a Draft contract for `lead`.
    pub async fn draft(
        &self,
        actor_id: Option<Uuid>,
        unit: &Unit,
        lead: &Lead,
        plan: Option<&Plan>,
    ) -> GymResult<Contract> {
        if lead.unit_id != unit.id || plan.is_some_and(|p| p.unit_id != unit.id) {
            return Err(GymError::TenantContext);
        }
        let template_text = unit
            .contract_template
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_CONTRACT_TEMPLATE);
        let body = template::render(
            template_text,
            &contract_vars(unit, lead, plan, Utc::now().date_naive()),
        );

        let contract = self
            .contracts
            .create(CreateContract {
                unit_id: unit.id,
                lead_id: lead.id,
                plan_id: plan.map(|p| p.id),
                body,
            })
            .await?;

        self.activity
            .record(Activity::new(
                unit.id,
                actor_id,
                "contract.created",
                "contract",
                contract.id,
                format!("Contract drafted for {}", lead.name),
            ))
            .await;
        Ok(contract)
    }

    pub async fn get(&self, unit_id: Uuid, id: Uuid) -> GymResult<Contract> {
        self.contracts.get_by_id(unit_id, id).await
    }

    pub async fn list_by_lead(&self, unit_id: Uuid, lead_id: Uuid) -> GymResult<Vec<Contract>> {
        self.contracts.list_by_lead(unit_id, lead_id).await
    }

    /// Edit the body of a contract that has not been signed yet.
    pub async fn edit(
        &self,
        unit_id: Uuid,
        actor_id: Option<Uuid>,
        id: Uuid,
        body: String,
    ) -> GymResult<Contract> {
        let current = self.contracts.get_by_id(unit_id, id).await?;
        if matches!(
            current.status,
            ContractStatus::Signed | ContractStatus::Cancelled
        ) {
            return Err(GymError::Conflict {
                message: format!("a {} contract cannot be edited", current.status),
            });
        }
        self.transition(
            unit_id,
            actor_id,
            id,
            UpdateContract {
                body: Some(body),
                ..Default::default()
            },
            "contract.updated",
        )
        .await
    }

    pub async fn mark_sent(
        &self,
        unit_id: Uuid,
        actor_id: Option<Uuid>,
        id: Uuid,
    ) -> GymResult<Contract> {
        self.transition(
            unit_id,
            actor_id,
            id,
            UpdateContract {
                status: Some(ContractStatus::Sent),
                ..Default::default()
            },
            "contract.sent",
        )
        .await
    }

    pub async fn sign(&self, unit_id: Uuid, actor_id: Option<Uuid>, id: Uuid) -> GymResult<Contract> {
        let current = self.contracts.get_by_id(unit_id, id).await?;
        if current.status == ContractStatus::Cancelled {
            return Err(GymError::Conflict {
                message: "a cancelled contract cannot be signed".into(),
            });
        }
        self.transition(
            unit_id,
            actor_id,
            id,
            UpdateContract {
                status: Some(ContractStatus::Signed),
                signed_at: Some(Utc::now()),
                ..Default::default()
            },
            "contract.signed",
        )
        .await
    }

    pub async fn cancel(
        &self,
        unit_id: Uuid,
        actor_id: Option<Uuid>,
        id: Uuid,
    ) -> GymResult<Contract> {
        self.transition(
            unit_id,
            actor_id,
            id,
            UpdateContract {
                status: Some(ContractStatus::Cancelled),
                ..Default::default()
            },
            "contract.cancelled",
        )
        .await
    }

    async fn transition(
        &self,
        unit_id: Uuid,
        actor_id: Option<Uuid>,
        id: Uuid,
        update: UpdateContract,
        action: &'static str,
    ) -> GymResult<Contract> {
        let contract = self.contracts.update(unit_id, id, update).await?;
        self.activity
            .record(Activity::new(
                unit_id,
                actor_id,
                action,
                "contract",
                id,
                format!("Contract is now {}", contract.status),
            ))
            .await;
        Ok(contract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gymdesk_core::models::lead::LeadStatus;

    #[test]
    fn default_template_renders_every_placeholder() {
        let unit = Unit {
            id: Uuid::new_v4(),
            name: "Academia Centro".into(),
            slug: "centro".into(),
            cnpj: Some("11222333000181".into()),
            phone: None,
            email: None,
            address: Some("Rua Augusta, 100".into()),
            primary_color: "#2563eb".into(),
            logo_url: None,
            contract_template: None,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let lead = Lead {
            id: Uuid::new_v4(),
            unit_id: unit.id,
            name: "Ana Lima".into(),
            email: None,
            phone: None,
            cpf: Some("52998224725".into()),
            birth_date: None,
            sex: None,
            source: None,
            status: LeadStatus::Negotiation,
            plan_id: None,
            assigned_to: None,
            notes: None,
            tags: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let plan = Plan {
            id: Uuid::new_v4(),
            unit_id: unit.id,
            name: "Trimestral".into(),
            description: None,
            price_cents: 34_990,
            billing_months: 3,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let today = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
        let body = template::render(
            DEFAULT_CONTRACT_TEMPLATE,
            &contract_vars(&unit, &lead, Some(&plan), today),
        );
        assert!(!body.contains("{{"), "unrendered placeholder in:\n{body}");
        assert!(body.contains("CONTRATANTE: Ana Lima, CPF 529.982.247-25."));
        assert!(body.contains("CNPJ 11.222.333/0001-81"));
        assert!(body.contains("Valor: R$ 349,90 a cada 3 mês(es)"));
        assert!(body.ends_with("08/03/2025"));
    }
}
