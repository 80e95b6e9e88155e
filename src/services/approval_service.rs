// src/services/approval_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{PersonRepository, RoleRepository, TenantRepository, WorkOrderRepository},
    middleware::auth::{RoleSet, Staff},
    models::{
        auth::TokenPayload,
        people::Person,
        rbac::Role,
        tenancy::ApprovalPolicy,
        work_orders::{ApprovalDecision, ApprovalStatus, SubmitWorkOrderPayload, Submission, WorkOrder},
    },
    services::hierarchy::{Eligibility, RoleHierarchy},
};

#[derive(Clone)]
pub struct ApprovalService {
    work_orders: Arc<dyn WorkOrderRepository>,
    people: Arc<dyn PersonRepository>,
    roles: Arc<dyn RoleRepository>,
    tenants: Arc<dyn TenantRepository>,
}

impl ApprovalService {
    pub fn new(
        work_orders: Arc<dyn WorkOrderRepository>,
        people: Arc<dyn PersonRepository>,
        roles: Arc<dyn RoleRepository>,
        tenants: Arc<dyn TenantRepository>,
    ) -> Self {
        Self { work_orders, people, roles, tenants }
    }

    /// Envia o trabalho para revisão. Quem executou é a pessoa vinculada ao
    /// login; Staff pode enviar em nome do responsável pela ordem.
    pub async fn submit(
        &self,
        tenant_id: Uuid,
        work_order_id: Uuid,
        caller: &TokenPayload,
        payload: SubmitWorkOrderPayload,
    ) -> Result<WorkOrder, AppError> {
        let order = self.find_order(tenant_id, work_order_id).await?;
        if !order.status.can_submit() {
            return Err(AppError::InvalidTransition { from: order.status });
        }

        let own = self.people.find_by_user(tenant_id, caller.user_id).await?.map(|p| p.id);
        let is_staff = Staff::allowed().contains(&caller.role);
        let submitter_id = resolve_submitter(is_staff, own, order.assigned_to, payload.person_id)
            .inspect_err(|_| {
                tracing::warn!(
                    work_order_id = %work_order_id,
                    user_id = %caller.user_id,
                    requested = ?payload.person_id,
                    "Envio em nome de outra pessoa negado"
                );
            })?;

        if self.people.find_by_id(tenant_id, submitter_id).await?.is_none() {
            return Err(AppError::InvalidInput("errors.unknown_person"));
        }

        let submission = Submission {
            submitted_by: submitter_id,
            submitted_at: Utc::now(),
            completion_notes: payload.completion_notes,
            photos: payload.photos,
        };

        match self.work_orders.submit_for_approval(tenant_id, work_order_id, submission).await? {
            Some(order) => {
                tracing::info!(work_order_id = %order.id, submitted_by = %submitter_id, "📨 Trabalho enviado para aprovação");
                Ok(order)
            }
            None => {
                let latest = self.find_order(tenant_id, work_order_id).await?;
                Err(AppError::InvalidTransition { from: latest.status })
            }
        }
    }

    /// Cargos que podem revisar esta ordem, do nível mais baixo para o mais alto.
    pub async fn eligible_approvers(&self, tenant_id: Uuid, work_order_id: Uuid) -> Result<Vec<Role>, AppError> {
        let order = self.find_order(tenant_id, work_order_id).await?;
        let Some(submitter_role_id) = self.submitter_role(&order).await? else {
            return Ok(Vec::new());
        };

        let policy = self.policy(tenant_id).await?;
        let hierarchy = RoleHierarchy::new(self.roles.list_by_tenant(tenant_id).await?);

        Ok(hierarchy
            .approver_roles(submitter_role_id, policy)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn approve(
        &self,
        tenant_id: Uuid,
        work_order_id: Uuid,
        actor_user_id: Uuid,
        notes: Option<String>,
    ) -> Result<WorkOrder, AppError> {
        let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        self.decide(tenant_id, work_order_id, actor_user_id, ApprovalStatus::Approved, notes)
            .await
    }

    pub async fn reject(
        &self,
        tenant_id: Uuid,
        work_order_id: Uuid,
        actor_user_id: Uuid,
        reason: &str,
    ) -> Result<WorkOrder, AppError> {
        // Recusado antes de qualquer leitura ou escrita.
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::InvalidInput("errors.rejection_reason_required"));
        }

        self.decide(
            tenant_id,
            work_order_id,
            actor_user_id,
            ApprovalStatus::Rejected,
            Some(reason.to_string()),
        )
        .await
    }

    async fn decide(
        &self,
        tenant_id: Uuid,
        work_order_id: Uuid,
        actor_user_id: Uuid,
        outcome: ApprovalStatus,
        notes: Option<String>,
    ) -> Result<WorkOrder, AppError> {
        let order = self.find_order(tenant_id, work_order_id).await?;
        match order.approval_status {
            None => return Err(AppError::InvalidTransition { from: order.status }),
            Some(status) if status.is_decided() => return Err(AppError::ApprovalAlreadyDecided),
            Some(_) => {}
        }

        // 1. Quem decide é a pessoa vinculada ao login, com o cargo dela
        let actor = self.actor(tenant_id, actor_user_id).await?;
        if order.submitted_by == Some(actor.id) {
            return Err(AppError::Forbidden);
        }
        let actor_role_id = actor.role_id.ok_or(AppError::Forbidden)?;

        // 2. O cargo de quem executou define a cadeia
        let submitter_role_id = self.submitter_role(&order).await?.ok_or(AppError::Forbidden)?;

        // 3. Elegibilidade
        let policy = self.policy(tenant_id).await?;
        let hierarchy = RoleHierarchy::new(self.roles.list_by_tenant(tenant_id).await?);
        let eligibility = hierarchy.check_eligibility(actor_role_id, submitter_role_id, policy);
        if eligibility != Eligibility::Eligible {
            tracing::debug!(
                work_order_id = %work_order_id,
                actor = %actor.id,
                reason = ?eligibility,
                "Aprovação negada"
            );
            return Err(AppError::Forbidden);
        }

        // 4. Grava só se ainda estiver pendente
        let decision = ApprovalDecision {
            outcome,
            reviewer: actor.id,
            decided_at: Utc::now(),
            notes,
        };

        let decided = self
            .work_orders
            .record_decision(tenant_id, work_order_id, decision)
            .await?
            .ok_or(AppError::ApprovalAlreadyDecided)?;

        tracing::info!(
            work_order_id = %work_order_id,
            reviewer = %actor.id,
            outcome = ?outcome,
            "✅ Revisão registrada"
        );
        Ok(decided)
    }

    async fn find_order(&self, tenant_id: Uuid, work_order_id: Uuid) -> Result<WorkOrder, AppError> {
        self.work_orders
            .find_by_id(tenant_id, work_order_id)
            .await?
            .ok_or(AppError::NotFound("work_order"))
    }

    async fn actor(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Person, AppError> {
        self.people
            .find_by_user(tenant_id, user_id)
            .await?
            .ok_or(AppError::Forbidden)
    }

    async fn submitter_role(&self, order: &WorkOrder) -> Result<Option<Uuid>, AppError> {
        let Some(person_id) = order.submitted_by else {
            return Err(AppError::InvalidTransition { from: order.status });
        };
        Ok(self
            .people
            .find_by_id(order.tenant_id, person_id)
            .await?
            .and_then(|p| p.role_id))
    }

    async fn policy(&self, tenant_id: Uuid) -> Result<ApprovalPolicy, AppError> {
        Ok(self
            .tenants
            .find_by_id(tenant_id)
            .await?
            .ok_or(AppError::NotFound("instance"))?
            .approval_policy)
    }
}

// Sem `person_id`, a própria pessoa responde pelo trabalho se puder; senão o
// Staff envia pelo responsável. Informar outra pessoa só vale para o responsável.
fn resolve_submitter(
    is_staff: bool,
    own: Option<Uuid>,
    assigned_to: Option<Uuid>,
    requested: Option<Uuid>,
) -> Result<Uuid, AppError> {
    let own = own.filter(|id| assigned_to.is_none_or(|assignee| assignee == *id));

    match requested {
        Some(id) if own == Some(id) => Ok(id),
        Some(id) if is_staff && assigned_to == Some(id) => Ok(id),
        Some(_) => Err(AppError::Forbidden),
        None => match (own, assigned_to) {
            (Some(id), _) => Ok(id),
            (None, Some(assignee)) if is_staff => Ok(assignee),
            (None, None) if is_staff => Err(AppError::InvalidInput("errors.submitter_required")),
            _ => Err(AppError::Forbidden),
        },
    }
}
