// src/models/work_orders.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "work_order_status", rename_all = "snake_case")]
#[serde(rename_all = "kebab-case")]
pub enum WorkOrderStatus {
    Scheduled,
    InProgress,
    Completed,
    PendingApproval,
    Approved,
    Rejected,
    Cancelled,
}

impl WorkOrderStatus {
    /// Estados a partir dos quais o trabalho pode ser enviado para revisão.
    pub fn can_submit(self) -> bool {
        matches!(
            self,
            WorkOrderStatus::Scheduled | WorkOrderStatus::InProgress | WorkOrderStatus::Completed
        )
    }

    /// Estados que só o fluxo de aprovação pode atribuir.
    pub fn is_workflow_managed(self) -> bool {
        matches!(
            self,
            WorkOrderStatus::PendingApproval | WorkOrderStatus::Approved | WorkOrderStatus::Rejected
        )
    }

    /// Atribuição simples de status (fora do fluxo de aprovação).
    /// Uma ordem rejeitada pode voltar para execução (retrabalho).
    pub fn can_transition_to(self, next: WorkOrderStatus) -> bool {
        if next.is_workflow_managed() || next == self {
            return false;
        }
        !matches!(
            self,
            WorkOrderStatus::PendingApproval | WorkOrderStatus::Approved | WorkOrderStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn is_decided(self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Troca do compressor - Loja Centro")]
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub status: WorkOrderStatus,
    pub scheduled_for: Option<DateTime<Utc>>,

    // Evidências de conclusão
    pub completion_notes: Option<String>,
    pub photos: Vec<String>,
    pub submitted_by: Option<Uuid>,
    pub submitted_at: Option<DateTime<Utc>>,

    // Revisão
    pub approval_status: Option<ApprovalStatus>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWorkOrder {
    pub tenant_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

// Envio para revisão
#[derive(Debug, Clone)]
pub struct Submission {
    pub submitted_by: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub completion_notes: Option<String>,
    pub photos: Vec<String>,
}

// Decisão do revisor. Só é gravada se a ordem ainda estiver `pending`.
#[derive(Debug, Clone)]
pub struct ApprovalDecision {
    pub outcome: ApprovalStatus,
    pub reviewer: Uuid,
    pub decided_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl ApprovalDecision {
    pub fn resulting_status(&self) -> WorkOrderStatus {
        match self.outcome {
            ApprovalStatus::Approved => WorkOrderStatus::Approved,
            ApprovalStatus::Rejected => WorkOrderStatus::Rejected,
            ApprovalStatus::Pending => WorkOrderStatus::PendingApproval,
        }
    }

    pub fn approved_by(&self) -> Option<Uuid> {
        (self.outcome == ApprovalStatus::Approved).then_some(self.reviewer)
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        (self.outcome == ApprovalStatus::Approved).then_some(self.decided_at)
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkOrderPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "O título é obrigatório."))]
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkOrderStatusPayload {
    #[schema(example = "in-progress")]
    pub status: WorkOrderStatus,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitWorkOrderPayload {
    // Quem executou. Se ausente, a pessoa do próprio login (ou o responsável, para Staff).
    pub person_id: Option<Uuid>,
    pub completion_notes: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApproveWorkOrderPayload {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectWorkOrderPayload {
    // Obrigatório; em branco é recusado antes de tocar no banco.
    #[serde(default)]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_kebab_case_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&WorkOrderStatus::PendingApproval).unwrap(),
            "\"pending-approval\""
        );
        assert_eq!(serde_json::to_string(&ApprovalStatus::Pending).unwrap(), "\"pending\"");
    }

    #[test]
    fn only_active_work_can_be_submitted() {
        assert!(WorkOrderStatus::Scheduled.can_submit());
        assert!(WorkOrderStatus::InProgress.can_submit());
        assert!(WorkOrderStatus::Completed.can_submit());
        assert!(!WorkOrderStatus::PendingApproval.can_submit());
        assert!(!WorkOrderStatus::Approved.can_submit());
        assert!(!WorkOrderStatus::Cancelled.can_submit());
    }

    #[test]
    fn manual_transitions_cannot_bypass_the_approval_workflow() {
        use WorkOrderStatus::*;

        assert!(Scheduled.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Rejected.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(Approved));
        assert!(!InProgress.can_transition_to(PendingApproval));
        assert!(!PendingApproval.can_transition_to(Completed));
        assert!(!Approved.can_transition_to(InProgress));
        assert!(!Cancelled.can_transition_to(Scheduled));
        assert!(!Scheduled.can_transition_to(Scheduled));
    }

    #[test]
    fn only_approvals_stamp_the_approver() {
        let reviewer = Uuid::new_v4();
        let approve = ApprovalDecision {
            outcome: ApprovalStatus::Approved,
            reviewer,
            decided_at: Utc::now(),
            notes: None,
        };
        let reject = ApprovalDecision { outcome: ApprovalStatus::Rejected, ..approve.clone() };

        assert_eq!(approve.approved_by(), Some(reviewer));
        assert_eq!(approve.resulting_status(), WorkOrderStatus::Approved);
        assert_eq!(reject.approved_by(), None);
        assert_eq!(reject.approved_at(), None);
        assert_eq!(reject.resulting_status(), WorkOrderStatus::Rejected);
    }
}
