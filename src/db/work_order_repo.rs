// src/db/work_order_repo.rs

use async_trait::async_trait;
use sqlx::{postgres::Postgres, query_as, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::work_orders::{ApprovalDecision, NewWorkOrder, Submission, WorkOrder, WorkOrderStatus},
};

// As transições de estado são UPDATEs condicionais: só gravam se o estado
// atual ainda for o esperado. `None` = nada foi alterado (não existe ou mudou antes).
#[async_trait]
pub trait WorkOrderRepository: Send + Sync {
    async fn create_work_order(&self, new_order: NewWorkOrder) -> Result<WorkOrder, AppError>;

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<WorkOrder>, AppError>;

    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<WorkOrder>, AppError>;

    async fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        expected: WorkOrderStatus,
        next: WorkOrderStatus,
    ) -> Result<Option<WorkOrder>, AppError>;

    /// Só grava se o status atual permitir envio (`scheduled`, `in-progress`, `completed`).
    async fn submit_for_approval(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        submission: Submission,
    ) -> Result<Option<WorkOrder>, AppError>;

    /// Só grava se `approval_status` ainda for `pending`.
    async fn record_decision(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        decision: ApprovalDecision,
    ) -> Result<Option<WorkOrder>, AppError>;
}

#[derive(Debug, Clone)]
pub struct PgWorkOrderRepository {
    pool: PgPool,
}

impl PgWorkOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkOrderRepository for PgWorkOrderRepository {
    async fn create_work_order(&self, new_order: NewWorkOrder) -> Result<WorkOrder, AppError> {
        let order = query_as::<Postgres, WorkOrder>(
            r#"
            INSERT INTO work_orders (tenant_id, title, description, assigned_to, scheduled_for)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new_order.tenant_id)
        .bind(&new_order.title)
        .bind(&new_order.description)
        .bind(new_order.assigned_to)
        .bind(new_order.scheduled_for)
        .fetch_one(&self.pool)
        .await?;
        Ok(order)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<WorkOrder>, AppError> {
        let order = query_as::<Postgres, WorkOrder>(
            "SELECT * FROM work_orders WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<WorkOrder>, AppError> {
        let orders = query_as::<Postgres, WorkOrder>(
            "SELECT * FROM work_orders WHERE tenant_id = $1 ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        expected: WorkOrderStatus,
        next: WorkOrderStatus,
    ) -> Result<Option<WorkOrder>, AppError> {
        let order = query_as::<Postgres, WorkOrder>(
            r#"
            UPDATE work_orders SET status = $4, updated_at = now()
            WHERE tenant_id = $1 AND id = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(expected)
        .bind(next)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    async fn submit_for_approval(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        submission: Submission,
    ) -> Result<Option<WorkOrder>, AppError> {
        // Retrabalho após rejeição volta por aqui; a decisão anterior é limpa.
        let order = query_as::<Postgres, WorkOrder>(
            r#"
            UPDATE work_orders
            SET status = 'pending_approval',
                approval_status = 'pending',
                submitted_by = $3,
                submitted_at = $4,
                completion_notes = $5,
                photos = $6,
                reviewed_by = NULL,
                reviewed_at = NULL,
                approved_by = NULL,
                approved_at = NULL,
                review_notes = NULL,
                updated_at = now()
            WHERE tenant_id = $1 AND id = $2
              AND status IN ('scheduled', 'in_progress', 'completed')
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(submission.submitted_by)
        .bind(submission.submitted_at)
        .bind(&submission.completion_notes)
        .bind(&submission.photos)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    async fn record_decision(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        decision: ApprovalDecision,
    ) -> Result<Option<WorkOrder>, AppError> {
        let order = query_as::<Postgres, WorkOrder>(
            r#"
            UPDATE work_orders
            SET approval_status = $3,
                status = $4,
                reviewed_by = $5,
                reviewed_at = $6,
                approved_by = $7,
                approved_at = $8,
                review_notes = $9,
                updated_at = now()
            WHERE tenant_id = $1 AND id = $2 AND approval_status = 'pending'
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(decision.outcome)
        .bind(decision.resulting_status())
        .bind(decision.reviewer)
        .bind(decision.decided_at)
        .bind(decision.approved_by())
        .bind(decision.approved_at())
        .bind(&decision.notes)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }
}
