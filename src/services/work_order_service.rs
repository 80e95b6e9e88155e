// src/services/work_order_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{PersonRepository, WorkOrderRepository},
    models::work_orders::{CreateWorkOrderPayload, NewWorkOrder, WorkOrder, WorkOrderStatus},
};

// CRUD e atribuição simples de status. Envio e decisão ficam no ApprovalService.
#[derive(Clone)]
pub struct WorkOrderService {
    work_orders: Arc<dyn WorkOrderRepository>,
    people: Arc<dyn PersonRepository>,
}

impl WorkOrderService {
    pub fn new(work_orders: Arc<dyn WorkOrderRepository>, people: Arc<dyn PersonRepository>) -> Self {
        Self { work_orders, people }
    }

    pub async fn create_work_order(
        &self,
        tenant_id: Uuid,
        payload: CreateWorkOrderPayload,
    ) -> Result<WorkOrder, AppError> {
        if let Some(person_id) = payload.assigned_to {
            if self.people.find_by_id(tenant_id, person_id).await?.is_none() {
                return Err(AppError::InvalidInput("errors.unknown_person"));
            }
        }

        let order = self
            .work_orders
            .create_work_order(NewWorkOrder {
                tenant_id,
                title: payload.title.trim().to_string(),
                description: payload.description,
                assigned_to: payload.assigned_to,
                scheduled_for: payload.scheduled_for,
            })
            .await?;

        tracing::info!(tenant_id = %tenant_id, work_order_id = %order.id, "✅ Ordem de serviço criada");
        Ok(order)
    }

    pub async fn list_work_orders(&self, tenant_id: Uuid) -> Result<Vec<WorkOrder>, AppError> {
        self.work_orders.list_by_tenant(tenant_id).await
    }

    pub async fn get_work_order(&self, tenant_id: Uuid, id: Uuid) -> Result<WorkOrder, AppError> {
        self.work_orders
            .find_by_id(tenant_id, id)
            .await?
            .ok_or(AppError::NotFound("work_order"))
    }

    /// `pending-approval`, `approved` e `rejected` só são atribuídos pelo fluxo de aprovação.
    pub async fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        next: WorkOrderStatus,
    ) -> Result<WorkOrder, AppError> {
        if next.is_workflow_managed() {
            return Err(AppError::InvalidInput("errors.invalid_status_target"));
        }

        let current = self.get_work_order(tenant_id, id).await?;
        if !current.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition { from: current.status });
        }

        match self.work_orders.update_status(tenant_id, id, current.status, next).await? {
            Some(order) => {
                tracing::info!(work_order_id = %id, from = ?current.status, to = ?next, "Status alterado");
                Ok(order)
            }
            // Alguém mudou o status entre a leitura e a escrita.
            None => {
                let latest = self.get_work_order(tenant_id, id).await?;
                Err(AppError::InvalidTransition { from: latest.status })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::Repositories, models::people::NewPerson};

    fn payload(title: &str, assigned_to: Option<Uuid>) -> CreateWorkOrderPayload {
        CreateWorkOrderPayload {
            title: title.into(),
            description: None,
            assigned_to,
            scheduled_for: None,
        }
    }

    #[tokio::test]
    async fn assignee_must_belong_to_the_tenant() {
        let repos = Repositories::in_memory();
        let service = WorkOrderService::new(repos.work_orders.clone(), repos.people.clone());
        let tenant = Uuid::new_v4();
        let outsider = repos
            .people
            .create_person(NewPerson {
                tenant_id: Uuid::new_v4(),
                name: "Fora".into(),
                email: None,
                role_id: None,
                user_id: None,
            })
            .await
            .unwrap();

        let result = service.create_work_order(tenant, payload("Troca de filtro", Some(outsider.id))).await;
        assert!(matches!(result, Err(AppError::InvalidInput("errors.unknown_person"))));

        let order = service.create_work_order(tenant, payload("Troca de filtro", None)).await.unwrap();
        assert_eq!(order.status, WorkOrderStatus::Scheduled);
        assert_eq!(order.approval_status, None);
    }

    #[tokio::test]
    async fn status_assignment_follows_the_lifecycle() {
        let repos = Repositories::in_memory();
        let service = WorkOrderService::new(repos.work_orders.clone(), repos.people.clone());
        let tenant = Uuid::new_v4();
        let order = service.create_work_order(tenant, payload("Inspeção", None)).await.unwrap();

        let started = service.update_status(tenant, order.id, WorkOrderStatus::InProgress).await.unwrap();
        assert_eq!(started.status, WorkOrderStatus::InProgress);

        let bypass = service.update_status(tenant, order.id, WorkOrderStatus::Approved).await;
        assert!(matches!(bypass, Err(AppError::InvalidInput("errors.invalid_status_target"))));

        service.update_status(tenant, order.id, WorkOrderStatus::Cancelled).await.unwrap();
        let reopen = service.update_status(tenant, order.id, WorkOrderStatus::InProgress).await;
        assert!(matches!(
            reopen,
            Err(AppError::InvalidTransition { from: WorkOrderStatus::Cancelled })
        ));

        let other_tenant = service.get_work_order(Uuid::new_v4(), order.id).await;
        assert!(matches!(other_tenant, Err(AppError::NotFound("work_order"))));
    }
}
