// src/services/tenancy_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TenantRepository,
    models::tenancy::{ApprovalPolicy, Instance},
};

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: Arc<dyn TenantRepository>,
}

impl TenantService {
    pub fn new(tenant_repo: Arc<dyn TenantRepository>) -> Self {
        Self { tenant_repo }
    }

    pub async fn create_instance(&self, name: &str, policy: ApprovalPolicy) -> Result<Instance, AppError> {
        let instance = self.tenant_repo.create_instance(name.trim(), policy).await?;
        tracing::info!(tenant_id = %instance.id, "✅ Instância criada: {}", instance.name);
        Ok(instance)
    }

    pub async fn list_instances(&self) -> Result<Vec<Instance>, AppError> {
        self.tenant_repo.list_instances().await
    }

    pub async fn get_instance(&self, tenant_id: Uuid) -> Result<Instance, AppError> {
        self.tenant_repo
            .find_by_id(tenant_id)
            .await?
            .ok_or(AppError::NotFound("instance"))
    }

    /// Troca a política de roteamento (direta / transitiva). Vale para os
    /// próximos pedidos de aprovação; nada já decidido é reavaliado.
    pub async fn update_approval_policy(
        &self,
        tenant_id: Uuid,
        policy: ApprovalPolicy,
    ) -> Result<Instance, AppError> {
        let instance = self
            .tenant_repo
            .update_approval_policy(tenant_id, policy)
            .await?
            .ok_or(AppError::NotFound("instance"))?;

        tracing::info!(tenant_id = %tenant_id, policy = ?policy, "Política de aprovação alterada");
        Ok(instance)
    }
}
