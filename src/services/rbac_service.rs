// src/services/rbac_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RoleRepository,
    models::rbac::{CreateRolePayload, NewRole, Role, RoleApproval, UpdateRoleApprovalPayload},
    services::hierarchy::validate_approval_chain,
};

#[derive(Clone)]
pub struct RbacService {
    repo: Arc<dyn RoleRepository>,
}

impl RbacService {
    pub fn new(repo: Arc<dyn RoleRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_role(&self, tenant_id: Uuid, payload: CreateRolePayload) -> Result<Role, AppError> {
        let approvers = dedup(payload.requires_approval_from);

        // 1. Os aprovadores precisam existir nesta instância e ter nível >= ao do cargo
        let found = self.repo.find_many(tenant_id, &approvers).await?;
        validate_approval_chain(None, payload.level, &approvers, &found)?;

        // 2. Cria o cargo
        let role = self
            .repo
            .create_role(NewRole {
                tenant_id,
                name: payload.name.trim().to_string(),
                description: payload.description,
                permissions: dedup(payload.permissions),
                can_approve_work: payload.can_approve_work,
                level: payload.level,
                requires_approval_from: approvers,
            })
            .await?;

        tracing::info!(tenant_id = %tenant_id, role_id = %role.id, "✅ Cargo criado: {}", role.name);
        Ok(role)
    }

    pub async fn list_roles(&self, tenant_id: Uuid) -> Result<Vec<Role>, AppError> {
        self.repo.list_by_tenant(tenant_id).await
    }

    pub async fn get_role(&self, tenant_id: Uuid, role_id: Uuid) -> Result<Role, AppError> {
        self.repo
            .find_by_id(tenant_id, role_id)
            .await?
            .ok_or(AppError::NotFound("role"))
    }

    /// Atualiza a parte do cargo usada no roteamento de aprovação.
    pub async fn update_approval(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        payload: UpdateRoleApprovalPayload,
    ) -> Result<Role, AppError> {
        self.get_role(tenant_id, role_id).await?;

        let approvers = dedup(payload.requires_approval_from);
        let found = self.repo.find_many(tenant_id, &approvers).await?;
        validate_approval_chain(Some(role_id), payload.level, &approvers, &found)?;

        // Quem já lista este cargo como aprovador não pode ficar acima dele.
        let dependents_above = self
            .repo
            .list_by_tenant(tenant_id)
            .await?
            .into_iter()
            .filter(|r| r.id != role_id && r.requires_approval_from.contains(&role_id))
            .any(|r| r.level > payload.level);
        if dependents_above {
            return Err(AppError::InvalidInput("errors.approval_chain_level"));
        }

        let role = self
            .repo
            .update_approval(
                tenant_id,
                role_id,
                RoleApproval {
                    can_approve_work: payload.can_approve_work,
                    level: payload.level,
                    requires_approval_from: approvers,
                },
            )
            .await?
            .ok_or(AppError::NotFound("role"))?;

        tracing::info!(tenant_id = %tenant_id, role_id = %role_id, "Cadeia de aprovação atualizada");
        Ok(role)
    }
}

// Remove repetidos mantendo a ordem
fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::Repositories, models::rbac::Permission};

    fn payload(name: &str, level: i32, can_approve_work: bool, approvers: Vec<Uuid>) -> CreateRolePayload {
        CreateRolePayload {
            name: name.into(),
            description: None,
            permissions: vec![Permission::WorkOrdersRead, Permission::WorkOrdersRead],
            can_approve_work,
            level,
            requires_approval_from: approvers,
        }
    }

    fn service() -> RbacService {
        RbacService::new(Repositories::in_memory().roles)
    }

    #[tokio::test]
    async fn creates_roles_with_a_valid_chain() {
        let rbac = service();
        let tenant = Uuid::new_v4();

        let supervisor = rbac.create_role(tenant, payload("Supervisor", 2, true, vec![])).await.unwrap();
        let tech = rbac
            .create_role(tenant, payload("Técnico", 1, false, vec![supervisor.id, supervisor.id]))
            .await
            .unwrap();

        assert_eq!(tech.requires_approval_from, vec![supervisor.id]);
        assert_eq!(tech.permissions, vec![Permission::WorkOrdersRead]);

        let listed: Vec<String> = rbac.list_roles(tenant).await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(listed, vec!["Técnico", "Supervisor"]);
    }

    #[tokio::test]
    async fn rejects_lower_level_and_foreign_approvers() {
        let rbac = service();
        let tenant = Uuid::new_v4();
        let junior = rbac.create_role(tenant, payload("Auxiliar", 1, false, vec![])).await.unwrap();
        let foreign = rbac.create_role(Uuid::new_v4(), payload("Gerente", 5, true, vec![])).await.unwrap();

        let lower = rbac.create_role(tenant, payload("Supervisor", 2, true, vec![junior.id])).await;
        assert!(matches!(lower, Err(AppError::InvalidInput("errors.approval_chain_level"))));

        let cross_tenant = rbac.create_role(tenant, payload("Técnico", 1, false, vec![foreign.id])).await;
        assert!(matches!(cross_tenant, Err(AppError::InvalidInput("errors.approval_chain_unknown_role"))));
    }

    #[tokio::test]
    async fn duplicate_names_conflict_within_a_tenant() {
        let rbac = service();
        let tenant = Uuid::new_v4();
        rbac.create_role(tenant, payload("Técnico", 1, false, vec![])).await.unwrap();

        let duplicate = rbac.create_role(tenant, payload("Técnico", 1, false, vec![])).await;
        assert!(matches!(duplicate, Err(AppError::UniqueConstraintViolation(_))));
    }

    #[tokio::test]
    async fn approver_cannot_drop_below_its_dependents() {
        let rbac = service();
        let tenant = Uuid::new_v4();
        let manager = rbac.create_role(tenant, payload("Gerente", 3, true, vec![])).await.unwrap();
        rbac.create_role(tenant, payload("Supervisor", 2, true, vec![manager.id])).await.unwrap();

        let demote = |level| UpdateRoleApprovalPayload {
            can_approve_work: true,
            level,
            requires_approval_from: vec![],
        };

        let too_low = rbac.update_approval(tenant, manager.id, demote(1)).await;
        assert!(matches!(too_low, Err(AppError::InvalidInput("errors.approval_chain_level"))));

        let same_level = rbac.update_approval(tenant, manager.id, demote(2)).await.unwrap();
        assert_eq!(same_level.level, 2);

        let self_reference = rbac
            .update_approval(
                tenant,
                manager.id,
                UpdateRoleApprovalPayload {
                    can_approve_work: true,
                    level: 2,
                    requires_approval_from: vec![manager.id],
                },
            )
            .await;
        assert!(matches!(self_reference, Err(AppError::InvalidInput("errors.approval_chain_self"))));

        let missing = rbac.update_approval(tenant, Uuid::new_v4(), demote(2)).await;
        assert!(matches!(missing, Err(AppError::NotFound("role"))));
    }
}
