// src/db/rbac_repo.rs

use async_trait::async_trait;
use sqlx::{postgres::Postgres, query_as, types::Json, PgPool};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::rbac::{NewRole, Role, RoleApproval},
};

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn create_role(&self, new_role: NewRole) -> Result<Role, AppError>;

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Role>, AppError>;

    /// Busca vários cargos de uma vez. Ids de outra instância são ignorados.
    async fn find_many(&self, tenant_id: Uuid, ids: &[Uuid]) -> Result<Vec<Role>, AppError>;

    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Role>, AppError>;

    async fn update_approval(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        approval: RoleApproval,
    ) -> Result<Option<Role>, AppError>;
}

#[derive(Debug, Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn create_role(&self, new_role: NewRole) -> Result<Role, AppError> {
        query_as::<Postgres, Role>(
            r#"
            INSERT INTO roles (
                tenant_id, name, description, permissions,
                can_approve_work, level, requires_approval_from
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new_role.tenant_id)
        .bind(&new_role.name)
        .bind(&new_role.description)
        .bind(Json(&new_role.permissions))
        .bind(new_role.can_approve_work)
        .bind(new_role.level)
        .bind(&new_role.requires_approval_from)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| {
                AppError::UniqueConstraintViolation("Já existe um cargo com esse nome.".into())
            })
        })
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Role>, AppError> {
        let role = query_as::<Postgres, Role>("SELECT * FROM roles WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    async fn find_many(&self, tenant_id: Uuid, ids: &[Uuid]) -> Result<Vec<Role>, AppError> {
        // O SQLx lida bem com arrays usando ANY
        let roles = query_as::<Postgres, Role>(
            "SELECT * FROM roles WHERE tenant_id = $1 AND id = ANY($2)",
        )
        .bind(tenant_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Role>, AppError> {
        let roles = query_as::<Postgres, Role>(
            "SELECT * FROM roles WHERE tenant_id = $1 ORDER BY level, name",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    async fn update_approval(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        approval: RoleApproval,
    ) -> Result<Option<Role>, AppError> {
        let role = query_as::<Postgres, Role>(
            r#"
            UPDATE roles
            SET can_approve_work = $3, level = $4, requires_approval_from = $5, updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(approval.can_approve_work)
        .bind(approval.level)
        .bind(&approval.requires_approval_from)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }
}
