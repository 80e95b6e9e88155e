// src/db/tenancy_repo.rs

use async_trait::async_trait;
use sqlx::{postgres::Postgres, query_as, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::tenancy::{ApprovalPolicy, Instance},
};

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn create_instance(&self, name: &str, policy: ApprovalPolicy) -> Result<Instance, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Instance>, AppError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Instance>, AppError>;

    async fn list_instances(&self) -> Result<Vec<Instance>, AppError>;

    async fn update_approval_policy(
        &self,
        id: Uuid,
        policy: ApprovalPolicy,
    ) -> Result<Option<Instance>, AppError>;
}

#[derive(Debug, Clone)]
pub struct PgTenantRepository {
    pool: PgPool,
}

impl PgTenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for PgTenantRepository {
    async fn create_instance(&self, name: &str, policy: ApprovalPolicy) -> Result<Instance, AppError> {
        let instance = query_as::<Postgres, Instance>(
            "INSERT INTO instances (name, approval_policy) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(policy)
        .fetch_one(&self.pool)
        .await?;
        Ok(instance)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Instance>, AppError> {
        let instance = query_as::<Postgres, Instance>("SELECT * FROM instances WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(instance)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Instance>, AppError> {
        let instance = query_as::<Postgres, Instance>(
            "SELECT * FROM instances WHERE name = $1 ORDER BY created_at LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(instance)
    }

    async fn list_instances(&self) -> Result<Vec<Instance>, AppError> {
        let instances = query_as::<Postgres, Instance>("SELECT * FROM instances ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(instances)
    }

    async fn update_approval_policy(
        &self,
        id: Uuid,
        policy: ApprovalPolicy,
    ) -> Result<Option<Instance>, AppError> {
        let instance = query_as::<Postgres, Instance>(
            r#"
            UPDATE instances SET approval_policy = $2, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(policy)
        .fetch_optional(&self.pool)
        .await?;
        Ok(instance)
    }
}
