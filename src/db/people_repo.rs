// src/db/people_repo.rs

use async_trait::async_trait;
use sqlx::{postgres::Postgres, query_as, PgPool};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::people::{NewPerson, Person},
};

#[async_trait]
pub trait PersonRepository: Send + Sync {
    async fn create_person(&self, new_person: NewPerson) -> Result<Person, AppError>;

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Person>, AppError>;

    /// A pessoa vinculada a um login dentro da instância.
    async fn find_by_user(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Option<Person>, AppError>;

    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Person>, AppError>;

    async fn assign_role(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        role_id: Option<Uuid>,
    ) -> Result<Option<Person>, AppError>;
}

#[derive(Debug, Clone)]
pub struct PgPersonRepository {
    pool: PgPool,
}

impl PgPersonRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersonRepository for PgPersonRepository {
    async fn create_person(&self, new_person: NewPerson) -> Result<Person, AppError> {
        query_as::<Postgres, Person>(
            r#"
            INSERT INTO people (tenant_id, name, email, role_id, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new_person.tenant_id)
        .bind(&new_person.name)
        .bind(&new_person.email)
        .bind(new_person.role_id)
        .bind(new_person.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| {
                AppError::UniqueConstraintViolation("Este usuário já está vinculado a outra pessoa.".into())
            })
        })
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Person>, AppError> {
        let person = query_as::<Postgres, Person>(
            "SELECT * FROM people WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(person)
    }

    async fn find_by_user(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Option<Person>, AppError> {
        let person = query_as::<Postgres, Person>(
            "SELECT * FROM people WHERE tenant_id = $1 AND user_id = $2 AND is_active",
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(person)
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Person>, AppError> {
        let people = query_as::<Postgres, Person>(
            "SELECT * FROM people WHERE tenant_id = $1 ORDER BY name",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(people)
    }

    async fn assign_role(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        role_id: Option<Uuid>,
    ) -> Result<Option<Person>, AppError> {
        let person = query_as::<Postgres, Person>(
            r#"
            UPDATE people SET role_id = $3, updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(person)
    }
}
