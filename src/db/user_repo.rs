// src/db/user_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::Postgres, query, query_as, PgPool};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::auth::{NewUser, User},
};

// Todas as interações com a tabela 'users'
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Falha com `EmailAlreadyExists` se o e-mail já estiver em uso.
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError>;

    /// Marca o último login e grava o refresh token recém emitido.
    async fn record_login(
        &self,
        user_id: Uuid,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Troca o refresh token somente se o valor atual ainda for `current`.
    /// Retorna `false` se outro pedido já o consumiu.
    async fn rotate_refresh_token(
        &self,
        user_id: Uuid,
        current: &str,
        next: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    async fn clear_refresh_token(&self, user_id: Uuid) -> Result<(), AppError>;

    async fn set_active(&self, user_id: Uuid, is_active: bool) -> Result<Option<User>, AppError>;
}

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = query_as::<Postgres, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = query_as::<Postgres, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        query_as::<Postgres, User>(
            r#"
            INSERT INTO users (tenant_id, email, name, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new_user.tenant_id)
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.password_hash)
        .bind(new_user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, |constraint| match constraint {
                "users_email_key" => AppError::EmailAlreadyExists,
                other => AppError::UniqueConstraintViolation(other.to_string()),
            })
        })
    }

    async fn record_login(
        &self,
        user_id: Uuid,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        query(
            r#"
            UPDATE users
            SET last_login_at = now(), refresh_token = $2, refresh_token_expires_at = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(refresh_token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        user_id: Uuid,
        current: &str,
        next: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        // UPDATE condicional: o WHERE no token atual faz o papel de compare-and-swap.
        let result = query(
            r#"
            UPDATE users
            SET refresh_token = $3, refresh_token_expires_at = $4, updated_at = now()
            WHERE id = $1 AND refresh_token = $2
            "#,
        )
        .bind(user_id)
        .bind(current)
        .bind(next)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn clear_refresh_token(&self, user_id: Uuid) -> Result<(), AppError> {
        query(
            r#"
            UPDATE users
            SET refresh_token = NULL, refresh_token_expires_at = NULL, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_active(&self, user_id: Uuid, is_active: bool) -> Result<Option<User>, AppError> {
        let user = query_as::<Postgres, User>(
            r#"
            UPDATE users
            SET is_active = $2,
                refresh_token = CASE WHEN $2 THEN refresh_token ELSE NULL END,
                refresh_token_expires_at = CASE WHEN $2 THEN refresh_token_expires_at ELSE NULL END,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
