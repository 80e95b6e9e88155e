// src/services/auth.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{TenantRepository, UserRepository},
    middleware::auth::require_tenant,
    models::{
        auth::{AuthResponse, NewUser, TokenPair, TokenPayload, User, UserRole},
        tenancy::ApprovalPolicy,
    },
    services::token::TokenService,
};

// Dados para criar o primeiro SUPERADMIN de uma instalação nova.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub tenant_name: String,
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tenants: Arc<dyn TenantRepository>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tenants: Arc<dyn TenantRepository>,
        tokens: TokenService,
    ) -> Self {
        Self { users, tenants, tokens }
    }

    /// Cadastro aberto só cria TEAMMEMBER ou GUEST. Papéis acima disso exigem
    /// um `caller` ADMIN da mesma instância, ou SUPERADMIN.
    pub async fn signup(
        &self,
        caller: Option<&TokenPayload>,
        email: &str,
        password: &str,
        name: &str,
        tenant_id: Uuid,
        role: Option<UserRole>,
    ) -> Result<AuthResponse, AppError> {
        let role = role.unwrap_or(UserRole::TeamMember);
        if !can_assign_role(caller, tenant_id, role) {
            tracing::warn!(role = %role, tenant_id = %tenant_id, "Cadastro com papel não permitido");
            return Err(AppError::Forbidden);
        }

        self.tenants
            .find_by_id(tenant_id)
            .await?
            .ok_or(AppError::NotFound("instance"))?;

        let password_hash = self.tokens.hash_password(password).await?;

        let user = self
            .users
            .create_user(NewUser {
                tenant_id,
                email: normalize_email(email),
                name: name.trim().to_string(),
                password_hash,
                role,
            })
            .await?;

        tracing::info!(user_id = %user.id, tenant_id = %tenant_id, "✅ Usuário cadastrado");

        self.start_session(user).await
    }

    pub async fn signin(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        // Mesmo erro para e-mail inexistente e senha errada.
        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !self.tokens.compare_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AppError::AccountDisabled);
        }

        self.start_session(user).await
    }

    /// Troca um refresh token válido por um novo par. O token apresentado
    /// é consumido: usá-lo de novo resulta em 401.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = self
            .tokens
            .verify_refresh_token(refresh_token)
            .ok_or(AppError::InvalidToken)?;

        let user = self
            .users
            .find_by_id(claims.user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;

        // O servidor é quem manda: token diferente do gravado (revogado,
        // substituído por outro login) ou expiração gravada vencida.
        if user.refresh_token.as_deref() != Some(refresh_token) {
            return Err(AppError::InvalidToken);
        }
        match user.refresh_token_expires_at {
            Some(expires_at) if expires_at > Utc::now() => {}
            _ => return Err(AppError::InvalidToken),
        }

        if !user.is_active {
            return Err(AppError::AccountDisabled);
        }

        // Claims refeitas a partir do registro atual (papel pode ter mudado).
        let payload = TokenPayload::from(&user);
        let pair = TokenPair {
            access_token: self.tokens.generate_access_token(&payload)?,
            refresh_token: self.tokens.generate_refresh_token(&payload)?,
        };

        let rotated = self
            .users
            .rotate_refresh_token(
                user.id,
                refresh_token,
                &pair.refresh_token,
                self.tokens.refresh_token_expiry(),
            )
            .await?;

        if !rotated {
            tracing::warn!(user_id = %user.id, "Refresh token já consumido por outro pedido");
            return Err(AppError::InvalidToken);
        }

        Ok(pair)
    }

    /// Idempotente: sair duas vezes não é erro.
    pub async fn logout(&self, caller: &TokenPayload, user_id: Uuid) -> Result<(), AppError> {
        if caller.user_id != user_id {
            if !matches!(caller.role, UserRole::SuperAdmin | UserRole::Admin) {
                return Err(AppError::Forbidden);
            }

            let target = self
                .users
                .find_by_id(user_id)
                .await?
                .ok_or(AppError::NotFound("user"))?;

            if !require_tenant(caller, target.tenant_id) {
                return Err(AppError::Forbidden);
            }
        }

        self.users.clear_refresh_token(user_id).await?;
        tracing::info!(user_id = %user_id, by = %caller.user_id, "Sessão encerrada");
        Ok(())
    }

    /// Ativa ou desativa um login da instância. Desativar também revoga o refresh token.
    pub async fn set_user_active(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        is_active: bool,
    ) -> Result<User, AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .filter(|u| u.tenant_id == tenant_id)
            .ok_or(AppError::NotFound("user"))?;

        if user.role.is_super_admin() {
            return Err(AppError::Forbidden);
        }

        let updated = self
            .users
            .set_active(user.id, is_active)
            .await?
            .ok_or(AppError::NotFound("user"))?;

        tracing::info!(user_id = %user_id, is_active, "Status do usuário alterado");
        Ok(updated)
    }

    /// Garante que exista o SUPERADMIN configurado. Não altera um usuário já existente.
    pub async fn ensure_superadmin(&self, bootstrap: &BootstrapAdmin) -> Result<User, AppError> {
        let email = normalize_email(&bootstrap.email);
        if let Some(existing) = self.users.find_by_email(&email).await? {
            return Ok(existing);
        }

        let instance = match self.tenants.find_by_name(&bootstrap.tenant_name).await? {
            Some(instance) => instance,
            None => {
                self.tenants
                    .create_instance(&bootstrap.tenant_name, ApprovalPolicy::default())
                    .await?
            }
        };

        let password_hash = self.tokens.hash_password(&bootstrap.password).await?;
        let user = self
            .users
            .create_user(NewUser {
                tenant_id: instance.id,
                email,
                name: bootstrap.name.clone(),
                password_hash,
                role: UserRole::SuperAdmin,
            })
            .await?;

        tracing::info!(user_id = %user.id, "🔑 SUPERADMIN inicial criado");
        Ok(user)
    }

    // Emite o par de tokens e grava o refresh token junto com a expiração.
    async fn start_session(&self, mut user: User) -> Result<AuthResponse, AppError> {
        let payload = TokenPayload::from(&user);
        let access_token = self.tokens.generate_access_token(&payload)?;
        let refresh_token = self.tokens.generate_refresh_token(&payload)?;
        let expires_at = self.tokens.refresh_token_expiry();

        self.users.record_login(user.id, &refresh_token, expires_at).await?;

        user.last_login_at = Some(Utc::now());
        user.refresh_token_expires_at = Some(expires_at);

        Ok(AuthResponse {
            user,
            access_token,
            refresh_token,
        })
    }
}

// SUPERADMIN só nasce pelo bootstrap, nunca por cadastro.
fn can_assign_role(caller: Option<&TokenPayload>, tenant_id: Uuid, role: UserRole) -> bool {
    match role {
        UserRole::SuperAdmin => false,
        UserRole::TeamMember | UserRole::Guest => true,
        _ => caller.is_some_and(|c| {
            matches!(c.role, UserRole::SuperAdmin | UserRole::Admin) && require_tenant(c, tenant_id)
        }),
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
