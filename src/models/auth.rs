// src/models/auth.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::services::token::MAX_PASSWORD_BYTES;

// --- Enums ---

// Papel do usuário na plataforma (não confundir com o `Role` de uma Pessoa,
// que é configurável por instância e só serve para o fluxo de aprovação).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    SuperAdmin,
    Admin,
    Director,
    Manager,
    Supervisor,
    TeamMember,
    Guest,
}

impl UserRole {
    pub const ALL: [UserRole; 7] = [
        UserRole::SuperAdmin,
        UserRole::Admin,
        UserRole::Director,
        UserRole::Manager,
        UserRole::Supervisor,
        UserRole::TeamMember,
        UserRole::Guest,
    ];

    /// Único papel isento do escopo de instância.
    pub fn is_super_admin(self) -> bool {
        self == UserRole::SuperAdmin
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UserRole::SuperAdmin => "SUPERADMIN",
            UserRole::Admin => "ADMIN",
            UserRole::Director => "DIRECTOR",
            UserRole::Manager => "MANAGER",
            UserRole::Supervisor => "SUPERVISOR",
            UserRole::TeamMember => "TEAMMEMBER",
            UserRole::Guest => "GUEST",
        };
        f.write_str(name)
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub name: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub role: UserRole,
    pub is_active: bool,

    // Token de refresh persistido (revogação independente do `exp` embutido)
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub refresh_token: Option<String>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,

    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para criar um usuário no repositório
#[derive(Debug, Clone)]
pub struct NewUser {
    pub tenant_id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: UserRole,
}

// O conjunto mínimo de claims para autorizar sem ir ao banco.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: UserRole,
    pub email: String,
}

impl From<&User> for TokenPayload {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            tenant_id: user.tenant_id,
            role: user.role,
            email: user.email.clone(),
        }
    }
}

// --- Payloads ---

// O limite é em bytes (não em caracteres): acentos contam dobrado.
fn validate_password_bytes(password: &str) -> Result<(), ValidationError> {
    if password.len() > MAX_PASSWORD_BYTES {
        let mut err = ValidationError::new("length");
        err.add_param("max".into(), &MAX_PASSWORD_BYTES);
        err.message = Some(format!("A senha deve ter no máximo {MAX_PASSWORD_BYTES} bytes.").into());
        return Err(err);
    }
    Ok(())
}

// Dados para cadastro. Campos obrigatórios têm `default` para que a ausência
// vire erro de validação (400) e não erro de desserialização.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupPayload {
    #[serde(default)]
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "tecnico@empresa.com")]
    pub email: String,

    #[serde(default)]
    #[validate(
        length(min = 8, message = "A senha deve ter no mínimo 8 caracteres."),
        custom(function = "validate_password_bytes")
    )]
    pub password: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Maria Souza")]
    pub name: String,

    #[validate(required(message = "A instância é obrigatória."))]
    pub tenant_id: Option<Uuid>,

    pub role: Option<UserRole>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SigninPayload {
    #[serde(default)]
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "O refresh token é obrigatório."))]
    pub refresh_token: String,
}

// Sem `userId`, encerra a sessão de quem chamou.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogoutPayload {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetUserActivePayload {
    pub is_active: bool,
}

// --- Respostas ---

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_use_the_uppercase_wire_names() {
        assert_eq!(serde_json::to_string(&UserRole::SuperAdmin).unwrap(), "\"SUPERADMIN\"");
        assert_eq!(serde_json::to_string(&UserRole::TeamMember).unwrap(), "\"TEAMMEMBER\"");
        for role in UserRole::ALL {
            let parsed: UserRole = serde_json::from_str(&format!("\"{role}\"")).unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn signup_password_is_limited_in_bytes() {
        let signup = |password: String| SignupPayload {
            email: "a@acme.com".into(),
            password,
            name: "A".into(),
            tenant_id: Some(Uuid::nil()),
            role: None,
        };

        assert!(signup("x".repeat(MAX_PASSWORD_BYTES)).validate().is_ok());

        let errors = signup("x".repeat(100)).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));

        // 36 caracteres, 72 bytes
        assert!(signup("ç".repeat(36)).validate().is_err());
    }

    #[test]
    fn token_payload_is_camel_case() {
        let payload = TokenPayload {
            user_id: Uuid::nil(),
            tenant_id: Uuid::nil(),
            role: UserRole::Admin,
            email: "a@b.com".into(),
        };
        let value = serde_json::to_value(&payload).unwrap();

        assert!(value.get("userId").is_some());
        assert!(value.get("tenantId").is_some());
        assert_eq!(value["role"], "ADMIN");
    }
}
