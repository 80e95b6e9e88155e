// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Como a instância resolve a cadeia de aprovação:
// `Direct` -> só os cargos listados em `requiresApprovalFrom` do cargo de quem executou;
// `Transitive` -> também os aprovadores dos aprovadores (escalonamento).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_policy", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalPolicy {
    #[default]
    Direct,
    Transitive,
}

// ---
// Instance (O "Tenant")
// ---
// A organização cliente. Tudo abaixo dela é isolado.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: Uuid,
    #[schema(example = "Acme Manutenção")]
    pub name: String,
    pub approval_policy: ApprovalPolicy,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstancePayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "O nome da instância é obrigatório."))]
    #[schema(example = "Acme Manutenção")]
    pub name: String,

    #[serde(default)]
    pub approval_policy: ApprovalPolicy,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApprovalPolicyPayload {
    pub approval_policy: ApprovalPolicy,
}
