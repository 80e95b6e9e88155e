// src/models/rbac.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Conjunto fechado de capacidades de um cargo (gravado como JSON).
///
/// Apenas descritivo: é guardado e devolvido, mas nenhuma rota o consulta.
/// O acesso às rotas vem do `UserRole` do token, e quem aprova trabalho é
/// decidido por `can_approve_work` mais a cadeia `requires_approval_from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Permission {
    #[serde(rename = "people:read")]
    PeopleRead,
    #[serde(rename = "people:write")]
    PeopleWrite,
    #[serde(rename = "roles:read")]
    RolesRead,
    #[serde(rename = "roles:write")]
    RolesWrite,
    #[serde(rename = "work-orders:read")]
    WorkOrdersRead,
    #[serde(rename = "work-orders:write")]
    WorkOrdersWrite,
    #[serde(rename = "work-orders:approve")]
    WorkOrdersApprove,
    #[serde(rename = "instances:manage")]
    InstancesManage,
}

// O que sai do banco (Tabela roles)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    #[schema(example = "Supervisor de Campo")]
    pub name: String,

    pub description: Option<String>,

    #[sqlx(json)]
    pub permissions: Vec<Permission>,

    pub can_approve_work: bool,

    // 1 = mais júnior. É só uma dica de senioridade; quem decide é a lista abaixo.
    #[schema(example = 2)]
    pub level: i32,

    // Cargos explicitamente autorizados a aprovar o trabalho deste cargo.
    pub requires_approval_from: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para criar um cargo no repositório
#[derive(Debug, Clone)]
pub struct NewRole {
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<Permission>,
    pub can_approve_work: bool,
    pub level: i32,
    pub requires_approval_from: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct RoleApproval {
    pub can_approve_work: bool,
    pub level: i32,
    pub requires_approval_from: Vec<Uuid>,
}

// O Payload para criar um cargo
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "O nome do cargo é obrigatório."))]
    #[schema(example = "Técnico")]
    pub name: String,

    pub description: Option<String>,

    #[serde(default)]
    pub permissions: Vec<Permission>,

    #[serde(default)]
    pub can_approve_work: bool,

    #[validate(range(min = 1, message = "O nível deve ser maior ou igual a 1."))]
    #[schema(example = 1)]
    pub level: i32,

    #[serde(default)]
    pub requires_approval_from: Vec<Uuid>,
}

// Atualização da parte do cargo que participa do roteamento de aprovação
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleApprovalPayload {
    pub can_approve_work: bool,

    #[validate(range(min = 1, message = "O nível deve ser maior ou igual a 1."))]
    pub level: i32,

    #[serde(default)]
    pub requires_approval_from: Vec<Uuid>,
}
