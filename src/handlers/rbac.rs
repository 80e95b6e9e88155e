// src/handlers/rbac.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::{RoleManagers, TenantScope},
        i18n::Locale,
    },
    models::rbac::{CreateRolePayload, Role, UpdateRoleApprovalPayload},
};

// POST /api/instances/{tenant_id}/roles
#[utoipa::path(
    post,
    path = "/api/instances/{tenant_id}/roles",
    tag = "Roles",
    params(("tenant_id" = Uuid, Path, description = "ID da instância")),
    request_body = CreateRolePayload,
    responses(
        (status = 201, description = "Cargo criado", body = Role),
        (status = 400, description = "Dados inválidos ou cadeia de aprovação inconsistente"),
        (status = 409, description = "Nome já usado nesta instância")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope<RoleManagers>,
    Json(payload): Json<CreateRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let role = app_state
        .rbac_service
        .create_role(scope.tenant_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    get,
    path = "/api/instances/{tenant_id}/roles",
    tag = "Roles",
    params(("tenant_id" = Uuid, Path, description = "ID da instância")),
    responses(
        (status = 200, description = "Cargos por nível", body = Vec<Role>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
) -> Result<impl IntoResponse, ApiError> {
    let roles = app_state
        .rbac_service
        .list_roles(scope.tenant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(roles))
}

#[utoipa::path(
    get,
    path = "/api/instances/{tenant_id}/roles/{role_id}",
    tag = "Roles",
    params(
        ("tenant_id" = Uuid, Path, description = "ID da instância"),
        ("role_id" = Uuid, Path, description = "ID do cargo")
    ),
    responses(
        (status = 200, description = "Cargo", body = Role),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_role(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
    Path((_tenant_id, role_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let role = app_state
        .rbac_service
        .get_role(scope.tenant_id, role_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(role))
}

#[utoipa::path(
    put,
    path = "/api/instances/{tenant_id}/roles/{role_id}/approval",
    tag = "Roles",
    params(
        ("tenant_id" = Uuid, Path, description = "ID da instância"),
        ("role_id" = Uuid, Path, description = "ID do cargo")
    ),
    request_body = UpdateRoleApprovalPayload,
    responses(
        (status = 200, description = "Cadeia de aprovação atualizada", body = Role),
        (status = 400, description = "Cadeia inconsistente"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_role_approval(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope<RoleManagers>,
    Path((_tenant_id, role_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateRoleApprovalPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let role = app_state
        .rbac_service
        .update_approval(scope.tenant_id, role_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(role))
}
