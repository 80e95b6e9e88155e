// src/handlers/tenancy.rs

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
        auth::{Admins, RequireRole, SuperAdmins, TenantScope},
        i18n::Locale,
    },
    models::{
        auth::{SetUserActivePayload, User},
        tenancy::{CreateInstancePayload, Instance, UpdateApprovalPolicyPayload},
    },
};

#[utoipa::path(
    post,
    path = "/api/instances",
    tag = "Instances",
    request_body = CreateInstancePayload,
    responses(
        (status = 201, description = "Instância criada", body = Instance),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas SUPERADMIN")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_instance(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<SuperAdmins>,
    Json(payload): Json<CreateInstancePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let instance = app_state
        .tenant_service
        .create_instance(&payload.name, payload.approval_policy)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(instance)))
}

#[utoipa::path(
    get,
    path = "/api/instances",
    tag = "Instances",
    responses(
        (status = 200, description = "Todas as instâncias", body = Vec<Instance>),
        (status = 403, description = "Apenas SUPERADMIN")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_instances(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<SuperAdmins>,
) -> Result<impl IntoResponse, ApiError> {
    let instances = app_state
        .tenant_service
        .list_instances()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(instances))
}

#[utoipa::path(
    get,
    path = "/api/instances/{tenant_id}",
    tag = "Instances",
    params(("tenant_id" = Uuid, Path, description = "ID da instância")),
    responses(
        (status = 200, description = "Instância", body = Instance),
        (status = 403, description = "Outra instância"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_instance(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
) -> Result<impl IntoResponse, ApiError> {
    let instance = app_state
        .tenant_service
        .get_instance(scope.tenant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(instance))
}

#[utoipa::path(
    put,
    path = "/api/instances/{tenant_id}/approval-policy",
    tag = "Instances",
    params(("tenant_id" = Uuid, Path, description = "ID da instância")),
    request_body = UpdateApprovalPolicyPayload,
    responses(
        (status = 200, description = "Política atualizada", body = Instance),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_approval_policy(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope<Admins>,
    Json(payload): Json<UpdateApprovalPolicyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let instance = app_state
        .tenant_service
        .update_approval_policy(scope.tenant_id, payload.approval_policy)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(instance))
}

// Ativa/desativa um login da instância (desativar revoga a sessão)
#[utoipa::path(
    put,
    path = "/api/instances/{tenant_id}/users/{user_id}/active",
    tag = "Instances",
    params(
        ("tenant_id" = Uuid, Path, description = "ID da instância"),
        ("user_id" = Uuid, Path, description = "ID do usuário")
    ),
    request_body = SetUserActivePayload,
    responses(
        (status = 200, description = "Usuário atualizado", body = User),
        (status = 403, description = "Sem permissão"),
        (status = 404, description = "Usuário não encontrado nesta instância")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_user_active(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope<Admins>,
    Path((_tenant_id, user_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SetUserActivePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .auth_service
        .set_user_active(scope.tenant_id, user_id, payload.is_active)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(user))
}
