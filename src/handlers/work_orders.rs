// src/handlers/work_orders.rs

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
        auth::{Staff, TenantScope},
        i18n::Locale,
    },
    models::{
        rbac::Role,
        work_orders::{
            ApproveWorkOrderPayload, CreateWorkOrderPayload, RejectWorkOrderPayload,
            SubmitWorkOrderPayload, UpdateWorkOrderStatusPayload, WorkOrder,
        },
    },
};

#[utoipa::path(
    post,
    path = "/api/instances/{tenant_id}/work-orders",
    tag = "Work Orders",
    params(("tenant_id" = Uuid, Path, description = "ID da instância")),
    request_body = CreateWorkOrderPayload,
    responses(
        (status = 201, description = "Ordem de serviço criada", body = WorkOrder),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope<Staff>,
    Json(payload): Json<CreateWorkOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .work_order_service
        .create_work_order(scope.tenant_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    get,
    path = "/api/instances/{tenant_id}/work-orders",
    tag = "Work Orders",
    params(("tenant_id" = Uuid, Path, description = "ID da instância")),
    responses(
        (status = 200, description = "Ordens da instância, mais recentes primeiro", body = Vec<WorkOrder>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_work_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
) -> Result<impl IntoResponse, ApiError> {
    let orders = app_state
        .work_order_service
        .list_work_orders(scope.tenant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(orders))
}

#[utoipa::path(
    get,
    path = "/api/instances/{tenant_id}/work-orders/{work_order_id}",
    tag = "Work Orders",
    params(
        ("tenant_id" = Uuid, Path, description = "ID da instância"),
        ("work_order_id" = Uuid, Path, description = "ID da ordem")
    ),
    responses(
        (status = 200, description = "Ordem de serviço", body = WorkOrder),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
    Path((_tenant_id, work_order_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .work_order_service
        .get_work_order(scope.tenant_id, work_order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

#[utoipa::path(
    put,
    path = "/api/instances/{tenant_id}/work-orders/{work_order_id}/status",
    tag = "Work Orders",
    params(
        ("tenant_id" = Uuid, Path, description = "ID da instância"),
        ("work_order_id" = Uuid, Path, description = "ID da ordem")
    ),
    request_body = UpdateWorkOrderStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = WorkOrder),
        (status = 400, description = "Status reservado ao fluxo de aprovação"),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope<Staff>,
    Path((_tenant_id, work_order_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateWorkOrderStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .work_order_service
        .update_status(scope.tenant_id, work_order_id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

// Qualquer membro da instância pode enviar o próprio trabalho
#[utoipa::path(
    post,
    path = "/api/instances/{tenant_id}/work-orders/{work_order_id}/submit",
    tag = "Approvals",
    params(
        ("tenant_id" = Uuid, Path, description = "ID da instância"),
        ("work_order_id" = Uuid, Path, description = "ID da ordem")
    ),
    request_body = SubmitWorkOrderPayload,
    responses(
        (status = 200, description = "Enviada para aprovação", body = WorkOrder),
        (status = 400, description = "Sem responsável informado"),
        (status = 403, description = "Envio em nome de quem não é o responsável"),
        (status = 409, description = "Status atual não permite envio")
    ),
    security(("api_jwt" = []))
)]
pub async fn submit_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
    Path((_tenant_id, work_order_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SubmitWorkOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .approval_service
        .submit(scope.tenant_id, work_order_id, &scope.user, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

#[utoipa::path(
    get,
    path = "/api/instances/{tenant_id}/work-orders/{work_order_id}/approvers",
    tag = "Approvals",
    params(
        ("tenant_id" = Uuid, Path, description = "ID da instância"),
        ("work_order_id" = Uuid, Path, description = "ID da ordem")
    ),
    responses(
        (status = 200, description = "Cargos que podem revisar, do nível mais baixo ao mais alto", body = Vec<Role>),
        (status = 409, description = "Ordem ainda não enviada")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_approvers(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
    Path((_tenant_id, work_order_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let roles = app_state
        .approval_service
        .eligible_approvers(scope.tenant_id, work_order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(roles))
}

#[utoipa::path(
    post,
    path = "/api/instances/{tenant_id}/work-orders/{work_order_id}/approve",
    tag = "Approvals",
    params(
        ("tenant_id" = Uuid, Path, description = "ID da instância"),
        ("work_order_id" = Uuid, Path, description = "ID da ordem")
    ),
    request_body = ApproveWorkOrderPayload,
    responses(
        (status = 200, description = "Aprovada", body = WorkOrder),
        (status = 403, description = "Fora da cadeia de aprovação"),
        (status = 409, description = "Já decidida ou não enviada")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
    Path((_tenant_id, work_order_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ApproveWorkOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .approval_service
        .approve(scope.tenant_id, work_order_id, scope.user.user_id, payload.notes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

#[utoipa::path(
    post,
    path = "/api/instances/{tenant_id}/work-orders/{work_order_id}/reject",
    tag = "Approvals",
    params(
        ("tenant_id" = Uuid, Path, description = "ID da instância"),
        ("work_order_id" = Uuid, Path, description = "ID da ordem")
    ),
    request_body = RejectWorkOrderPayload,
    responses(
        (status = 200, description = "Rejeitada", body = WorkOrder),
        (status = 400, description = "Motivo obrigatório"),
        (status = 403, description = "Fora da cadeia de aprovação"),
        (status = 409, description = "Já decidida ou não enviada")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
    Path((_tenant_id, work_order_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<RejectWorkOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .approval_service
        .reject(scope.tenant_id, work_order_id, scope.user.user_id, &payload.reason)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}
