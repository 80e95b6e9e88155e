// src/handlers/people.rs

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
    models::people::{AssignRolePayload, CreatePersonPayload, Person},
};

#[utoipa::path(
    post,
    path = "/api/instances/{tenant_id}/people",
    tag = "People",
    params(("tenant_id" = Uuid, Path, description = "ID da instância")),
    request_body = CreatePersonPayload,
    responses(
        (status = 201, description = "Pessoa cadastrada", body = Person),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_person(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope<Staff>,
    Json(payload): Json<CreatePersonPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let person = app_state
        .people_service
        .create_person(scope.tenant_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(person)))
}

#[utoipa::path(
    get,
    path = "/api/instances/{tenant_id}/people",
    tag = "People",
    params(("tenant_id" = Uuid, Path, description = "ID da instância")),
    responses(
        (status = 200, description = "Pessoas da instância", body = Vec<Person>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_people(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
) -> Result<impl IntoResponse, ApiError> {
    let people = app_state
        .people_service
        .list_people(scope.tenant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(people))
}

#[utoipa::path(
    put,
    path = "/api/instances/{tenant_id}/people/{person_id}/role",
    tag = "People",
    params(
        ("tenant_id" = Uuid, Path, description = "ID da instância"),
        ("person_id" = Uuid, Path, description = "ID da pessoa")
    ),
    request_body = AssignRolePayload,
    responses(
        (status = 200, description = "Cargo atribuído", body = Person),
        (status = 404, description = "Pessoa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_role(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope<Staff>,
    Path((_tenant_id, person_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AssignRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let person = app_state
        .people_service
        .assign_role(scope.tenant_id, person_id, payload.role_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(person))
}
