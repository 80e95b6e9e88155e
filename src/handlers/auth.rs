// src/handlers/auth.rs

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::{authenticate, AuthenticatedUser},
        i18n::Locale,
    },
    models::auth::{
        AuthResponse, LogoutPayload, RefreshPayload, SigninPayload, SignupPayload, TokenPair,
        TokenPayload,
    },
};

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = SignupPayload,
    responses(
        (status = 201, description = "Usuário criado e autenticado", body = AuthResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Papel acima de TEAMMEMBER/GUEST sem um ADMIN da instância autenticado"),
        (status = 404, description = "Instância não encontrada"),
        (status = 409, description = "E-mail já cadastrado")
    )
)]
pub async fn signup(
    State(app_state): State<AppState>,
    locale: Locale,
    headers: HeaderMap,
    Json(payload): Json<SignupPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let tenant_id = payload
        .tenant_id
        .ok_or(AppError::InvalidInput("errors.validation"))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Token é opcional aqui: só conta para liberar papéis elevados.
    let caller = authenticate(&headers, &app_state.token_service);

    let response = app_state
        .auth_service
        .signup(
            caller.as_ref(),
            &payload.email,
            &payload.password,
            &payload.name,
            tenant_id,
            payload.role,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/signin",
    tag = "Auth",
    request_body = SigninPayload,
    responses(
        (status = 200, description = "Autenticado", body = AuthResponse),
        (status = 401, description = "E-mail ou senha inválidos"),
        (status = 403, description = "Conta desativada")
    )
)]
pub async fn signin(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<SigninPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .auth_service
        .signin(&payload.email, &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Auth",
    request_body = RefreshPayload,
    responses(
        (status = 200, description = "Novo par de tokens", body = TokenPair),
        (status = 401, description = "Refresh token inválido, expirado ou revogado"),
        (status = 403, description = "Conta desativada")
    )
)]
pub async fn refresh(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<RefreshPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let pair = app_state
        .auth_service
        .refresh(&payload.refresh_token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(pair))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    request_body = LogoutPayload,
    responses(
        (status = 200, description = "Sessão encerrada (idempotente)"),
        (status = 401, description = "Não autenticado"),
        (status = 403, description = "Sem permissão para encerrar a sessão de outro usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn logout(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<LogoutPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = payload.user_id.unwrap_or(caller.user_id);

    app_state
        .auth_service
        .logout(&caller, user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(json!({ "success": true })))
}

// Quem sou eu (direto do token, sem ir ao banco)
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Claims do token atual", body = TokenPayload),
        (status = 401, description = "Não autenticado")
    ),
    security(("api_jwt" = []))
)]
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<TokenPayload> {
    Json(user)
}
