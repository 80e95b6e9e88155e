// src/middleware/auth.rs

use std::{collections::HashMap, marker::PhantomData};

use axum::{
    extract::{FromRef, FromRequestParts, Path},
    http::{request::Parts, HeaderMap},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::{TokenPayload, UserRole},
    services::token::TokenService,
};

// ---
// Funções puras (usadas pelos extratores e pelos serviços)
// ---

/// Sem cabeçalho, ou com outro esquema que não `Bearer`, é anônimo (`None`), não erro.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Option<TokenPayload> {
    let Authorization(bearer) = headers.typed_get::<Authorization<Bearer>>()?;
    tokens.verify_access_token(bearer.token())
}

pub fn require_auth(headers: &HeaderMap, tokens: &TokenService) -> Result<TokenPayload, AppError> {
    authenticate(headers, tokens).ok_or(AppError::Unauthenticated)
}

/// 401 se anônimo, 403 se o papel não estiver na lista. Sem hierarquia: é só pertencimento.
pub fn require_role(
    headers: &HeaderMap,
    tokens: &TokenService,
    allowed: &[UserRole],
) -> Result<TokenPayload, AppError> {
    let payload = require_auth(headers, tokens)?;
    if allowed.contains(&payload.role) {
        Ok(payload)
    } else {
        Err(AppError::Forbidden)
    }
}

/// SUPERADMIN enxerga todas as instâncias; os demais, só a própria.
pub fn require_tenant(payload: &TokenPayload, tenant_id: Uuid) -> bool {
    payload.role.is_super_admin() || payload.tenant_id == tenant_id
}

// ---
// Conjuntos de papéis (listas fixas em tempo de compilação)
// ---

pub trait RoleSet: Send + Sync + 'static {
    fn allowed() -> &'static [UserRole];
}

pub struct SuperAdmins;
impl RoleSet for SuperAdmins {
    fn allowed() -> &'static [UserRole] { &[UserRole::SuperAdmin] }
}

pub struct Admins;
impl RoleSet for Admins {
    fn allowed() -> &'static [UserRole] { &[UserRole::SuperAdmin, UserRole::Admin] }
}

// Quem pode mexer em cargos e cadeias de aprovação
pub struct RoleManagers;
impl RoleSet for RoleManagers {
    fn allowed() -> &'static [UserRole] {
        &[UserRole::SuperAdmin, UserRole::Admin, UserRole::Director]
    }
}

// Cadastro de pessoas e ordens de serviço
pub struct Staff;
impl RoleSet for Staff {
    fn allowed() -> &'static [UserRole] {
        &[
            UserRole::SuperAdmin,
            UserRole::Admin,
            UserRole::Director,
            UserRole::Manager,
            UserRole::Supervisor,
        ]
    }
}

// Qualquer papel, inclusive GUEST
pub struct Authenticated;
impl RoleSet for Authenticated {
    fn allowed() -> &'static [UserRole] { &UserRole::ALL }
}

// ---
// Extratores
// ---

// Traduz a rejeição com o idioma do próprio pedido.
fn reject(parts: &Parts, app_state: &AppState, error: AppError) -> ApiError {
    error.to_api_error(&Locale::from_headers(&parts.headers), &app_state.i18n_store)
}

/// Usuário autenticado pelo access token.
pub struct AuthenticatedUser(pub TokenPayload);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        require_auth(&parts.headers, &app_state.token_service)
            .map(AuthenticatedUser)
            .map_err(|e| reject(parts, &app_state, e))
    }
}

/// Guardião por papel: `RequireRole<Admins>`.
pub struct RequireRole<R: RoleSet>(pub TokenPayload, pub PhantomData<R>);

impl<R, S> FromRequestParts<S> for RequireRole<R>
where
    R: RoleSet,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        require_role(&parts.headers, &app_state.token_service, R::allowed())
            .map(|payload| RequireRole(payload, PhantomData))
            .map_err(|e| reject(parts, &app_state, e))
    }
}

/// Papel + escopo de instância. Lê o segmento `{tenant_id}` da rota.
pub struct TenantScope<R: RoleSet = Authenticated> {
    pub user: TokenPayload,
    pub tenant_id: Uuid,
    _roles: PhantomData<R>,
}

impl<R, S> FromRequestParts<S> for TenantScope<R>
where
    R: RoleSet,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        // 1. Identidade e papel
        let user = require_role(&parts.headers, &app_state.token_service, R::allowed())
            .map_err(|e| reject(parts, &app_state, e))?;

        // 2. A instância pedida na rota
        let tenant_id = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|Path(params)| params.get("tenant_id").and_then(|id| Uuid::parse_str(id).ok()))
            .ok_or_else(|| reject(parts, &app_state, AppError::InvalidInput("errors.invalid_path")))?;

        // 3. Escopo
        if !require_tenant(&user, tenant_id) {
            tracing::warn!(
                user_id = %user.user_id,
                tenant_id = %tenant_id,
                "Acesso negado a outra instância"
            );
            return Err(reject(parts, &app_state, AppError::Forbidden));
        }

        Ok(TenantScope { user, tenant_id, _roles: PhantomData })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};
    use chrono::Duration;

    use crate::services::token::TokenSettings;

    fn tokens(access_ttl: Duration) -> TokenService {
        TokenService::new(TokenSettings {
            access_secret: "acesso".into(),
            refresh_secret: "refresh".into(),
            access_ttl,
            refresh_ttl: Duration::days(7),
            bcrypt_cost: 4,
        })
    }

    fn payload(role: UserRole) -> TokenPayload {
        TokenPayload {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            role,
            email: "x@acme.com".into(),
        }
    }

    fn with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn bearer(service: &TokenService, p: &TokenPayload) -> HeaderMap {
        with_auth(&format!("Bearer {}", service.generate_access_token(p).unwrap()))
    }

    #[test]
    fn valid_bearer_token_authenticates() {
        let service = tokens(Duration::minutes(15));
        let p = payload(UserRole::Manager);

        assert_eq!(require_auth(&bearer(&service, &p), &service).unwrap(), p);
    }

    #[test]
    fn anonymous_requests_collapse_to_unauthenticated() {
        let service = tokens(Duration::minutes(15));
        let token = service.generate_access_token(&payload(UserRole::Admin)).unwrap();
        let expired = tokens(Duration::seconds(-30))
            .generate_access_token(&payload(UserRole::Admin))
            .unwrap();

        let cases = [
            HeaderMap::new(),
            with_auth(&format!("Basic {token}")),
            with_auth(&format!("Bearer {expired}")),
            with_auth(&format!("Bearer {token}x")),
        ];

        for headers in &cases {
            assert!(authenticate(headers, &service).is_none());
            assert!(matches!(require_auth(headers, &service), Err(AppError::Unauthenticated)));
        }
    }

    #[test]
    fn role_allow_list_is_flat_membership() {
        let service = tokens(Duration::minutes(15));
        let admin = bearer(&service, &payload(UserRole::Admin));
        let supervisor = bearer(&service, &payload(UserRole::Supervisor));

        assert!(require_role(&admin, &service, &[UserRole::Admin]).is_ok());
        assert!(matches!(
            require_role(&supervisor, &service, &[UserRole::Admin]),
            Err(AppError::Forbidden)
        ));
        // SUPERADMIN não herda nada: fora da lista, é 403 também
        let root = bearer(&service, &payload(UserRole::SuperAdmin));
        assert!(matches!(require_role(&root, &service, &[UserRole::Admin]), Err(AppError::Forbidden)));

        assert!(matches!(
            require_role(&HeaderMap::new(), &service, &[UserRole::Admin]),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn tenant_scope_is_exact_except_for_superadmin() {
        let p = payload(UserRole::Admin);
        assert!(require_tenant(&p, p.tenant_id));
        assert!(!require_tenant(&p, Uuid::new_v4()));

        let root = payload(UserRole::SuperAdmin);
        assert!(require_tenant(&root, Uuid::new_v4()));
    }
}
