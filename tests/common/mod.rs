// Utilitários compartilhados pelos testes de integração.
// O app roda sobre o armazenamento em memória, sem abrir socket.
#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use workflow_backend::{
    config::{AppState, Config, StorageBackend},
    db::{Repositories, TenantRepository},
    models::{auth::TokenPayload, tenancy::ApprovalPolicy},
    routes,
    services::auth::BootstrapAdmin,
};

pub const PASSWORD: &str = "senha-forte-123";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub repos: Repositories,
}

pub fn test_config() -> Config {
    Config {
        bind_addr: "127.0.0.1:0".into(),
        storage: StorageBackend::Memory,
        database_url: None,
        db_max_connections: 1,
        jwt_secret: "segredo-de-acesso-para-testes".into(),
        jwt_refresh_secret: "segredo-de-refresh-para-testes".into(),
        access_ttl_minutes: 15,
        refresh_ttl_days: 7,
        // Custo mínimo do bcrypt para os testes não ficarem lentos
        bcrypt_cost: 4,
        bootstrap_admin: None,
    }
}

/// O mesmo SUPERADMIN que o `BOOTSTRAP_*` criaria.
pub fn bootstrap_admin() -> BootstrapAdmin {
    BootstrapAdmin {
        tenant_name: "Plataforma".into(),
        email: "root@plataforma.com".into(),
        password: PASSWORD.into(),
        name: "Root".into(),
    }
}

pub fn spawn_app() -> TestApp {
    let config = test_config();
    let repos = Repositories::in_memory();
    let state = AppState::from_repositories(&config, repos.clone(), None).expect("estado do app");
    let router = routes::router(state.clone());

    TestApp { router, state, repos }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("resposta do router");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("corpo da resposta");

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("requisição válida");

        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    /// Cria a instância direto no repositório (criar pela API exige um SUPERADMIN).
    pub async fn create_instance(&self, name: &str) -> Uuid {
        self.repos
            .tenants
            .create_instance(name, ApprovalPolicy::Direct)
            .await
            .expect("instância criada")
            .id
    }

    /// Access token do SUPERADMIN de bootstrap (criado na primeira chamada).
    pub async fn root_token(&self) -> String {
        let root = self
            .state
            .auth_service
            .ensure_superadmin(&bootstrap_admin())
            .await
            .expect("superadmin de bootstrap");
        self.state
            .token_service
            .generate_access_token(&TokenPayload::from(&root))
            .expect("token do superadmin")
    }

    /// Cadastra um usuário e devolve a resposta completa (`user`, `accessToken`, `refreshToken`).
    /// Papéis acima de TEAMMEMBER/GUEST são cadastrados pelo SUPERADMIN.
    pub async fn signup(&self, tenant_id: Uuid, email: &str, role: &str) -> Value {
        let caller = match role {
            "TEAMMEMBER" | "GUEST" => None,
            _ => Some(self.root_token().await),
        };
        let (status, body) = self
            .post(
                "/api/auth/signup",
                caller.as_deref(),
                json!({
                    "email": email,
                    "password": PASSWORD,
                    "name": email,
                    "tenantId": tenant_id,
                    "role": role
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup falhou: {body}");
        body
    }
}

pub fn token(auth: &Value) -> &str {
    auth["accessToken"].as_str().expect("accessToken")
}

pub fn id(value: &Value) -> String {
    value["id"].as_str().expect("id").to_string()
}
