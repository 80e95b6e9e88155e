// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::Repositories,
    services::{
        approval_service::ApprovalService,
        auth::{AuthService, BootstrapAdmin},
        people_service::PeopleService,
        rbac_service::RbacService,
        tenancy_service::TenantService,
        token::{TokenService, TokenSettings, MAX_PASSWORD_BYTES},
        work_order_service::WorkOrderService,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("STORAGE_BACKEND inválido: {other}")),
        }
    }
}

// Tudo que vem do ambiente (.env), lido uma única vez no startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
    pub bcrypt_cost: u32,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let storage: StorageBackend = optional("STORAGE_BACKEND")
            .map(|v| v.parse::<StorageBackend>())
            .transpose()?
            .unwrap_or(StorageBackend::Postgres);

        let database_url = optional("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL deve ser definida"));
        }

        let jwt_secret = optional("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let jwt_refresh_secret = optional("JWT_REFRESH_SECRET").unwrap_or_else(|| jwt_secret.clone());

        // O bootstrap só acontece se o e-mail e a senha vierem juntos.
        let bootstrap_admin = match (optional("BOOTSTRAP_ADMIN_EMAIL"), optional("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                tenant_name: optional("BOOTSTRAP_INSTANCE_NAME").unwrap_or_else(|| "Plataforma".into()),
                email,
                password,
                name: optional("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|| "Super Admin".into()),
            }),
            _ => None,
        };
        if bootstrap_admin.as_ref().is_some_and(|b| b.password.len() > MAX_PASSWORD_BYTES) {
            return Err(anyhow!("BOOTSTRAP_ADMIN_PASSWORD deve ter no máximo {MAX_PASSWORD_BYTES} bytes"));
        }

        Ok(Self {
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            storage,
            database_url,
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            jwt_refresh_secret,
            access_ttl_minutes: parsed("JWT_ACCESS_TTL_MINUTES", 15)?,
            refresh_ttl_days: parsed("JWT_REFRESH_TTL_DAYS", 7)?,
            bcrypt_cost: parsed("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            bootstrap_admin,
        })
    }

    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            access_secret: self.jwt_secret.clone(),
            refresh_secret: self.jwt_refresh_secret.clone(),
            access_ttl: chrono::Duration::minutes(self.access_ttl_minutes),
            refresh_ttl: chrono::Duration::days(self.refresh_ttl_days),
            bcrypt_cost: self.bcrypt_cost,
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} inválido ({raw}): {e}")),
        None => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: Option<PgPool>,
    pub i18n_store: Arc<I18nStore>,
    pub token_service: TokenService,
    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub rbac_service: RbacService,
    pub people_service: PeopleService,
    pub work_order_service: WorkOrderService,
    pub approval_service: ApprovalService,
}

impl AppState {
    /// Abre a persistência escolhida e monta o grafo de dependências.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        match config.storage {
            StorageBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL deve ser definida")?;

                let db_pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!().run(&db_pool).await?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Self::from_repositories(config, Repositories::postgres(db_pool.clone()), Some(db_pool))
            }
            StorageBackend::Memory => {
                tracing::warn!("⚠️ Usando armazenamento em memória: os dados somem ao reiniciar.");
                Self::from_repositories(config, Repositories::in_memory(), None)
            }
        }
    }

    pub fn from_repositories(
        config: &Config,
        repos: Repositories,
        db_pool: Option<PgPool>,
    ) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load().context("Catálogo de mensagens inválido")?);
        let token_service = TokenService::new(config.token_settings());

        // --- Monta o gráfico de dependências ---
        let auth_service = AuthService::new(repos.users.clone(), repos.tenants.clone(), token_service.clone());
        let tenant_service = TenantService::new(repos.tenants.clone());
        let rbac_service = RbacService::new(repos.roles.clone());
        let people_service = PeopleService::new(repos.people.clone(), repos.roles.clone(), repos.users.clone());
        let work_order_service = WorkOrderService::new(repos.work_orders.clone(), repos.people.clone());
        let approval_service = ApprovalService::new(
            repos.work_orders.clone(),
            repos.people.clone(),
            repos.roles.clone(),
            repos.tenants.clone(),
        );

        Ok(Self {
            db_pool,
            i18n_store,
            token_service,
            auth_service,
            tenant_service,
            rbac_service,
            people_service,
            work_order_service,
            approval_service,
        })
    }

    /// Fecha o pool (se houver). Chamado depois do shutdown gracioso.
    pub async fn close(&self) {
        if let Some(pool) = &self.db_pool {
            pool.close().await;
            tracing::info!("Conexões com o banco encerradas.");
        }
    }
}
