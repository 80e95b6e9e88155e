// src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use workflow_backend::{
    config::{AppState, Config},
    routes, shutdown,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env().context("Configuração inválida")?;
    let app_state = AppState::new(&config)
        .await
        .context("Falha ao inicializar o estado da aplicação.")?;

    if let Some(bootstrap) = &config.bootstrap_admin {
        app_state
            .auth_service
            .ensure_superadmin(bootstrap)
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao criar o SUPERADMIN inicial: {e}"))?;
    }

    let app = routes::router(app_state.clone());

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", config.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::signal())
        .await
        .context("Erro no servidor Axum")?;

    app_state.close().await;
    tracing::info!("👋 Servidor encerrado.");
    Ok(())
}
