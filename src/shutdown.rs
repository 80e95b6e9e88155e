// src/shutdown.rs

use std::io;

use thiserror::Error;
use tokio::signal;

#[derive(Debug, Error)]
pub enum ShutdownSignalError {
    #[error("falha ao instalar o handler de Ctrl+C: {0}")]
    CtrlC(#[source] io::Error),

    #[cfg(unix)]
    #[error("falha ao instalar o handler de SIGTERM: {0}")]
    SigTerm(#[source] io::Error),
}

async fn wait_for_signal() -> Result<(), ShutdownSignalError> {
    let ctrl_c = async { signal::ctrl_c().await.map_err(ShutdownSignalError::CtrlC) };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .map_err(ShutdownSignalError::SigTerm)?
            .recv()
            .await;
        Ok::<(), ShutdownSignalError>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<(), ShutdownSignalError>>();

    tokio::select! {
        result = ctrl_c => {
            result?;
            tracing::info!("🛑 Ctrl+C recebido");
        }
        result = terminate => {
            result?;
            tracing::info!("🛑 SIGTERM recebido");
        }
    }

    Ok(())
}

/// Futuro passado ao `with_graceful_shutdown`: resolve quando o processo deve parar.
/// Se o handler não puder ser instalado, o servidor para em vez de ficar sem saída limpa.
pub async fn signal() {
    if let Err(e) = wait_for_signal().await {
        tracing::error!("{e}");
    }
    tracing::info!("Encerrando: aguardando as requisições em andamento...");
}
