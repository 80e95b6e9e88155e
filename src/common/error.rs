use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale, models::work_orders::WorkOrderStatus};

// Nosso tipo de erro de domínio. Os serviços só conhecem ele;
// a tradução para HTTP acontece uma única vez, no handler.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Entrada inválida que não vem do `validator` (regra de negócio).
    // O &'static str é a chave de tradução.
    #[error("Entrada inválida: {0}")]
    InvalidInput(&'static str),

    #[error("Não autenticado")]
    Unauthenticated,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Conta desativada")]
    AccountDisabled,

    #[error("Registro não encontrado: {0}")]
    NotFound(&'static str),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Aprovação já decidida")]
    ApprovalAlreadyDecided,

    #[error("Transição inválida a partir de {from:?}")]
    InvalidTransition { from: WorkOrderStatus },

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O erro que efetivamente sai pela API (já traduzido).
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated | AppError::InvalidCredentials | AppError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden | AppError::AccountDisabled => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists
            | AppError::UniqueConstraintViolation(_)
            | AppError::ApprovalAlreadyDecided
            | AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Chave do catálogo de mensagens (`locales/*.json`).
    pub fn message_key(&self) -> String {
        match self {
            AppError::ValidationError(_) => "errors.validation".into(),
            AppError::InvalidInput(key) => (*key).into(),
            AppError::Unauthenticated => "errors.unauthenticated".into(),
            AppError::InvalidCredentials => "errors.invalid_credentials".into(),
            AppError::InvalidToken => "errors.invalid_token".into(),
            AppError::Forbidden => "errors.forbidden".into(),
            AppError::AccountDisabled => "errors.account_disabled".into(),
            AppError::NotFound(entity) => format!("errors.not_found.{entity}"),
            AppError::EmailAlreadyExists => "errors.email_exists".into(),
            AppError::UniqueConstraintViolation(_) => "errors.unique_violation".into(),
            AppError::ApprovalAlreadyDecided => "errors.approval_already_decided".into(),
            AppError::InvalidTransition { .. } => "errors.invalid_transition".into(),
            _ => "errors.internal".into(),
        }
    }

    /// Converte para o erro de API, traduzindo a mensagem para o idioma do cliente.
    /// Erros 500 são logados aqui com o detalhe interno; o cliente só vê a mensagem genérica.
    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status_code();
        let error = i18n.translate(&locale.0, &self.message_key());

        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let details = match &self {
            AppError::ValidationError(errors) => Some(validation_details(errors)),
            AppError::InvalidTransition { from } => Some(json!({ "currentStatus": from })),
            _ => None,
        };

        ApiError { status, error, details }
    }
}

fn validation_details(errors: &validator::ValidationErrors) -> Value {
    let mut details = serde_json::Map::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect();
        details.insert(field.to_string(), json!(messages));
    }
    Value::Object(details)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Mapeia a violação de unicidade do Postgres para um erro amigável.
pub(crate) fn map_unique_violation(e: sqlx::Error, on_unique: impl FnOnce(&str) -> AppError) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return on_unique(db_err.constraint().unwrap_or_default());
        }
    }
    e.into()
}
