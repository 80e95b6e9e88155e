// src/services/token.rs

use bcrypt::{non_truncating_hash, non_truncating_verify, BcryptError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::error::AppError, models::auth::TokenPayload};

/// O bcrypt lê no máximo 72 bytes, contando o terminador nulo.
pub const MAX_PASSWORD_BYTES: usize = 71;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TokenKind {
    Access,
    Refresh,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    payload: TokenPayload,
    kind: TokenKind,
    jti: Uuid, // torna cada token único, mesmo emitidos no mesmo segundo
    iat: i64,
    exp: i64,
}

pub struct TokenSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub bcrypt_cost: u32,
}

#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
    bcrypt_cost: u32,
}

impl TokenService {
    pub fn new(settings: TokenSettings) -> Self {
        // Sem tolerância: expirou, acabou.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            access_encoding: EncodingKey::from_secret(settings.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(settings.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(settings.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(settings.refresh_secret.as_bytes()),
            validation,
            access_ttl: settings.access_ttl,
            refresh_ttl: settings.refresh_ttl,
            bcrypt_cost: settings.bcrypt_cost,
        }
    }

    // --- SENHAS ---

    pub async fn hash_password(&self, plaintext: &str) -> Result<String, AppError> {
        let password = plaintext.to_owned();
        let cost = self.bcrypt_cost;

        // bcrypt é lento de propósito; roda fora das threads do runtime.
        let hashed = tokio::task::spawn_blocking(move || non_truncating_hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))?;

        match hashed {
            Ok(hashed) => Ok(hashed),
            Err(BcryptError::Truncation(_)) => Err(AppError::InvalidInput("errors.password_too_long")),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn compare_password(&self, plaintext: &str, password_hash: &str) -> Result<bool, AppError> {
        let password = plaintext.to_owned();
        let stored = password_hash.to_owned();

        let is_valid = tokio::task::spawn_blocking(move || non_truncating_verify(&password, &stored))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?;

        // Senha maior que o limite nunca foi gravada, então não confere.
        match is_valid {
            Ok(is_valid) => Ok(is_valid),
            Err(BcryptError::Truncation(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    // --- TOKENS ---

    pub fn generate_access_token(&self, payload: &TokenPayload) -> Result<String, AppError> {
        self.sign(payload, TokenKind::Access, self.access_ttl, &self.access_encoding)
    }

    pub fn generate_refresh_token(&self, payload: &TokenPayload) -> Result<String, AppError> {
        self.sign(payload, TokenKind::Refresh, self.refresh_ttl, &self.refresh_encoding)
    }

    /// Expiração absoluta gravada junto do refresh token, para o servidor
    /// poder invalidar sem confiar só no `exp` embutido.
    pub fn refresh_token_expiry(&self) -> DateTime<Utc> {
        Utc::now() + self.refresh_ttl
    }

    pub fn verify_access_token(&self, token: &str) -> Option<TokenPayload> {
        self.verify(token, TokenKind::Access, &self.access_decoding)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Option<TokenPayload> {
        self.verify(token, TokenKind::Refresh, &self.refresh_decoding)
    }

    fn sign(
        &self,
        payload: &TokenPayload,
        kind: TokenKind,
        ttl: Duration,
        key: &EncodingKey,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            payload: payload.clone(),
            kind,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, key)?)
    }

    // Nunca falha para o chamador: malformado, expirado ou com assinatura errada
    // viram `None`. O motivo só aparece no log.
    fn verify(&self, token: &str, expected: TokenKind, key: &DecodingKey) -> Option<TokenPayload> {
        match decode::<Claims>(token, key, &self.validation) {
            Ok(data) if data.claims.kind == expected => Some(data.claims.payload),
            Ok(data) => {
                tracing::debug!(kind = ?data.claims.kind, expected = ?expected, "token do tipo errado");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "token rejeitado");
                None
            }
        }
    }
}
